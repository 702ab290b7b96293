//! Booking repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use bep_core::{BookingId, BookingStatus, Email, PhoneNumber};

use super::RepositoryError;
use crate::models::{Booking, ValidBooking};

const BOOKING_COLUMNS: &str = "id, customer_name, phone, email, party_size, reserved_for, note, \
                               status, created_at";

#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: i64,
    customer_name: String,
    phone: String,
    email: Option<String>,
    party_size: i32,
    reserved_for: DateTime<Utc>,
    note: Option<String>,
    status: BookingStatus,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = RepositoryError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let phone = PhoneNumber::parse(&row.phone)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid phone in database: {e}")))?;
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))?;

        Ok(Self {
            id: BookingId::new(row.id),
            customer_name: row.customer_name,
            phone,
            email,
            party_size: row.party_size,
            reserved_for: row.reserved_for,
            note: row.note,
            status: row.status,
            created_at: row.created_at,
        })
    }
}

pub struct BookingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BookingRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, booking), fields(party_size = booking.party_size))]
    pub async fn create(&self, booking: &ValidBooking) -> Result<Booking, RepositoryError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "INSERT INTO site.bookings \
                (customer_name, phone, email, party_size, reserved_for, note) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(&booking.customer_name)
        .bind(booking.phone.as_str())
        .bind(booking.email.as_ref().map(Email::as_str))
        .bind(booking.party_size)
        .bind(booking.reserved_for)
        .bind(&booking.note)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Bookings, soonest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, status: Option<BookingStatus>) -> Result<Vec<Booking>, RepositoryError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM site.bookings \
             WHERE $1::site.booking_status IS NULL OR status = $1 \
             ORDER BY reserved_for"
        ))
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no booking has this ID.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: BookingId,
        status: BookingStatus,
    ) -> Result<Booking, RepositoryError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "UPDATE site.bookings SET status = $2 WHERE id = $1 RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }
}
