//! Table bookings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bep_core::{BookingId, BookingStatus, Email, PhoneNumber};

/// Largest party the dining room takes through the form.
pub const MAX_PARTY_SIZE: i32 = 20;

/// A reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub customer_name: String,
    pub phone: PhoneNumber,
    pub email: Option<Email>,
    pub party_size: i32,
    pub reserved_for: DateTime<Utc>,
    pub note: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// Body of the public booking form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub customer_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub party_size: i32,
    pub reserved_for: DateTime<Utc>,
    #[serde(default)]
    pub note: Option<String>,
}

/// A booking request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidBooking {
    pub customer_name: String,
    pub phone: PhoneNumber,
    pub email: Option<Email>,
    pub party_size: i32,
    pub reserved_for: DateTime<Utc>,
    pub note: Option<String>,
}

impl NewBooking {
    /// Validate against the current time.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidBooking, String> {
        let customer_name = self.customer_name.trim().to_string();
        if customer_name.is_empty() {
            return Err("Name is required".to_string());
        }
        let phone = PhoneNumber::parse(&self.phone).map_err(|e| e.to_string())?;
        let email = self
            .email
            .filter(|e| !e.trim().is_empty())
            .map(|e| Email::parse(&e))
            .transpose()
            .map_err(|e| e.to_string())?;
        if !(1..=MAX_PARTY_SIZE).contains(&self.party_size) {
            return Err(format!("Party size must be between 1 and {MAX_PARTY_SIZE}"));
        }
        if self.reserved_for <= now {
            return Err("Reservation time must be in the future".to_string());
        }
        let note = self
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Ok(ValidBooking {
            customer_name,
            phone,
            email,
            party_size: self.party_size,
            reserved_for: self.reserved_for,
            note,
        })
    }
}

/// Body of the staff status change.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BookingStatusUpdate {
    pub status: BookingStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn request(now: DateTime<Utc>) -> NewBooking {
        NewBooking {
            customer_name: " Lê Văn Tám ".to_string(),
            phone: "090 123 4567".to_string(),
            email: Some(String::new()),
            party_size: 4,
            reserved_for: now + Duration::days(1),
            note: Some("  ".to_string()),
        }
    }

    #[test]
    fn test_valid_booking_is_normalized() {
        let now = Utc::now();
        let booking = request(now).validate(now).unwrap();
        assert_eq!(booking.customer_name, "Lê Văn Tám");
        assert!(booking.email.is_none());
        assert!(booking.note.is_none());
    }

    #[test]
    fn test_party_size_bounds() {
        let now = Utc::now();
        for size in [0, 21] {
            let err = NewBooking {
                party_size: size,
                ..request(now)
            }
            .validate(now)
            .unwrap_err();
            assert!(err.contains("Party size"));
        }
    }

    #[test]
    fn test_past_reservation_rejected() {
        let now = Utc::now();
        let err = NewBooking {
            reserved_for: now - Duration::minutes(5),
            ..request(now)
        }
        .validate(now)
        .unwrap_err();
        assert_eq!(err, "Reservation time must be in the future");
    }

    #[test]
    fn test_bad_phone_rejected() {
        let now = Utc::now();
        let booking = NewBooking {
            phone: "12".to_string(),
            ..request(now)
        };
        assert!(booking.validate(now).is_err());
    }
}
