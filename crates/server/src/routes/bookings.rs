//! Table booking endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;

use bep_core::{BookingId, BookingStatus, Permission};

use crate::db::BookingRepository;
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::middleware::{StaffUser, require_permission};
use crate::models::{Booking, BookingStatusUpdate, NewBooking};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
}

/// POST /api/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<NewBooking>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = request.validate(Utc::now()).map_err(AppError::BadRequest)?;
    let booking = BookingRepository::new(state.pool()).create(&booking).await?;
    tracing::info!(
        booking_id = %booking.id,
        party_size = booking.party_size,
        reserved_for = %booking.reserved_for,
        "Booking received"
    );
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /api/staff/bookings?status=pending
pub async fn list_bookings(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    Query(filter): Query<BookingFilter>,
) -> Result<Json<Vec<Booking>>, AppError> {
    require_permission(&user, Permission::BookingsManage)?;
    Ok(Json(
        BookingRepository::new(state.pool()).list(filter.status).await?,
    ))
}

/// PATCH /api/staff/bookings/{id}
pub async fn update_booking(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    Path(id): Path<BookingId>,
    ApiJson(update): ApiJson<BookingStatusUpdate>,
) -> Result<Json<Booking>, AppError> {
    require_permission(&user, Permission::BookingsManage)?;

    let booking = BookingRepository::new(state.pool())
        .update_status(id, update.status)
        .await?;
    tracing::info!(booking_id = %id, status = ?update.status, by = %user.username, "Booking updated");
    Ok(Json(booking))
}
