use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use marquee_core::EngineError;
use marquee_domain::{Booking, BookingStatus, ConfirmBookingRequest};

use crate::auth::authenticate;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct ListParams {
    status: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
}

#[derive(Debug, Serialize)]
struct PaginatedBookings {
    data: Vec<Booking>,
    total: u64,
    page: u32,
    limit: u32,
    total_pages: u64,
}

#[derive(Debug, Serialize)]
struct BookingCancelResponse {
    id: Uuid,
    booking_number: String,
    status: BookingStatus,
    cancelled_at: Option<DateTime<Utc>>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(confirm_booking).get(list_bookings))
        .route("/v1/bookings/{booking_id}", get(get_booking))
        .route("/v1/bookings/{booking_id}/cancel", patch(cancel_booking))
}

/// Confirm a booking from the caller's live claim (seat locks or a
/// capacity hold, selected by the slot's reservation mode).
async fn confirm_booking(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Json(req): Json<ConfirmBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let user = authenticate(&state, &bearer)?;
    match state.service.confirm_booking(user, req).await {
        Ok(booking) => {
            state.metrics.bookings_confirmed.inc();
            Ok((StatusCode::CREATED, Json(booking)))
        }
        Err(err) => {
            if matches!(
                err,
                EngineError::SeatConflict { .. } | EngineError::CapacityConflict { .. }
            ) {
                state.metrics.claim_conflicts.inc();
            }
            Err(err.into())
        }
    }
}

/// The authenticated user's bookings, newest first.
async fn list_bookings(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Query(params): Query<ListParams>,
) -> Result<Json<PaginatedBookings>, AppError> {
    let user = authenticate(&state, &bearer)?;

    let status = match params.status.as_deref() {
        None => None,
        Some("confirmed") | Some("CONFIRMED") => Some(BookingStatus::Confirmed),
        Some("cancelled") | Some("CANCELLED") => Some(BookingStatus::Cancelled),
        Some("completed") | Some("COMPLETED") => Some(BookingStatus::Completed),
        Some(other) => {
            return Err(AppError::ValidationError(format!(
                "Unknown booking status filter: {other}"
            )))
        }
    };

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 50);
    let (data, total) = state.service.list_bookings(user, status, page, limit).await?;

    Ok(Json(PaginatedBookings {
        data,
        total,
        page,
        limit,
        total_pages: total.div_ceil(limit as u64),
    }))
}

async fn get_booking(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let user = authenticate(&state, &bearer)?;
    let booking = state.service.get_booking(user, booking_id).await?;
    Ok(Json(booking))
}

/// Cancel a confirmed booking: seats and capacity return to inventory,
/// the row is preserved with a cancellation timestamp.
async fn cancel_booking(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingCancelResponse>, AppError> {
    let user = authenticate(&state, &bearer)?;
    let booking = state.service.cancel_booking(user, booking_id).await?;
    state.metrics.bookings_cancelled.inc();

    Ok(Json(BookingCancelResponse {
        id: booking.id,
        booking_number: booking.booking_number,
        status: booking.status,
        cancelled_at: booking.cancelled_at,
    }))
}
