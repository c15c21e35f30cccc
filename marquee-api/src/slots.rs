use axum::{
    extract::{Path, State},
    routing::get,
    routing::post,
    Json, Router,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use marquee_booking::SeatMapView;
use marquee_core::EngineError;
use marquee_domain::SeatLockGrant;

use crate::auth::authenticate;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct SeatLockRequest {
    seat_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
struct SeatLockReleaseResponse {
    released_seats: Vec<Uuid>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/time-slots/{slot_id}/seat-map", get(seat_map))
        .route(
            "/v1/time-slots/{slot_id}/seats/lock",
            post(lock_seats).delete(release_seat_locks),
        )
}

/// Seat map for the selection screen. Anonymous: anyone can view
/// availability, nobody can mutate it without a token.
async fn seat_map(
    State(state): State<AppState>,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<SeatMapView>, AppError> {
    let view = state.service.seat_map(slot_id).await?;
    Ok(Json(view))
}

async fn lock_seats(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(slot_id): Path<Uuid>,
    Json(req): Json<SeatLockRequest>,
) -> Result<Json<SeatLockGrant>, AppError> {
    let user = authenticate(&state, &bearer)?;
    match state.service.lock_seats(user, slot_id, &req.seat_ids).await {
        Ok(grant) => Ok(Json(grant)),
        Err(err) => {
            if matches!(err, EngineError::SeatConflict { .. }) {
                state.metrics.claim_conflicts.inc();
            }
            Err(err.into())
        }
    }
}

async fn release_seat_locks(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<SeatLockReleaseResponse>, AppError> {
    let user = authenticate(&state, &bearer)?;
    let released_seats = state.service.release_seats(user, slot_id).await?;
    Ok(Json(SeatLockReleaseResponse { released_seats }))
}
