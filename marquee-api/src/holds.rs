use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use marquee_core::EngineError;

use crate::auth::authenticate;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct HoldRequest {
    quantity: i32,
}

#[derive(Debug, Serialize)]
struct HoldResponse {
    hold_id: Uuid,
    time_slot_id: Uuid,
    quantity: i32,
    expires_at: DateTime<Utc>,
    ttl_seconds: i64,
    remaining_capacity: i32,
}

#[derive(Debug, Serialize)]
struct HoldReleaseResponse {
    time_slot_id: Uuid,
    released_quantity: i32,
}

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/v1/time-slots/{slot_id}/hold",
        post(create_hold).delete(release_hold),
    )
}

/// Place a temporary capacity hold for a slot with no seating layout.
async fn create_hold(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(slot_id): Path<Uuid>,
    Json(req): Json<HoldRequest>,
) -> Result<(StatusCode, Json<HoldResponse>), AppError> {
    let user = authenticate(&state, &bearer)?;
    match state.service.create_hold(user, slot_id, req.quantity).await {
        Ok(grant) => Ok((
            StatusCode::CREATED,
            Json(HoldResponse {
                hold_id: grant.hold.id,
                time_slot_id: slot_id,
                quantity: grant.hold.quantity,
                expires_at: grant.hold.expires_at,
                ttl_seconds: grant.ttl_seconds,
                remaining_capacity: grant.remaining_capacity,
            }),
        )),
        Err(err) => {
            if matches!(err, EngineError::CapacityConflict { .. }) {
                state.metrics.claim_conflicts.inc();
            }
            Err(err.into())
        }
    }
}

/// Release the caller's hold (user went back / abandoned checkout).
async fn release_hold(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<HoldReleaseResponse>, AppError> {
    let user = authenticate(&state, &bearer)?;
    let released = state.service.release_hold(user, slot_id).await?;
    Ok(Json(HoldReleaseResponse {
        time_slot_id: slot_id,
        released_quantity: released.unwrap_or(0),
    }))
}
