use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use marquee_core::EngineError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    ValidationError(String),
    NotFoundError(String),
    /// Contested seats, enumerated so the client can re-offer alternatives
    /// without another round trip.
    SeatConflict(Vec<Uuid>),
    CapacityConflict {
        requested: i32,
        available: i32,
    },
    /// The claim behind a confirm is missing or past its deadline. Mapped
    /// to 410 so clients route the user back to selection rather than
    /// retrying the same claim.
    ExpiredClaim(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::AuthenticationError(msg) => {
                (StatusCode::UNAUTHORIZED, json!({ "error": msg }))
            }
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::SeatConflict(unavailable) => (
                StatusCode::CONFLICT,
                json!({
                    "error": "One or more seats are unavailable",
                    "unavailable_seats": unavailable,
                }),
            ),
            AppError::CapacityConflict {
                requested,
                available,
            } => (
                StatusCode::CONFLICT,
                json!({
                    "error": format!("Only {available} spot(s) available, requested {requested}"),
                    "available": available,
                    "requested": requested,
                }),
            ),
            AppError::ExpiredClaim(msg) => (StatusCode::GONE, json!({ "error": msg })),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(msg) => AppError::ValidationError(msg),
            EngineError::NotFound(what) => AppError::NotFoundError(format!("{what} not found")),
            EngineError::SeatConflict { unavailable } => AppError::SeatConflict(unavailable),
            EngineError::CapacityConflict {
                requested,
                available,
            } => AppError::CapacityConflict {
                requested,
                available,
            },
            EngineError::ExpiredClaim(msg) => AppError::ExpiredClaim(msg),
            EngineError::SequenceGeneration(msg) | EngineError::Storage(msg) => {
                AppError::InternalServerError(msg)
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}
