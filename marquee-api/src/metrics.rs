use axum::extract::State;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

use crate::error::AppError;
use crate::state::AppState;

/// Engine counters exposed on /metrics.
pub struct Metrics {
    registry: Registry,
    pub bookings_confirmed: IntCounter,
    pub bookings_cancelled: IntCounter,
    pub claim_conflicts: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let bookings_confirmed = IntCounter::new(
            "marquee_bookings_confirmed_total",
            "Bookings committed successfully",
        )?;
        let bookings_cancelled = IntCounter::new(
            "marquee_bookings_cancelled_total",
            "Confirmed bookings cancelled",
        )?;
        let claim_conflicts = IntCounter::new(
            "marquee_claim_conflicts_total",
            "Seat or capacity conflicts returned to clients",
        )?;

        registry.register(Box::new(bookings_confirmed.clone()))?;
        registry.register(Box::new(bookings_cancelled.clone()))?;
        registry.register(Box::new(claim_conflicts.clone()))?;

        Ok(Self {
            registry,
            bookings_confirmed,
            bookings_cancelled,
            claim_conflicts,
        })
    }
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, AppError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&state.metrics.registry.gather(), &mut buffer)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| AppError::InternalServerError(e.to_string()))
}
