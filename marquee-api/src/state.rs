use std::sync::Arc;

use marquee_booking::ReservationService;

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReservationService>,
    pub auth: AuthConfig,
    pub metrics: Arc<Metrics>,
}
