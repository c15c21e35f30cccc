use serde::{Deserialize, Serialize};

/// Tunable knobs of the reservation engine. Loaded from configuration in
/// deployments; `Default` carries the documented baseline values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationPolicy {
    /// Seat lock lifetime.
    pub seat_lock_seconds: i64,
    /// Capacity hold lifetime.
    pub hold_seconds: i64,
    /// Cadence of the background expiry sweeper.
    pub sweep_interval_seconds: u64,
    /// Booking reference prefix, e.g. "BK" in `BK-20260304-001`.
    pub booking_prefix: String,
}

impl Default for ReservationPolicy {
    fn default() -> Self {
        Self {
            seat_lock_seconds: 600,
            hold_seconds: 300,
            sweep_interval_seconds: 60,
            booking_prefix: "BK".to_string(),
        }
    }
}
