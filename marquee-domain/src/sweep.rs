use serde::{Deserialize, Serialize};

/// What one sweeper pass reclaimed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SweepReport {
    /// Expired seat locks reverted to available.
    pub seats_released: usize,
    /// Expired capacity holds deleted.
    pub holds_released: usize,
    /// Total capacity units returned to their slots by hold reclaim.
    pub quantity_released: i32,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.seats_released == 0 && self.holds_released == 0
    }
}
