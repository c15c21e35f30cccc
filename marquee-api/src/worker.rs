use std::sync::Arc;

use tracing::info;

use marquee_core::repository::ReservationStore;
use marquee_inventory::ExpirySweeper;

/// Spawn the background expiry sweeper. Correctness never depends on its
/// cadence (confirm paths re-check deadlines themselves), so a slow or
/// crashed sweeper only delays reclaim.
pub fn spawn_sweeper(store: Arc<dyn ReservationStore>, interval_seconds: u64) {
    let sweeper = ExpirySweeper::new(store, interval_seconds);
    tokio::spawn(async move {
        sweeper.run().await;
    });
    info!(interval_seconds, "expiry sweeper started");
}
