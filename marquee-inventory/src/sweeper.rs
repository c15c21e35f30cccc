use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info};

use marquee_core::repository::ReservationStore;
use marquee_core::EngineResult;
use marquee_domain::SweepReport;

/// Periodic reclaimer of lapsed seat locks and capacity holds.
///
/// Sweeping is cleanup, not enforcement: every confirm path re-checks the
/// stored deadline itself, so a claim that expired between sweeps is
/// already dead to readers. Each reclaim is atomic per record inside the
/// store, which makes the sweeper safe to run concurrently with user
/// traffic.
pub struct ExpirySweeper {
    store: Arc<dyn ReservationStore>,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(store: Arc<dyn ReservationStore>, interval_seconds: u64) -> Self {
        Self {
            store,
            interval: Duration::from_secs(interval_seconds),
        }
    }

    /// One reclaim pass over all expired claims.
    pub async fn sweep_once(&self) -> EngineResult<SweepReport> {
        let report = self.store.sweep_expired(Utc::now()).await?;
        if !report.is_empty() {
            info!(
                seats = report.seats_released,
                holds = report.holds_released,
                quantity = report.quantity_released,
                "expired claims reclaimed"
            );
        }
        Ok(report)
    }

    /// Run forever on the configured interval. Spawn as a background task.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = self.sweep_once().await {
                error!("sweep pass failed: {}", err);
            }
        }
    }
}
