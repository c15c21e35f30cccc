use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use marquee_core::repository::ReservationStore;
use marquee_core::{EngineError, EngineResult};
use marquee_domain::HoldGrant;

/// Grants and releases time-bounded claims on undifferentiated slot
/// capacity. One active hold per (user, slot); re-holding replaces.
pub struct HoldManager {
    store: Arc<dyn ReservationStore>,
    ttl: Duration,
}

impl HoldManager {
    pub fn new(store: Arc<dyn ReservationStore>, ttl_seconds: i64) -> Self {
        Self {
            store,
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    pub async fn create_hold(
        &self,
        slot_id: Uuid,
        user_id: Uuid,
        quantity: i32,
    ) -> EngineResult<HoldGrant> {
        if quantity < 1 {
            return Err(EngineError::validation("quantity must be at least 1"));
        }

        let now = Utc::now();
        let expires_at = now + self.ttl;
        let grant = self
            .store
            .create_hold(slot_id, user_id, quantity, expires_at, now)
            .await?;

        debug!(%slot_id, %user_id, quantity, remaining = grant.remaining_capacity, "capacity held");
        Ok(grant)
    }

    /// Release the user's hold on the slot. Idempotent; returns the freed
    /// quantity when a hold existed.
    pub async fn release_hold(&self, slot_id: Uuid, user_id: Uuid) -> EngineResult<Option<i32>> {
        let released = self.store.release_hold(slot_id, user_id).await?;
        if let Some(quantity) = released {
            debug!(%slot_id, %user_id, quantity, "capacity hold released");
        }
        Ok(released)
    }
}
