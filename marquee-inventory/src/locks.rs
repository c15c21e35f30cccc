use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use marquee_core::repository::ReservationStore;
use marquee_core::{EngineError, EngineResult};
use marquee_domain::SeatLockGrant;

/// Grants and releases time-bounded exclusive claims on individual seats.
/// Atomicity lives in the store; this layer owns the TTL policy and the
/// grant payload shape.
pub struct LockManager {
    store: Arc<dyn ReservationStore>,
    ttl: Duration,
}

impl LockManager {
    pub fn new(store: Arc<dyn ReservationStore>, ttl_seconds: i64) -> Self {
        Self {
            store,
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    /// Lock a set of seats for `holder`, all-or-nothing. Re-locking seats
    /// already held by the same user extends their deadline.
    pub async fn lock_seats(
        &self,
        slot_id: Uuid,
        seat_ids: &[Uuid],
        holder: Uuid,
    ) -> EngineResult<SeatLockGrant> {
        if seat_ids.is_empty() {
            return Err(EngineError::validation("seat_ids must not be empty"));
        }

        let now = Utc::now();
        let expires_at = now + self.ttl;
        let locked_seats = self
            .store
            .lock_seats(slot_id, seat_ids, holder, expires_at, now)
            .await?;

        debug!(%slot_id, %holder, seats = locked_seats.len(), "seats locked");
        Ok(SeatLockGrant {
            locked_seats,
            locked_until: expires_at,
            ttl_seconds: self.ttl.num_seconds(),
        })
    }

    /// Release every live lock `holder` has on the slot. Idempotent.
    pub async fn release_locks(&self, slot_id: Uuid, holder: Uuid) -> EngineResult<Vec<Uuid>> {
        let released = self
            .store
            .release_seat_locks(slot_id, holder, Utc::now())
            .await?;
        if !released.is_empty() {
            debug!(%slot_id, %holder, seats = released.len(), "seat locks released");
        }
        Ok(released)
    }
}
