use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A time-bounded claim on N units of undifferentiated slot capacity.
/// At most one active hold exists per (user, slot); its quantity is already
/// counted into the slot's `booked_count` while the hold is live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityHold {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub user_id: Uuid,
    pub quantity: i32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl CapacityHold {
    pub fn new(slot_id: Uuid, user_id: Uuid, quantity: i32, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            slot_id,
            user_id,
            quantity,
            expires_at,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Successful hold acquisition payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldGrant {
    pub hold: CapacityHold,
    /// Capacity left in the slot after this hold was counted.
    pub remaining_capacity: i32,
    pub ttl_seconds: i64,
}
