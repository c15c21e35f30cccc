use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seat claim status for one (slot, seat) pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimStatus {
    Available,
    Locked,
    Booked,
}

/// Per-seat-per-slot availability record, created lazily: the absence of a
/// record for a (slot, seat) pair reads as Available. Every read path must
/// default on miss instead of assuming a row exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatClaim {
    pub slot_id: Uuid,
    pub seat_id: Uuid,
    pub status: ClaimStatus,
    pub locked_by: Option<Uuid>,
    pub locked_until: Option<DateTime<Utc>>,
}

impl SeatClaim {
    /// The default-on-miss record for a pair with no stored claim.
    pub fn available(slot_id: Uuid, seat_id: Uuid) -> Self {
        Self {
            slot_id,
            seat_id,
            status: ClaimStatus::Available,
            locked_by: None,
            locked_until: None,
        }
    }

    pub fn locked(slot_id: Uuid, seat_id: Uuid, holder: Uuid, until: DateTime<Utc>) -> Self {
        Self {
            slot_id,
            seat_id,
            status: ClaimStatus::Locked,
            locked_by: Some(holder),
            locked_until: Some(until),
        }
    }

    /// Lazy expiry: the stored deadline is authoritative at read time. A
    /// lock whose deadline has passed reads as Available whether or not the
    /// sweeper has reclaimed it yet.
    pub fn effective_status(&self, now: DateTime<Utc>) -> ClaimStatus {
        match self.status {
            ClaimStatus::Locked => match self.locked_until {
                Some(until) if until >= now => ClaimStatus::Locked,
                _ => ClaimStatus::Available,
            },
            other => other,
        }
    }

    /// True when `holder` owns a live (non-expired) lock on this seat.
    pub fn is_held_by(&self, holder: Uuid, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == ClaimStatus::Locked && self.locked_by == Some(holder)
    }
}

/// Successful lock acquisition payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatLockGrant {
    pub locked_seats: Vec<Uuid>,
    pub locked_until: DateTime<Utc>,
    pub ttl_seconds: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn expired_lock_reads_as_available() {
        let now = Utc::now();
        let holder = Uuid::new_v4();
        let claim = SeatClaim::locked(
            Uuid::new_v4(),
            Uuid::new_v4(),
            holder,
            now - Duration::seconds(1),
        );

        assert_eq!(claim.status, ClaimStatus::Locked);
        assert_eq!(claim.effective_status(now), ClaimStatus::Available);
        assert!(!claim.is_held_by(holder, now));
    }

    #[test]
    fn live_lock_is_held_only_by_its_holder() {
        let now = Utc::now();
        let holder = Uuid::new_v4();
        let claim = SeatClaim::locked(
            Uuid::new_v4(),
            Uuid::new_v4(),
            holder,
            now + Duration::minutes(10),
        );

        assert!(claim.is_held_by(holder, now));
        assert!(!claim.is_held_by(Uuid::new_v4(), now));
    }

    #[test]
    fn booked_never_expires() {
        let mut claim = SeatClaim::available(Uuid::new_v4(), Uuid::new_v4());
        claim.status = ClaimStatus::Booked;
        assert_eq!(
            claim.effective_status(Utc::now() + Duration::days(365)),
            ClaimStatus::Booked
        );
    }
}
