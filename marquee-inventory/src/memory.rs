use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use marquee_core::repository::{CatalogRepository, ReservationStore};
use marquee_core::{EngineError, EngineResult};
use marquee_domain::{
    format_booking_number, Booking, BookingDraft, BookingStatus, CapacityHold, ClaimKind,
    ClaimStatus, HoldGrant, Listing, Seat, SeatClaim, Slot, SweepReport,
};

#[derive(Default)]
struct State {
    listings: HashMap<Uuid, Listing>,
    slots: HashMap<Uuid, Slot>,
    seats: HashMap<Uuid, Seat>,
    /// Sparse claim records keyed by (slot, seat). No entry means available.
    claims: HashMap<(Uuid, Uuid), SeatClaim>,
    /// At most one hold per (slot, user).
    holds: HashMap<(Uuid, Uuid), CapacityHold>,
    bookings: HashMap<Uuid, Booking>,
    /// Last ordinal issued per calendar day.
    day_ordinals: HashMap<NaiveDate, u32>,
}

/// In-memory reservation store. Every trait method takes the single state
/// mutex for its whole duration, so each call is one serialized critical
/// section over shared inventory, the same contract the Postgres store
/// provides with transactions and row guards.
pub struct MemoryStore {
    booking_prefix: String,
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new(booking_prefix: impl Into<String>) -> Self {
        Self {
            booking_prefix: booking_prefix.into(),
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A poisoned mutex only means another thread panicked mid-test;
        // the state itself is still consistent enough to inspect.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn insert_listing(&self, listing: Listing) {
        self.state().listings.insert(listing.id, listing);
    }

    pub fn insert_slot(&self, slot: Slot) {
        self.state().slots.insert(slot.id, slot);
    }

    pub fn insert_seat(&self, seat: Seat) {
        self.state().seats.insert(seat.id, seat);
    }

    /// Test/seed helper: current booked_count of a slot.
    pub fn booked_count(&self, slot_id: Uuid) -> Option<i32> {
        self.state().slots.get(&slot_id).map(|s| s.booked_count)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("BK")
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn get_listing(&self, listing_id: Uuid) -> EngineResult<Option<Listing>> {
        Ok(self.state().listings.get(&listing_id).cloned())
    }

    async fn get_slot(&self, slot_id: Uuid) -> EngineResult<Option<Slot>> {
        Ok(self.state().slots.get(&slot_id).cloned())
    }

    async fn layout_seats(&self, layout_id: Uuid) -> EngineResult<Vec<Seat>> {
        let state = self.state();
        let mut seats: Vec<Seat> = state
            .seats
            .values()
            .filter(|s| s.layout_id == layout_id)
            .cloned()
            .collect();
        seats.sort_by(|a, b| a.row_label.cmp(&b.row_label).then(a.number.cmp(&b.number)));
        Ok(seats)
    }

    async fn seats_by_ids(&self, seat_ids: &[Uuid]) -> EngineResult<Vec<Seat>> {
        let state = self.state();
        Ok(seat_ids
            .iter()
            .filter_map(|id| state.seats.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn lock_seats(
        &self,
        slot_id: Uuid,
        seat_ids: &[Uuid],
        holder: Uuid,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<Uuid>> {
        let mut state = self.state();

        // First pass: reject the whole request if any seat is contested.
        let mut unavailable = Vec::new();
        for seat_id in seat_ids {
            if let Some(claim) = state.claims.get(&(slot_id, *seat_id)) {
                match claim.effective_status(now) {
                    ClaimStatus::Booked => unavailable.push(*seat_id),
                    ClaimStatus::Locked if claim.locked_by != Some(holder) => {
                        unavailable.push(*seat_id)
                    }
                    _ => {}
                }
            }
        }
        if !unavailable.is_empty() {
            return Err(EngineError::SeatConflict { unavailable });
        }

        // Second pass: upsert every claim. Re-locking own seats extends
        // the deadline.
        for seat_id in seat_ids {
            state.claims.insert(
                (slot_id, *seat_id),
                SeatClaim::locked(slot_id, *seat_id, holder, expires_at),
            );
        }
        Ok(seat_ids.to_vec())
    }

    async fn release_seat_locks(
        &self,
        slot_id: Uuid,
        holder: Uuid,
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<Uuid>> {
        let mut state = self.state();
        let mine: Vec<(Uuid, Uuid)> = state
            .claims
            .iter()
            .filter(|((sid, _), c)| {
                *sid == slot_id && c.status == ClaimStatus::Locked && c.locked_by == Some(holder)
            })
            .map(|(key, _)| *key)
            .collect();

        let mut released = Vec::new();
        for key in mine {
            if let Some(claim) = state.claims.remove(&key) {
                // Expired locks are dropped too, but only live ones count
                // as released.
                if claim.effective_status(now) == ClaimStatus::Locked {
                    released.push(key.1);
                }
            }
        }
        Ok(released)
    }

    async fn seat_claims(&self, slot_id: Uuid) -> EngineResult<Vec<SeatClaim>> {
        let state = self.state();
        Ok(state
            .claims
            .iter()
            .filter(|((sid, _), _)| *sid == slot_id)
            .map(|(_, c)| c.clone())
            .collect())
    }

    async fn create_hold(
        &self,
        slot_id: Uuid,
        user_id: Uuid,
        quantity: i32,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> EngineResult<HoldGrant> {
        let mut guard = self.state();
        let state = &mut *guard;

        let slot = state
            .slots
            .get_mut(&slot_id)
            .ok_or_else(|| EngineError::not_found("Time slot"))?;

        // An existing hold is replaced, never double-counted. Even an
        // expired one still has its quantity in the counter until swept.
        let credit = state
            .holds
            .get(&(slot_id, user_id))
            .map(|h| h.quantity)
            .unwrap_or(0);

        let available = slot.capacity - (slot.booked_count - credit);
        if quantity > available {
            return Err(EngineError::CapacityConflict {
                requested: quantity,
                available: available.max(0),
            });
        }

        slot.booked_count = slot.booked_count - credit + quantity;
        let remaining = slot.capacity - slot.booked_count;
        let hold = CapacityHold::new(slot_id, user_id, quantity, expires_at);
        state.holds.insert((slot_id, user_id), hold.clone());

        Ok(HoldGrant {
            hold,
            remaining_capacity: remaining,
            ttl_seconds: (expires_at - now).num_seconds(),
        })
    }

    async fn release_hold(&self, slot_id: Uuid, user_id: Uuid) -> EngineResult<Option<i32>> {
        let mut guard = self.state();
        let state = &mut *guard;

        match state.holds.remove(&(slot_id, user_id)) {
            Some(hold) => {
                if let Some(slot) = state.slots.get_mut(&slot_id) {
                    slot.booked_count = (slot.booked_count - hold.quantity).max(0);
                }
                Ok(Some(hold.quantity))
            }
            None => Ok(None),
        }
    }

    async fn get_hold(&self, slot_id: Uuid, user_id: Uuid) -> EngineResult<Option<CapacityHold>> {
        Ok(self.state().holds.get(&(slot_id, user_id)).cloned())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> EngineResult<SweepReport> {
        let mut guard = self.state();
        let state = &mut *guard;
        let mut report = SweepReport::default();

        let expired_locks: Vec<(Uuid, Uuid)> = state
            .claims
            .iter()
            .filter(|(_, c)| {
                c.status == ClaimStatus::Locked && c.effective_status(now) == ClaimStatus::Available
            })
            .map(|(key, _)| *key)
            .collect();
        for key in expired_locks {
            state.claims.remove(&key);
            report.seats_released += 1;
        }

        let expired_holds: Vec<(Uuid, Uuid)> = state
            .holds
            .iter()
            .filter(|(_, h)| h.is_expired(now))
            .map(|(key, _)| *key)
            .collect();
        for key in expired_holds {
            if let Some(hold) = state.holds.remove(&key) {
                if let Some(slot) = state.slots.get_mut(&hold.slot_id) {
                    slot.booked_count = (slot.booked_count - hold.quantity).max(0);
                }
                report.holds_released += 1;
                report.quantity_released += hold.quantity;
            }
        }

        Ok(report)
    }

    async fn commit_booking(
        &self,
        draft: BookingDraft,
        now: DateTime<Utc>,
    ) -> EngineResult<Booking> {
        let mut guard = self.state();
        let state = &mut *guard;

        let slot = state
            .slots
            .get_mut(&draft.slot_id)
            .ok_or_else(|| EngineError::not_found("Time slot"))?;

        let seat_ids = match &draft.claim {
            ClaimKind::Seats(seat_ids) => {
                let mut contested = Vec::new();
                let mut lapsed = false;
                for seat_id in seat_ids {
                    match state.claims.get(&(draft.slot_id, *seat_id)) {
                        Some(claim) => match claim.effective_status(now) {
                            ClaimStatus::Locked if claim.locked_by == Some(draft.user_id) => {}
                            ClaimStatus::Booked | ClaimStatus::Locked => contested.push(*seat_id),
                            ClaimStatus::Available => lapsed = true,
                        },
                        None => lapsed = true,
                    }
                }
                if !contested.is_empty() {
                    return Err(EngineError::SeatConflict {
                        unavailable: contested,
                    });
                }
                if lapsed {
                    return Err(EngineError::ExpiredClaim(
                        "seat lock missing or expired".to_string(),
                    ));
                }
                if slot.booked_count + draft.quantity > slot.capacity {
                    return Err(EngineError::CapacityConflict {
                        requested: draft.quantity,
                        available: slot.remaining_capacity(),
                    });
                }

                for seat_id in seat_ids {
                    if let Some(claim) = state.claims.get_mut(&(draft.slot_id, *seat_id)) {
                        claim.status = ClaimStatus::Booked;
                        claim.locked_by = None;
                        claim.locked_until = None;
                    }
                }
                slot.booked_count += draft.quantity;
                seat_ids.clone()
            }
            ClaimKind::Capacity => {
                match state.holds.get(&(draft.slot_id, draft.user_id)) {
                    Some(hold) if !hold.is_expired(now) && hold.quantity == draft.quantity => {
                        // Consume the hold; its counter increment now
                        // represents a confirmed booking.
                        state.holds.remove(&(draft.slot_id, draft.user_id));
                    }
                    _ => {
                        return Err(EngineError::ExpiredClaim(
                            "no active hold for this slot".to_string(),
                        ));
                    }
                }
                Vec::new()
            }
        };

        if let Some(listing) = state.listings.get_mut(&draft.listing_id) {
            listing.booked_count += draft.quantity;
        }

        let created_date = now.date_naive();
        let ordinal = {
            let entry = state.day_ordinals.entry(created_date).or_insert(0);
            *entry += 1;
            *entry
        };
        let booking_number = format_booking_number(&self.booking_prefix, created_date, ordinal);

        let booking = Booking {
            id: Uuid::new_v4(),
            user_id: draft.user_id,
            listing_id: draft.listing_id,
            slot_id: draft.slot_id,
            booking_number,
            quantity: draft.quantity,
            total_amount_cents: draft.total_amount_cents,
            currency: draft.currency,
            seat_ids,
            status: BookingStatus::Confirmed,
            event_date: draft.event_date,
            notes: draft.notes,
            created_at: now,
            cancelled_at: None,
        };
        state.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn cancel_booking(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> EngineResult<Booking> {
        let mut guard = self.state();
        let state = &mut *guard;

        let booking = state
            .bookings
            .get_mut(&booking_id)
            .filter(|b| b.user_id == user_id)
            .ok_or_else(|| EngineError::not_found("Booking"))?;

        if !booking.is_cancellable() {
            return Err(EngineError::Validation(format!(
                "Only confirmed bookings can be cancelled (current status: {})",
                booking.status.as_str()
            )));
        }

        booking.status = BookingStatus::Cancelled;
        booking.cancelled_at = Some(now);
        let snapshot = booking.clone();

        for seat_id in &snapshot.seat_ids {
            state.claims.remove(&(snapshot.slot_id, *seat_id));
        }
        if let Some(slot) = state.slots.get_mut(&snapshot.slot_id) {
            slot.booked_count = (slot.booked_count - snapshot.quantity).max(0);
        }
        if let Some(listing) = state.listings.get_mut(&snapshot.listing_id) {
            listing.booked_count = (listing.booked_count - snapshot.quantity).max(0);
        }

        Ok(snapshot)
    }

    async fn get_booking(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
    ) -> EngineResult<Option<Booking>> {
        Ok(self
            .state()
            .bookings
            .get(&booking_id)
            .filter(|b| b.user_id == user_id)
            .cloned())
    }

    async fn list_bookings(
        &self,
        user_id: Uuid,
        status: Option<BookingStatus>,
        page: u32,
        limit: u32,
    ) -> EngineResult<(Vec<Booking>, u64)> {
        let state = self.state();
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.user_id == user_id && status.map_or(true, |s| b.status == s))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = bookings.len() as u64;
        let offset = (page.saturating_sub(1) * limit) as usize;
        let page_items: Vec<Booking> = bookings
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .collect();
        Ok((page_items, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    fn seed_slot(store: &MemoryStore, capacity: i32, booked: i32, layout: Option<Uuid>) -> Slot {
        let slot = Slot {
            id: Uuid::new_v4(),
            listing_id: Uuid::new_v4(),
            layout_id: layout,
            slot_date: NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
            start_time: chrono::NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            end_time: None,
            capacity,
            booked_count: booked,
            price_override_cents: None,
            is_active: true,
        };
        store.insert_slot(slot.clone());
        slot
    }

    fn draft_for(slot: &Slot, user: Uuid, claim: ClaimKind, quantity: i32) -> BookingDraft {
        BookingDraft {
            user_id: user,
            listing_id: slot.listing_id,
            slot_id: slot.id,
            claim,
            quantity,
            total_amount_cents: 100_000,
            currency: "INR".to_string(),
            event_date: slot.slot_date,
            notes: None,
        }
    }

    #[tokio::test]
    async fn contested_seat_fails_whole_request() {
        let store = MemoryStore::default();
        let slot = seed_slot(&store, 100, 0, Some(Uuid::new_v4()));
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let now = Utc::now();
        let until = now + Duration::minutes(10);

        store.lock_seats(slot.id, &[a], u1, until, now).await.unwrap();

        // u2 asks for [a, b, c]; a is held, so nothing is granted and the
        // conflict names exactly the contested seat.
        let err = store
            .lock_seats(slot.id, &[a, b, c], u2, until, now)
            .await
            .unwrap_err();
        match err {
            EngineError::SeatConflict { unavailable } => assert_eq!(unavailable, vec![a]),
            other => panic!("expected SeatConflict, got {other:?}"),
        }
        assert_eq!(store.seat_claims(slot.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn relock_by_same_holder_extends_deadline() {
        let store = MemoryStore::default();
        let slot = seed_slot(&store, 100, 0, Some(Uuid::new_v4()));
        let seat = Uuid::new_v4();
        let user = Uuid::new_v4();
        let now = Utc::now();

        store
            .lock_seats(slot.id, &[seat], user, now + Duration::minutes(10), now)
            .await
            .unwrap();
        store
            .lock_seats(slot.id, &[seat], user, now + Duration::minutes(20), now)
            .await
            .unwrap();

        let claims = store.seat_claims(slot.id).await.unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].locked_until, Some(now + Duration::minutes(20)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_same_seat_lock_has_single_winner() {
        let store = Arc::new(MemoryStore::default());
        let slot = seed_slot(&store, 100, 0, Some(Uuid::new_v4()));
        let seat = Uuid::new_v4();
        let now = Utc::now();
        let until = now + Duration::minutes(10);

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let holder = Uuid::new_v4();
            tasks.push(tokio::spawn(async move {
                store.lock_seats(slot.id, &[seat], holder, until, now).await
            }));
        }

        let mut granted = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                granted += 1;
            }
        }
        assert_eq!(granted, 1);
    }

    #[tokio::test]
    async fn hold_rejection_reports_live_availability() {
        let store = MemoryStore::default();
        let slot = seed_slot(&store, 50, 48, None);
        let now = Utc::now();
        let until = now + Duration::minutes(5);

        let err = store
            .create_hold(slot.id, Uuid::new_v4(), 3, until, now)
            .await
            .unwrap_err();
        match err {
            EngineError::CapacityConflict {
                requested,
                available,
            } => {
                assert_eq!(requested, 3);
                assert_eq!(available, 2);
            }
            other => panic!("expected CapacityConflict, got {other:?}"),
        }
        // Rejection must not mutate the counter.
        assert_eq!(store.booked_count(slot.id), Some(48));

        let grant = store
            .create_hold(slot.id, Uuid::new_v4(), 2, until, now)
            .await
            .unwrap();
        assert_eq!(grant.remaining_capacity, 0);
        assert_eq!(store.booked_count(slot.id), Some(50));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_holds_never_oversell() {
        let store = Arc::new(MemoryStore::default());
        let slot = seed_slot(&store, 10, 0, None);
        let now = Utc::now();
        let until = now + Duration::minutes(5);

        let mut tasks = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            let qty = (i % 4) + 1;
            tasks.push(tokio::spawn(async move {
                store.create_hold(slot.id, Uuid::new_v4(), qty, until, now).await
            }));
        }

        let mut granted_total = 0;
        for task in tasks {
            if let Ok(grant) = task.await.unwrap() {
                granted_total += grant.hold.quantity;
            }
        }
        assert!(granted_total <= 10);
        assert_eq!(store.booked_count(slot.id), Some(granted_total));
    }

    #[tokio::test]
    async fn second_hold_replaces_without_double_count() {
        let store = MemoryStore::default();
        let slot = seed_slot(&store, 10, 0, None);
        let user = Uuid::new_v4();
        let now = Utc::now();
        let until = now + Duration::minutes(5);

        store.create_hold(slot.id, user, 4, until, now).await.unwrap();
        assert_eq!(store.booked_count(slot.id), Some(4));

        // Changing party size from 4 to 2 frees the difference.
        let grant = store.create_hold(slot.id, user, 2, until, now).await.unwrap();
        assert_eq!(grant.hold.quantity, 2);
        assert_eq!(store.booked_count(slot.id), Some(2));
    }

    #[tokio::test]
    async fn release_and_sweep_commute() {
        let store = MemoryStore::default();
        let slot = seed_slot(&store, 10, 0, None);
        let user = Uuid::new_v4();
        let now = Utc::now();

        // Hold already past its deadline, counter still holds its units.
        store
            .create_hold(slot.id, user, 3, now - Duration::seconds(30), now - Duration::minutes(6))
            .await
            .unwrap();
        assert_eq!(store.booked_count(slot.id), Some(3));

        // Explicit release first, sweep second: the sweep is a no-op.
        assert_eq!(store.release_hold(slot.id, user).await.unwrap(), Some(3));
        assert_eq!(store.booked_count(slot.id), Some(0));
        let report = store.sweep_expired(now).await.unwrap();
        assert_eq!(report.holds_released, 0);
        assert_eq!(store.booked_count(slot.id), Some(0));

        // Sweep first, release second: the release is a no-op.
        store
            .create_hold(slot.id, user, 3, now - Duration::seconds(30), now - Duration::minutes(6))
            .await
            .unwrap();
        let report = store.sweep_expired(now).await.unwrap();
        assert_eq!(report.holds_released, 1);
        assert_eq!(report.quantity_released, 3);
        assert_eq!(store.booked_count(slot.id), Some(0));
        assert_eq!(store.release_hold(slot.id, user).await.unwrap(), None);
        assert_eq!(store.booked_count(slot.id), Some(0));
    }

    #[tokio::test]
    async fn expired_lock_blocks_commit_but_frees_the_seat() {
        let store = MemoryStore::default();
        let slot = seed_slot(&store, 100, 0, Some(Uuid::new_v4()));
        let seat = Uuid::new_v4();
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let locked_at = Utc::now();

        store
            .lock_seats(slot.id, &[seat], u1, locked_at + Duration::minutes(10), locked_at)
            .await
            .unwrap();

        // Ten minutes later, no sweep has run. The lazy check still rejects.
        let later = locked_at + Duration::minutes(11);
        let err = store
            .commit_booking(draft_for(&slot, u1, ClaimKind::Seats(vec![seat]), 1), later)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ExpiredClaim(_)));

        // And another user can take the seat immediately.
        store
            .lock_seats(slot.id, &[seat], u2, later + Duration::minutes(10), later)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn booking_numbers_sequence_and_roll_over() {
        let store = MemoryStore::default();
        let slot = seed_slot(&store, 100, 0, None);
        let day_one = Utc::now();
        let day_two = day_one + Duration::days(1);

        let mut numbers = Vec::new();
        for _ in 0..3 {
            let user = Uuid::new_v4();
            store
                .create_hold(slot.id, user, 1, day_one + Duration::minutes(5), day_one)
                .await
                .unwrap();
            let booking = store
                .commit_booking(draft_for(&slot, user, ClaimKind::Capacity, 1), day_one)
                .await
                .unwrap();
            numbers.push(booking.booking_number);
        }

        let date_part = day_one.date_naive().format("%Y%m%d").to_string();
        assert_eq!(numbers[0], format!("BK-{date_part}-001"));
        assert_eq!(numbers[1], format!("BK-{date_part}-002"));
        assert_eq!(numbers[2], format!("BK-{date_part}-003"));

        // First booking of the next day resets the ordinal without any
        // maintenance step.
        let user = Uuid::new_v4();
        store
            .create_hold(slot.id, user, 1, day_two + Duration::minutes(5), day_two)
            .await
            .unwrap();
        let booking = store
            .commit_booking(draft_for(&slot, user, ClaimKind::Capacity, 1), day_two)
            .await
            .unwrap();
        let next_date = day_two.date_naive().format("%Y%m%d").to_string();
        assert_eq!(booking.booking_number, format!("BK-{next_date}-001"));
    }

    #[tokio::test]
    async fn cancel_reverts_seats_and_counters_but_keeps_the_row() {
        let store = MemoryStore::default();
        let listing = Listing::new("Late Show", Some(30_000));
        store.insert_listing(listing.clone());
        let mut slot = seed_slot(&store, 100, 0, Some(Uuid::new_v4()));
        slot.listing_id = listing.id;
        store.insert_slot(slot.clone());

        let seat = Uuid::new_v4();
        let user = Uuid::new_v4();
        let now = Utc::now();

        store
            .lock_seats(slot.id, &[seat], user, now + Duration::minutes(10), now)
            .await
            .unwrap();
        let booking = store
            .commit_booking(draft_for(&slot, user, ClaimKind::Seats(vec![seat]), 1), now)
            .await
            .unwrap();
        assert_eq!(store.booked_count(slot.id), Some(1));

        let cancelled = store.cancel_booking(booking.id, user, now).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());
        assert_eq!(store.booked_count(slot.id), Some(0));
        assert!(store.seat_claims(slot.id).await.unwrap().is_empty());

        // History is preserved and a second cancel is rejected.
        let kept = store.get_booking(booking.id, user).await.unwrap().unwrap();
        assert_eq!(kept.status, BookingStatus::Cancelled);
        assert!(store.cancel_booking(booking.id, user, now).await.is_err());
    }
}
