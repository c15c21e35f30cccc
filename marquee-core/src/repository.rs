use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use marquee_domain::{
    Booking, BookingDraft, BookingStatus, CapacityHold, HoldGrant, Listing, Seat, SeatClaim, Slot,
    SweepReport,
};

use crate::EngineResult;

/// Read-only access to the catalog collaborator: listings, slots and seat
/// layouts. The reservation engine never writes through this trait.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn get_listing(&self, listing_id: Uuid) -> EngineResult<Option<Listing>>;

    async fn get_slot(&self, slot_id: Uuid) -> EngineResult<Option<Slot>>;

    /// All seats belonging to a seating layout, in rendering order.
    async fn layout_seats(&self, layout_id: Uuid) -> EngineResult<Vec<Seat>>;

    async fn seats_by_ids(&self, seat_ids: &[Uuid]) -> EngineResult<Vec<Seat>>;
}

/// Durable state for seat claims, capacity holds and bookings: the single
/// source of truth the managers operate on.
///
/// Every method is one atomic unit: implementations serialize each call
/// against concurrent mutations of the same rows (a single critical
/// section in memory, guarded row updates inside a transaction in
/// Postgres). Callers never read-modify-write across method boundaries.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// All-or-nothing lock upsert for a seat set. A seat is grantable when
    /// its claim is missing, available, expired, or already locked by the
    /// same holder (re-lock extends the deadline). On any contested seat
    /// the whole request fails with `SeatConflict` listing exactly the
    /// unavailable seats, and no state changes.
    async fn lock_seats(
        &self,
        slot_id: Uuid,
        seat_ids: &[Uuid],
        holder: Uuid,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<Uuid>>;

    /// Idempotently reverts every live lock held by `holder` on the slot.
    /// Returns the released seat ids; missing or expired locks are not an
    /// error.
    async fn release_seat_locks(
        &self,
        slot_id: Uuid,
        holder: Uuid,
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<Uuid>>;

    /// Stored claims for a slot. Sparse: pairs without a record are
    /// available and simply absent from the result.
    async fn seat_claims(&self, slot_id: Uuid) -> EngineResult<Vec<SeatClaim>>;

    /// Atomic capacity check-and-increment. Succeeds only while
    /// `booked_count + quantity <= capacity`; an existing active hold for
    /// the same (user, slot) is replaced with the counter adjusted by the
    /// delta. On failure reports current availability without mutating
    /// anything.
    async fn create_hold(
        &self,
        slot_id: Uuid,
        user_id: Uuid,
        quantity: i32,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> EngineResult<HoldGrant>;

    /// Decrements the slot counter by the held quantity and deletes the
    /// hold. Returns the released quantity, or None when no hold existed.
    async fn release_hold(&self, slot_id: Uuid, user_id: Uuid) -> EngineResult<Option<i32>>;

    async fn get_hold(&self, slot_id: Uuid, user_id: Uuid) -> EngineResult<Option<CapacityHold>>;

    /// Bulk-reclaims expired seat locks and capacity holds. Each record is
    /// reclaimed atomically so a sweep racing a confirm can neither
    /// double-release nor under-release.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> EngineResult<SweepReport>;

    /// The atomic confirm step: verifies and consumes the draft's claim
    /// (lazy deadline check included), updates capacity counters,
    /// allocates the day-scoped booking number and inserts the booking,
    /// all in one unit of work that commits together or not at all.
    async fn commit_booking(
        &self,
        draft: BookingDraft,
        now: DateTime<Utc>,
    ) -> EngineResult<Booking>;

    /// Cancels a confirmed booking: status becomes cancelled with a timestamp,
    /// seats revert to available, capacity counters decrement. The row is
    /// preserved.
    async fn cancel_booking(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> EngineResult<Booking>;

    async fn get_booking(&self, booking_id: Uuid, user_id: Uuid)
        -> EngineResult<Option<Booking>>;

    /// The user's bookings, newest first, with the total count for
    /// pagination.
    async fn list_bookings(
        &self,
        user_id: Uuid,
        status: Option<BookingStatus>,
        page: u32,
        limit: u32,
    ) -> EngineResult<(Vec<Booking>, u64)>;
}
