use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use marquee_core::identity::UserContext;
use marquee_core::repository::{CatalogRepository, ReservationStore};
use marquee_core::{EngineError, EngineResult};
use marquee_domain::{
    Booking, BookingDraft, BookingStatus, ClaimKind, ClaimStatus, ConfirmBookingRequest,
    HoldGrant, Listing, ReservationMode, Seat, SeatLockGrant, Slot,
};
use marquee_inventory::{HoldManager, LockManager};

use crate::policy::ReservationPolicy;
use crate::pricing::PriceResolver;

/// Seat-map entry as rendered to clients. Status already has lazy expiry
/// applied; a missing claim record reads as available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatMapSeat {
    pub id: Uuid,
    pub number: i32,
    pub status: ClaimStatus,
    pub is_aisle: bool,
    pub is_accessible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatMapRow {
    pub label: String,
    pub category: String,
    pub price_cents: i32,
    pub seats: Vec<SeatMapSeat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatMapView {
    pub time_slot_id: Uuid,
    pub rows: Vec<SeatMapRow>,
}

/// Orchestrates the reservation engine behind a small set of public
/// operations: lock/release seats, create/release holds, confirm and
/// cancel bookings, plus read paths.
///
/// Per attempt the state machine is Selecting, then Locked/Held, then
/// Confirmed or Released; expiry collapses to Released. All request validation happens
/// here, before any shared state is touched; all atomicity lives in the
/// store.
pub struct ReservationService {
    catalog: Arc<dyn CatalogRepository>,
    store: Arc<dyn ReservationStore>,
    locks: LockManager,
    holds: HoldManager,
    policy: ReservationPolicy,
}

impl ReservationService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        store: Arc<dyn ReservationStore>,
        policy: ReservationPolicy,
    ) -> Self {
        let locks = LockManager::new(store.clone(), policy.seat_lock_seconds);
        let holds = HoldManager::new(store.clone(), policy.hold_seconds);
        Self {
            catalog,
            store,
            locks,
            holds,
            policy,
        }
    }

    pub fn policy(&self) -> &ReservationPolicy {
        &self.policy
    }

    async fn require_active_slot(&self, slot_id: Uuid) -> EngineResult<Slot> {
        self.catalog
            .get_slot(slot_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or_else(|| EngineError::not_found("Time slot"))
    }

    async fn require_active_listing(&self, listing_id: Uuid) -> EngineResult<Listing> {
        self.catalog
            .get_listing(listing_id)
            .await?
            .filter(|l| l.is_active())
            .ok_or_else(|| EngineError::not_found("Listing"))
    }

    /// Resolve and validate the seats of a seat-path request: all ids must
    /// exist and belong to the slot's layout.
    async fn require_layout_seats(
        &self,
        slot: &Slot,
        seat_ids: &[Uuid],
    ) -> EngineResult<Vec<Seat>> {
        let layout_id = slot.layout_id.ok_or_else(|| {
            EngineError::validation("this slot has no seating layout, use a capacity hold")
        })?;

        let seats = self.catalog.seats_by_ids(seat_ids).await?;
        if seats.len() != seat_ids.len() || seats.iter().any(|s| s.layout_id != layout_id) {
            return Err(EngineError::validation(
                "one or more seats do not belong to this slot's layout",
            ));
        }
        Ok(seats)
    }

    /// Lock seats for the user. Entry point of the seat-based path.
    pub async fn lock_seats(
        &self,
        user: UserContext,
        slot_id: Uuid,
        seat_ids: &[Uuid],
    ) -> EngineResult<SeatLockGrant> {
        if seat_ids.is_empty() {
            return Err(EngineError::validation("seat_ids must not be empty"));
        }
        let slot = self.require_active_slot(slot_id).await?;
        self.require_layout_seats(&slot, seat_ids).await?;
        self.locks.lock_seats(slot_id, seat_ids, user.user_id).await
    }

    /// Release all of the user's live seat locks on a slot. Idempotent.
    pub async fn release_seats(
        &self,
        user: UserContext,
        slot_id: Uuid,
    ) -> EngineResult<Vec<Uuid>> {
        self.locks.release_locks(slot_id, user.user_id).await
    }

    /// Place a capacity hold. Entry point of the quantity-based path.
    pub async fn create_hold(
        &self,
        user: UserContext,
        slot_id: Uuid,
        quantity: i32,
    ) -> EngineResult<HoldGrant> {
        let slot = self.require_active_slot(slot_id).await?;
        if slot.reservation_mode() == ReservationMode::Seated {
            return Err(EngineError::validation(
                "this slot is seat-mapped, lock seats instead of holding capacity",
            ));
        }
        self.holds.create_hold(slot_id, user.user_id, quantity).await
    }

    /// Release the user's capacity hold. Idempotent.
    pub async fn release_hold(
        &self,
        user: UserContext,
        slot_id: Uuid,
    ) -> EngineResult<Option<i32>> {
        self.holds.release_hold(slot_id, user.user_id).await
    }

    /// The seat map for a slot, grouped by row, claims merged in with
    /// default-on-miss availability. Anonymous read.
    pub async fn seat_map(&self, slot_id: Uuid) -> EngineResult<SeatMapView> {
        let slot = self.require_active_slot(slot_id).await?;
        let layout_id = slot
            .layout_id
            .ok_or_else(|| EngineError::validation("this slot has no seating layout"))?;

        let seats = self.catalog.layout_seats(layout_id).await?;
        let claims = self.store.seat_claims(slot_id).await?;
        let now = Utc::now();
        let by_seat: BTreeMap<Uuid, ClaimStatus> = claims
            .iter()
            .map(|c| (c.seat_id, c.effective_status(now)))
            .collect();

        let mut rows: BTreeMap<String, SeatMapRow> = BTreeMap::new();
        for seat in seats {
            let status = by_seat
                .get(&seat.id)
                .copied()
                .unwrap_or(ClaimStatus::Available);
            let row = rows.entry(seat.row_label.clone()).or_insert_with(|| SeatMapRow {
                label: seat.row_label.clone(),
                category: seat.category.clone(),
                price_cents: seat.price_cents,
                seats: Vec::new(),
            });
            row.seats.push(SeatMapSeat {
                id: seat.id,
                number: seat.number,
                status,
                is_aisle: seat.is_aisle,
                is_accessible: seat.is_accessible,
            });
        }

        Ok(SeatMapView {
            time_slot_id: slot_id,
            rows: rows.into_values().collect(),
        })
    }

    /// Confirm a booking from the user's live claim. Two flows, selected
    /// by the slot's reservation mode:
    ///
    /// - seat-based: all requested seats must be locked by the user and
    ///   unexpired; the total is summed from seat prices.
    /// - capacity-based: the user's active hold is consumed; the total
    ///   follows the override/base-price precedence.
    ///
    /// Claim consumption, counter updates, number allocation and the
    /// booking insert commit atomically in the store.
    pub async fn confirm_booking(
        &self,
        user: UserContext,
        req: ConfirmBookingRequest,
    ) -> EngineResult<Booking> {
        let listing = self.require_active_listing(req.listing_id).await?;
        let slot = self.require_active_slot(req.time_slot_id).await?;
        if slot.listing_id != listing.id {
            return Err(EngineError::validation(
                "time slot does not belong to this listing",
            ));
        }

        let (claim, quantity, total) = match slot.reservation_mode() {
            ReservationMode::Seated => {
                if req.seat_ids.is_empty() {
                    return Err(EngineError::validation(
                        "seat_ids are required when booking a seat-mapped slot",
                    ));
                }
                let seats = self.require_layout_seats(&slot, &req.seat_ids).await?;
                let quantity = seats.len() as i32;
                let total = PriceResolver::resolve(&seats, quantity, &slot, &listing);
                (ClaimKind::Seats(req.seat_ids.clone()), quantity, total)
            }
            ReservationMode::Capacity => {
                if !req.seat_ids.is_empty() {
                    return Err(EngineError::validation(
                        "this slot has no seating layout, book by quantity",
                    ));
                }
                // The active hold carries the authoritative quantity; the
                // commit re-verifies it inside its own atomic step.
                let hold = self
                    .store
                    .get_hold(slot.id, user.user_id)
                    .await?
                    .filter(|h| !h.is_expired(Utc::now()))
                    .ok_or_else(|| {
                        EngineError::ExpiredClaim("no active hold for this slot".to_string())
                    })?;
                if let Some(quantity) = req.quantity {
                    if quantity != hold.quantity {
                        return Err(EngineError::validation(
                            "quantity does not match the active hold",
                        ));
                    }
                }
                let total = PriceResolver::resolve(&[], hold.quantity, &slot, &listing);
                (ClaimKind::Capacity, hold.quantity, total)
            }
        };

        let draft = BookingDraft {
            user_id: user.user_id,
            listing_id: listing.id,
            slot_id: slot.id,
            claim,
            quantity,
            total_amount_cents: total,
            currency: listing.currency.clone(),
            event_date: slot.slot_date,
            notes: req.notes,
        };

        let booking = self.store.commit_booking(draft, Utc::now()).await?;
        info!(
            booking_id = %booking.id,
            number = %booking.booking_number,
            quantity = booking.quantity,
            "booking confirmed"
        );
        Ok(booking)
    }

    /// Cancel a confirmed booking, returning seats/capacity to inventory
    /// while preserving the row.
    pub async fn cancel_booking(
        &self,
        user: UserContext,
        booking_id: Uuid,
    ) -> EngineResult<Booking> {
        let booking = self
            .store
            .cancel_booking(booking_id, user.user_id, Utc::now())
            .await?;
        info!(booking_id = %booking.id, number = %booking.booking_number, "booking cancelled");
        Ok(booking)
    }

    pub async fn get_booking(
        &self,
        user: UserContext,
        booking_id: Uuid,
    ) -> EngineResult<Booking> {
        self.store
            .get_booking(booking_id, user.user_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Booking"))
    }

    /// The user's bookings, newest first.
    pub async fn list_bookings(
        &self,
        user: UserContext,
        status: Option<BookingStatus>,
        page: u32,
        limit: u32,
    ) -> EngineResult<(Vec<Booking>, u64)> {
        self.store
            .list_bookings(user.user_id, status, page.max(1), limit.clamp(1, 50))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use marquee_inventory::MemoryStore;

    struct Fixture {
        service: ReservationService,
        store: Arc<MemoryStore>,
        listing: Listing,
        seated_slot: Slot,
        capacity_slot: Slot,
        seats: Vec<Seat>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::default());
        let listing = Listing::new("Evening Show", Some(30_000));
        store.insert_listing(listing.clone());

        let layout_id = Uuid::new_v4();
        let seats = vec![
            Seat::new(layout_id, "A", 1, "platinum", 50_000),
            Seat::new(layout_id, "A", 2, "platinum", 50_000),
            Seat::new(layout_id, "B", 1, "gold", 35_000),
        ];
        for seat in &seats {
            store.insert_seat(seat.clone());
        }

        let seated_slot = Slot {
            id: Uuid::new_v4(),
            listing_id: listing.id,
            layout_id: Some(layout_id),
            slot_date: NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
            start_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            end_time: None,
            capacity: 100,
            booked_count: 0,
            price_override_cents: None,
            is_active: true,
        };
        store.insert_slot(seated_slot.clone());

        let capacity_slot = Slot {
            id: Uuid::new_v4(),
            listing_id: listing.id,
            layout_id: None,
            slot_date: NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
            start_time: NaiveTime::from_hms_opt(12, 30, 0).unwrap(),
            end_time: Some(NaiveTime::from_hms_opt(14, 30, 0).unwrap()),
            capacity: 50,
            booked_count: 0,
            price_override_cents: None,
            is_active: true,
        };
        store.insert_slot(capacity_slot.clone());

        let service = ReservationService::new(
            store.clone(),
            store.clone(),
            ReservationPolicy::default(),
        );
        Fixture {
            service,
            store,
            listing,
            seated_slot,
            capacity_slot,
            seats,
        }
    }

    fn user() -> UserContext {
        UserContext::new(Uuid::new_v4())
    }

    #[tokio::test]
    async fn holds_are_rejected_on_seat_mapped_slots() {
        let fx = fixture();
        let err = fx
            .service
            .create_hold(user(), fx.seated_slot.id, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn seat_locks_are_rejected_on_capacity_slots() {
        let fx = fixture();
        let err = fx
            .service
            .lock_seats(user(), fx.capacity_slot.id, &[fx.seats[0].id])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn foreign_seats_are_rejected_before_locking() {
        let fx = fixture();
        let err = fx
            .service
            .lock_seats(user(), fx.seated_slot.id, &[Uuid::new_v4()])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert!(fx
            .store
            .seat_claims(fx.seated_slot.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn seat_booking_prices_from_seats_and_books_them() {
        let fx = fixture();
        let u = user();
        let seat_ids = vec![fx.seats[0].id, fx.seats[1].id];

        fx.service
            .lock_seats(u, fx.seated_slot.id, &seat_ids)
            .await
            .unwrap();
        let booking = fx
            .service
            .confirm_booking(
                u,
                ConfirmBookingRequest {
                    listing_id: fx.listing.id,
                    time_slot_id: fx.seated_slot.id,
                    seat_ids: seat_ids.clone(),
                    quantity: None,
                    notes: None,
                },
            )
            .await
            .unwrap();

        // Two platinum seats at 50_000 each, listing price ignored.
        assert_eq!(booking.total_amount_cents, 100_000);
        assert_eq!(booking.quantity, 2);
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.seat_ids, seat_ids);

        let map = fx.service.seat_map(fx.seated_slot.id).await.unwrap();
        let booked: usize = map
            .rows
            .iter()
            .flat_map(|r| &r.seats)
            .filter(|s| s.status == ClaimStatus::Booked)
            .count();
        assert_eq!(booked, 2);
    }

    #[tokio::test]
    async fn confirm_without_claim_is_an_expired_claim_error() {
        let fx = fixture();
        let err = fx
            .service
            .confirm_booking(
                user(),
                ConfirmBookingRequest {
                    listing_id: fx.listing.id,
                    time_slot_id: fx.capacity_slot.id,
                    seat_ids: vec![],
                    quantity: Some(2),
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ExpiredClaim(_)));
    }

    #[tokio::test]
    async fn capacity_booking_consumes_hold_and_keeps_counter() {
        let fx = fixture();
        let u = user();

        let grant = fx
            .service
            .create_hold(u, fx.capacity_slot.id, 3)
            .await
            .unwrap();
        assert_eq!(grant.remaining_capacity, 47);
        assert_eq!(fx.store.booked_count(fx.capacity_slot.id), Some(3));

        let booking = fx
            .service
            .confirm_booking(
                u,
                ConfirmBookingRequest {
                    listing_id: fx.listing.id,
                    time_slot_id: fx.capacity_slot.id,
                    seat_ids: vec![],
                    quantity: Some(3),
                    notes: Some("window table".to_string()),
                },
            )
            .await
            .unwrap();

        // Listing base price times quantity; the hold's increment persists.
        assert_eq!(booking.total_amount_cents, 90_000);
        assert_eq!(fx.store.booked_count(fx.capacity_slot.id), Some(3));

        // The hold is gone: a second confirm has no claim to consume.
        let err = fx
            .service
            .confirm_booking(
                u,
                ConfirmBookingRequest {
                    listing_id: fx.listing.id,
                    time_slot_id: fx.capacity_slot.id,
                    seat_ids: vec![],
                    quantity: Some(3),
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ExpiredClaim(_)));
    }

    #[tokio::test]
    async fn seat_ids_on_capacity_slot_are_a_validation_error() {
        let fx = fixture();
        let err = fx
            .service
            .confirm_booking(
                user(),
                ConfirmBookingRequest {
                    listing_id: fx.listing.id,
                    time_slot_id: fx.capacity_slot.id,
                    seat_ids: vec![fx.seats[0].id],
                    quantity: None,
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn list_bookings_paginates_newest_first() {
        let fx = fixture();
        let u = user();

        for _ in 0..3 {
            fx.service.create_hold(u, fx.capacity_slot.id, 1).await.unwrap();
            fx.service
                .confirm_booking(
                    u,
                    ConfirmBookingRequest {
                        listing_id: fx.listing.id,
                        time_slot_id: fx.capacity_slot.id,
                        seat_ids: vec![],
                        quantity: None,
                        notes: None,
                    },
                )
                .await
                .unwrap();
        }

        let (page, total) = fx.service.list_bookings(u, None, 1, 2).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 2);
        assert!(page[0].created_at >= page[1].created_at);

        let (rest, _) = fx.service.list_bookings(u, None, 2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
    }
}
