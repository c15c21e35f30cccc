use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a slot's inventory is claimed. Derived from the presence of a
/// seating layout, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationMode {
    /// Individual seats are locked and booked (cinemas, stadiums).
    Seated,
    /// Undifferentiated capacity units are held and booked (restaurants,
    /// general admission).
    Capacity,
}

/// A time-bound bookable instance of a listing: a showtime or a
/// reservation window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    pub listing_id: Uuid,
    /// Seating layout attached to this slot, if any. Present means
    /// seat-based booking; absent means capacity-based booking.
    pub layout_id: Option<Uuid>,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: Option<NaiveTime>,
    pub capacity: i32,
    /// Confirmed bookings plus live capacity holds. Only mutated inside a
    /// store critical section.
    pub booked_count: i32,
    pub price_override_cents: Option<i32>,
    pub is_active: bool,
}

impl Slot {
    pub fn reservation_mode(&self) -> ReservationMode {
        if self.layout_id.is_some() {
            ReservationMode::Seated
        } else {
            ReservationMode::Capacity
        }
    }

    pub fn remaining_capacity(&self) -> i32 {
        (self.capacity - self.booked_count).max(0)
    }
}
