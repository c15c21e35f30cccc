use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Completed => "COMPLETED",
        }
    }
}

/// The durable outcome of a successful reservation. Cancellation is a
/// status transition, never a deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub listing_id: Uuid,
    pub slot_id: Uuid,
    pub booking_number: String,
    pub quantity: i32,
    pub total_amount_cents: i32,
    pub currency: String,
    /// Booked seats for seat-based bookings; empty on the capacity path.
    pub seat_ids: Vec<Uuid>,
    pub status: BookingStatus,
    pub event_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn is_cancellable(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }
}

/// Which claim a booking commit consumes.
#[derive(Debug, Clone)]
pub enum ClaimKind {
    /// Seats previously locked by the user; they transition to booked.
    Seats(Vec<Uuid>),
    /// The user's active capacity hold; it is consumed and its counter
    /// increment becomes permanent.
    Capacity,
}

/// Everything the store needs to commit a booking atomically: claim
/// consumption, counter updates, number allocation and the insert happen
/// together or not at all.
#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub user_id: Uuid,
    pub listing_id: Uuid,
    pub slot_id: Uuid,
    pub claim: ClaimKind,
    pub quantity: i32,
    pub total_amount_cents: i32,
    pub currency: String,
    pub event_date: NaiveDate,
    pub notes: Option<String>,
}

/// Confirmation request as received from the client. On the capacity path
/// the active hold is the authoritative quantity; a supplied `quantity` is
/// cross-checked against it, never trusted on its own.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmBookingRequest {
    pub listing_id: Uuid,
    pub time_slot_id: Uuid,
    #[serde(default)]
    pub seat_ids: Vec<Uuid>,
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Render a day-scoped booking reference: `PREFIX-YYYYMMDD-NNN`. The
/// ordinal is unique within the calendar day and zero-padded to three
/// digits (wider once a day passes 999 bookings).
pub fn format_booking_number(prefix: &str, date: NaiveDate, ordinal: u32) -> String {
    format!("{}-{}-{:03}", prefix, date.format("%Y%m%d"), ordinal)
}
