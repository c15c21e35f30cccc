pub mod booking;
pub mod claim;
pub mod hold;
pub mod listing;
pub mod seat;
pub mod slot;
pub mod sweep;

pub use booking::{
    format_booking_number, Booking, BookingDraft, BookingStatus, ClaimKind, ConfirmBookingRequest,
};
pub use claim::{ClaimStatus, SeatClaim, SeatLockGrant};
pub use hold::{CapacityHold, HoldGrant};
pub use listing::{Listing, ListingStatus};
pub use seat::Seat;
pub use slot::{ReservationMode, Slot};
pub use sweep::SweepReport;
