use marquee_domain::{Listing, Seat, Slot};

/// Computes the authoritative price of a reservation request.
///
/// Strict precedence, first match wins, no blending across tiers:
/// 1. explicit seats: sum of per-seat category prices (quantity ignored);
/// 2. slot price override: override times quantity;
/// 3. listing base price times quantity (0 when the listing has no price).
pub struct PriceResolver;

impl PriceResolver {
    pub fn resolve(seats: &[Seat], quantity: i32, slot: &Slot, listing: &Listing) -> i32 {
        if !seats.is_empty() {
            return seats.iter().map(|s| s.price_cents).sum();
        }
        if let Some(override_cents) = slot.price_override_cents {
            return override_cents * quantity;
        }
        listing.price_cents.unwrap_or(0) * quantity
    }
}
