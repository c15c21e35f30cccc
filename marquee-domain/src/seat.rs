use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable seat definition within a seating layout. Not slot-specific:
/// the same physical seat serves every slot that uses its layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub id: Uuid,
    pub layout_id: Uuid,
    pub row_label: String,
    pub number: i32,
    /// Pricing tier, e.g. "platinum", "gold".
    pub category: String,
    pub price_cents: i32,
    pub is_aisle: bool,
    pub is_accessible: bool,
}

impl Seat {
    pub fn new(
        layout_id: Uuid,
        row_label: impl Into<String>,
        number: i32,
        category: impl Into<String>,
        price_cents: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            layout_id,
            row_label: row_label.into(),
            number,
            category: category.into(),
            price_cents,
            is_aisle: false,
            is_accessible: false,
        }
    }

    /// Human-readable label like "C3".
    pub fn label(&self) -> String {
        format!("{}{}", self.row_label, self.number)
    }
}
