use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Listing lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingStatus {
    Active,
    Draft,
    Archived,
}

/// A bookable catalog entry: a film run, a restaurant, a one-off event.
/// The reservation engine only reads pricing and capacity from it; catalog
/// CRUD lives elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub title: String,
    pub city: Option<String>,
    /// Base unit price in minor units; a listing may be priced purely
    /// through its seats, in which case this is None.
    pub price_cents: Option<i32>,
    pub currency: String,
    pub total_capacity: Option<i32>,
    pub booked_count: i32,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    pub fn new(title: impl Into<String>, price_cents: Option<i32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            city: None,
            price_cents,
            currency: "INR".to_string(),
            total_capacity: None,
            booked_count: 0,
            status: ListingStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ListingStatus::Active
    }
}
