pub mod identity;
pub mod repository;

use uuid::Uuid;

/// Engine-wide error taxonomy. Conflicts and validation failures are typed
/// results carrying enough detail for the caller to re-offer a choice;
/// infrastructure faults surface as `Storage` and never leave partial
/// inventory state behind.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    /// One or more requested seats are booked or locked by another user.
    #[error("{} seat(s) unavailable", unavailable.len())]
    SeatConflict { unavailable: Vec<Uuid> },

    /// Not enough undifferentiated capacity left in the slot.
    #[error("Insufficient capacity: requested {requested}, available {available}")]
    CapacityConflict { requested: i32, available: i32 },

    /// Confirmation attempted against a lock or hold that is missing or
    /// past its deadline. Distinct from the conflicts above so clients can
    /// route the user back to selection instead of retrying.
    #[error("Claim missing or expired: {0}")]
    ExpiredClaim(String),

    #[error("Booking number allocation failed: {0}")]
    SequenceGeneration(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn not_found(what: &str) -> Self {
        EngineError::NotFound(what.to_string())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }
}
