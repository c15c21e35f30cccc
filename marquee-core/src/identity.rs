use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated caller identity, as resolved by the identity collaborator.
/// Every lock/hold/booking mutation requires one; anonymous callers may
/// only read inventory state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserContext {
    pub user_id: Uuid,
}

impl UserContext {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}
