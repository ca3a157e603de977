//! Parent profile and co-parent link.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a parent profile.
pub type ProfileId = Uuid;

/// A parent account as seen by the scheduling core.
///
/// Authentication and roles live outside the core; only the display name
/// and the co-parent link matter here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    /// Shown to the other parent in notification text.
    pub display_name: String,
    /// The linked co-parent, when the two accounts are connected.
    pub co_parent_id: Option<ProfileId>,
}

impl Profile {
    /// Creates an unlinked profile with a generated ID.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), display_name)
    }

    pub fn with_id(id: ProfileId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            co_parent_id: None,
        }
    }

    /// Returns whether `other` is this profile's linked co-parent.
    pub fn is_linked_to(&self, other: ProfileId) -> bool {
        self.co_parent_id == Some(other)
    }
}
