use serde::Serialize;
use uuid::Uuid;

use crate::error::EngagementError;

/// Which fact namespace a toggle touches. Likes and saves never share rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Like,
    Save,
}

impl InteractionKind {
    /// Backing table for this kind of fact.
    pub fn table(&self) -> &'static str {
        match self {
            Self::Like => "likes",
            Self::Save => "saved_posts",
        }
    }
}

/// Outcome of a toggle: `active` is the state *after* the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toggle {
    pub active: bool,
}

/// Source of truth for like/save facts keyed by (user, post).
///
/// `toggle` flips presence: an existing fact is removed, a missing one is
/// inserted. Calling it twice restores the original state. Implementations
/// must never hold two facts of the same kind for one (user, post) pair.
pub trait InteractionLedger {
    fn toggle(
        &self,
        kind: InteractionKind,
        user_id: Uuid,
        post_id: Uuid,
    ) -> Result<Toggle, EngagementError>;

    fn is_active(
        &self,
        kind: InteractionKind,
        user_id: Uuid,
        post_id: Uuid,
    ) -> Result<bool, EngagementError>;

    /// Number of facts of `kind` on a post, across all users.
    fn count_for_post(&self, kind: InteractionKind, post_id: Uuid)
    -> Result<u64, EngagementError>;
}
