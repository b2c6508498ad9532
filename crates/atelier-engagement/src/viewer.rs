use atelier_types::models::{Role, User};
use uuid::Uuid;

use crate::error::EngagementError;

/// Resolved caller, tagged by role. Built once at the request boundary so the
/// role-gated operations only ever match on the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Student(Uuid),
    Teacher(Uuid),
}

impl Viewer {
    pub fn new(id: Uuid, role: Role) -> Self {
        match role {
            Role::Student => Self::Student(id),
            Role::Teacher => Self::Teacher(id),
        }
    }

    /// Returns the student's id, or `Forbidden` with `reason`.
    pub fn require_student(&self, reason: &'static str) -> Result<Uuid, EngagementError> {
        match self {
            Self::Student(id) => Ok(*id),
            Self::Teacher(_) => Err(EngagementError::Forbidden(reason)),
        }
    }

    /// Returns the teacher's id, or `Forbidden` with `reason`.
    pub fn require_teacher(&self, reason: &'static str) -> Result<Uuid, EngagementError> {
        match self {
            Self::Teacher(id) => Ok(*id),
            Self::Student(_) => Err(EngagementError::Forbidden(reason)),
        }
    }
}

impl From<&User> for Viewer {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.role)
    }
}
