//! Engagement core: the like/save ledger contract, per-user statistics and
//! the achievement catalog.
//!
//! Everything here is computed on demand from raw counts. Nothing derived is
//! ever persisted, so two calls against an unchanged ledger give the same
//! answer.

pub mod achievements;
pub mod error;
pub mod ledger;
pub mod snapshot;
pub mod stats;
pub mod viewer;

pub use error::EngagementError;
pub use ledger::{InteractionKind, InteractionLedger, Toggle};
pub use snapshot::{EngagementSnapshot, StatsStore};
pub use viewer::Viewer;
