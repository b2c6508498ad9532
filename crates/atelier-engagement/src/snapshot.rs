use anyhow::Result;
use tracing::warn;
use uuid::Uuid;

use crate::ledger::InteractionKind;

/// Post totals for one author, as read from the post catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthoredSummary {
    pub total_posts: u64,
    pub blog_posts: u64,
    pub social_posts: u64,
    pub total_views: u64,
    /// Likes received across every post the author owns.
    pub total_likes: u64,
}

/// Read-only counting queries the aggregator needs from the store.
pub trait StatsStore {
    /// Facts of `kind` created by `user_id`.
    fn count_by_user(&self, kind: InteractionKind, user_id: Uuid) -> Result<u64>;

    fn count_comments_by_user(&self, user_id: Uuid) -> Result<u64>;

    fn authored_summary(&self, author_id: Uuid) -> Result<AuthoredSummary>;
}

/// Raw engagement counts for one user, taken once per call.
///
/// Every derived field of a statistics or achievements response is computed
/// from the same snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngagementSnapshot {
    pub liked: u64,
    pub saved: u64,
    pub comments: u64,
}

impl EngagementSnapshot {
    pub fn new(liked: u64, saved: u64, comments: u64) -> Self {
        Self { liked, saved, comments }
    }

    /// Reads the three counts for `user_id`. A failing count is logged and
    /// treated as zero; the other counts are still taken.
    pub fn capture<S: StatsStore + ?Sized>(store: &S, user_id: Uuid) -> Self {
        let liked = store
            .count_by_user(InteractionKind::Like, user_id)
            .unwrap_or_else(|e| {
                warn!("Error counting likes for {}: {:#}", user_id, e);
                0
            });
        let saved = store
            .count_by_user(InteractionKind::Save, user_id)
            .unwrap_or_else(|e| {
                warn!("Error counting saves for {}: {:#}", user_id, e);
                0
            });
        let comments = store.count_comments_by_user(user_id).unwrap_or_else(|e| {
            warn!("Error counting comments for {}: {:#}", user_id, e);
            0
        });

        Self { liked, saved, comments }
    }

    /// Plain sum, used by the achievement rules.
    pub fn total(&self) -> u64 {
        self.liked + self.saved + self.comments
    }

    /// Comments count double toward the engagement level.
    pub fn weighted(&self) -> u64 {
        self.liked + self.saved + self.comments * 2
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// In-memory store; `None` makes that count fail.
    #[derive(Default)]
    pub struct FakeStore {
        pub likes: Option<u64>,
        pub saves: Option<u64>,
        pub comments: Option<u64>,
        pub summary: Option<AuthoredSummary>,
    }

    impl FakeStore {
        pub fn counts(likes: u64, saves: u64, comments: u64) -> Self {
            Self {
                likes: Some(likes),
                saves: Some(saves),
                comments: Some(comments),
                summary: Some(AuthoredSummary::default()),
            }
        }
    }

    impl StatsStore for FakeStore {
        fn count_by_user(&self, kind: InteractionKind, _user_id: Uuid) -> Result<u64> {
            let count = match kind {
                InteractionKind::Like => self.likes,
                InteractionKind::Save => self.saves,
            };
            count.ok_or_else(|| anyhow::anyhow!("no such table: {}", kind.table()))
        }

        fn count_comments_by_user(&self, _user_id: Uuid) -> Result<u64> {
            self.comments.ok_or_else(|| anyhow::anyhow!("no such table: comments"))
        }

        fn authored_summary(&self, _author_id: Uuid) -> Result<AuthoredSummary> {
            self.summary.ok_or_else(|| anyhow::anyhow!("database is locked"))
        }
    }

    #[test]
    fn capture_reads_all_counts() {
        let store = FakeStore::counts(4, 2, 3);
        let snap = EngagementSnapshot::capture(&store, Uuid::new_v4());
        assert_eq!(snap, EngagementSnapshot::new(4, 2, 3));
        assert_eq!(snap.total(), 9);
        assert_eq!(snap.weighted(), 12);
    }

    #[test]
    fn failing_count_degrades_to_zero_independently() {
        let store = FakeStore {
            likes: Some(5),
            saves: None,
            comments: Some(1),
            summary: None,
        };
        let snap = EngagementSnapshot::capture(&store, Uuid::new_v4());
        assert_eq!(snap, EngagementSnapshot::new(5, 0, 1));
    }
}
