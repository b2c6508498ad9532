use serde::Serialize;
use tracing::debug;

use crate::error::EngagementError;
use crate::snapshot::{AuthoredSummary, EngagementSnapshot, StatsStore};
use crate::viewer::Viewer;

/// Fixed category count the exploration progress is measured against.
pub const TOTAL_CATEGORIES: u64 = 6;

const TOP_CATEGORY_PLACEHOLDER: &str = "Exploring";

/// `round(part / whole * 100)`, rounding halves up. Zero when `whole` is zero.
pub fn percent(part: u64, whole: u64) -> u64 {
    if whole == 0 {
        return 0;
    }
    (part * 200 + whole) / (whole * 2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum EngagementLevel {
    Beginner,
    Regular,
    Active,
    Expert,
}

impl EngagementLevel {
    /// Tier for a weighted engagement score. Lower bounds are inclusive.
    pub fn from_score(score: u64) -> Self {
        match score {
            50.. => Self::Expert,
            25.. => Self::Active,
            10.. => Self::Regular,
            _ => Self::Beginner,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherStats {
    pub total_posts: u64,
    pub blog_posts: u64,
    pub social_posts: u64,
    pub total_views: u64,
    pub total_likes: u64,
    /// Likes per post as a percentage. Not capped at 100.
    pub engagement_rate: u64,
}

impl From<AuthoredSummary> for TeacherStats {
    fn from(s: AuthoredSummary) -> Self {
        Self {
            total_posts: s.total_posts,
            blog_posts: s.blog_posts,
            social_posts: s.social_posts,
            total_views: s.total_views,
            total_likes: s.total_likes,
            engagement_rate: percent(s.total_likes, s.total_posts),
        }
    }
}

/// Student dashboard numbers. The "this week" fields are heuristic estimates
/// over lifetime counts; there is no time-windowed tracking behind them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStats {
    pub read_posts: u64,
    pub liked_posts: u64,
    pub saved_posts: u64,
    pub comments_made: u64,
    pub learning_streak: u64,
    pub top_category: &'static str,
    pub weekly_activity: u64,
    pub likes_this_week: u64,
    pub saves_this_week: u64,
    pub comments_this_week: u64,
    pub categories_explored: u64,
    pub total_categories: u64,
    pub exploration_progress: u64,
    pub engagement_level: EngagementLevel,
}

impl StudentStats {
    pub fn derive(snap: &EngagementSnapshot) -> Self {
        let EngagementSnapshot { liked, saved, comments } = *snap;
        let categories_explored = (liked / 2 + 1).min(TOTAL_CATEGORIES);

        Self {
            // likes stand in for reads
            read_posts: liked,
            liked_posts: liked,
            saved_posts: saved,
            comments_made: comments,
            learning_streak: ((liked + saved) / 3 + 1).min(7),
            top_category: TOP_CATEGORY_PLACEHOLDER,
            weekly_activity: (liked + saved).min(20),
            likes_this_week: (liked / 2).min(10),
            saves_this_week: (saved / 2).min(5),
            comments_this_week: comments.min(3),
            categories_explored,
            total_categories: TOTAL_CATEGORIES,
            exploration_progress: percent(categories_explored, TOTAL_CATEGORIES),
            engagement_level: EngagementLevel::from_score(snap.weighted()),
        }
    }
}

/// Authoring totals for a teacher. Any store failure fails the whole call.
pub fn teacher_stats<S: StatsStore + ?Sized>(
    store: &S,
    viewer: &Viewer,
) -> Result<TeacherStats, EngagementError> {
    let author_id = viewer.require_teacher("Only teachers can access these stats")?;
    let summary = store.authored_summary(author_id)?;
    debug!("Teacher stats for {}: {:?}", author_id, summary);
    Ok(TeacherStats::from(summary))
}

/// Engagement estimates for a student. Individual counts are best-effort.
pub fn student_stats<S: StatsStore + ?Sized>(
    store: &S,
    viewer: &Viewer,
) -> Result<StudentStats, EngagementError> {
    let user_id = viewer.require_student("Only students can access these stats")?;
    let snap = EngagementSnapshot::capture(store, user_id);
    debug!("Student stats for {}: {:?}", user_id, snap);
    Ok(StudentStats::derive(&snap))
}
