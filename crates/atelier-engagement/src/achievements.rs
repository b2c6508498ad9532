use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::EngagementError;
use crate::snapshot::{EngagementSnapshot, StatsStore};
use crate::stats::percent;
use crate::viewer::Viewer;

#[derive(Debug, Clone, Copy)]
enum Rule {
    AnyLike,
    AnySave,
    AnyComment,
    TotalAtLeast(u64),
}

impl Rule {
    fn holds(&self, snap: &EngagementSnapshot) -> bool {
        match *self {
            Rule::AnyLike => snap.liked > 0,
            Rule::AnySave => snap.saved > 0,
            Rule::AnyComment => snap.comments > 0,
            Rule::TotalAtLeast(n) => snap.total() >= n,
        }
    }
}

struct Achievement {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    icon: &'static str,
    rule: Rule,
}

static CATALOG: [Achievement; 6] = [
    Achievement {
        id: "first_like",
        name: "First Like",
        description: "Liked your first post",
        icon: "👍",
        rule: Rule::AnyLike,
    },
    Achievement {
        id: "first_save",
        name: "Bookmarker",
        description: "Saved your first post",
        icon: "📚",
        rule: Rule::AnySave,
    },
    Achievement {
        id: "first_comment",
        name: "Conversation Starter",
        description: "Left your first comment",
        icon: "💬",
        rule: Rule::AnyComment,
    },
    Achievement {
        id: "three_day_streak",
        name: "Learning Streak",
        description: "3 consecutive days of activity",
        icon: "🔥",
        rule: Rule::TotalAtLeast(3),
    },
    Achievement {
        id: "category_explorer",
        name: "Category Explorer",
        description: "Explored multiple categories",
        icon: "🧭",
        rule: Rule::TotalAtLeast(5),
    },
    Achievement {
        id: "active_learner",
        name: "Active Learner",
        description: "10+ total engagements",
        icon: "⭐",
        rule: Rule::TotalAtLeast(10),
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementStatus {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub unlocked: bool,
    pub icon: &'static str,
    /// Evaluation time for unlocked entries. Not an unlock history.
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementReport {
    pub success: bool,
    pub achievements: Vec<AchievementStatus>,
    pub unlocked_count: u64,
    pub total_achievements: u64,
    pub progress: u64,
}

/// Annotates the whole catalog against `snap`. Locked entries are kept.
pub fn evaluate(snap: &EngagementSnapshot, now: DateTime<Utc>) -> AchievementReport {
    let achievements: Vec<AchievementStatus> = CATALOG
        .iter()
        .map(|a| {
            let unlocked = a.rule.holds(snap);
            AchievementStatus {
                id: a.id,
                name: a.name,
                description: a.description,
                unlocked,
                icon: a.icon,
                date: unlocked.then_some(now),
            }
        })
        .collect();

    let unlocked_count = achievements.iter().filter(|a| a.unlocked).count() as u64;
    let total_achievements = achievements.len() as u64;

    AchievementReport {
        success: true,
        achievements,
        unlocked_count,
        total_achievements,
        progress: percent(unlocked_count, total_achievements),
    }
}

/// Student-only achievement list, from a best-effort snapshot.
pub fn student_achievements<S: StatsStore + ?Sized>(
    store: &S,
    viewer: &Viewer,
    now: DateTime<Utc>,
) -> Result<AchievementReport, EngagementError> {
    let user_id = viewer.require_student("Only students can access achievements")?;
    let snap = EngagementSnapshot::capture(store, user_id);
    let report = evaluate(&snap, now);
    debug!(
        "Achievements for {}: {}/{} unlocked",
        user_id, report.unlocked_count, report.total_achievements
    );
    Ok(report)
}
