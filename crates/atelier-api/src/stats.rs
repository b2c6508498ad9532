use axum::{Extension, Json, extract::State};

use atelier_engagement::Viewer;
use atelier_engagement::achievements::{self, AchievementReport};
use atelier_engagement::stats::{self, StudentStats, TeacherStats};
use atelier_types::api::StatsResponse;
use atelier_types::models::User;

use crate::auth::{AppState, run_blocking};
use crate::error::ApiError;

pub async fn teacher_stats(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<StatsResponse<TeacherStats>>, ApiError> {
    let viewer = Viewer::from(&user);
    let stats = run_blocking(&state, move |s| Ok(stats::teacher_stats(&s.db, &viewer)?)).await?;

    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}

pub async fn student_stats(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<StatsResponse<StudentStats>>, ApiError> {
    let viewer = Viewer::from(&user);
    let stats = run_blocking(&state, move |s| Ok(stats::student_stats(&s.db, &viewer)?)).await?;

    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}

pub async fn student_achievements(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<AchievementReport>, ApiError> {
    let viewer = Viewer::from(&user);
    let now = chrono::Utc::now();
    let report = run_blocking(&state, move |s| {
        Ok(achievements::student_achievements(&s.db, &viewer, now)?)
    })
    .await?;

    Ok(Json(report))
}
