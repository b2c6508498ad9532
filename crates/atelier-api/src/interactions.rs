use axum::{
    Extension, Json,
    extract::{Path, State},
};
use tracing::debug;
use uuid::Uuid;

use atelier_engagement::{InteractionKind, InteractionLedger};
use atelier_types::api::{LikeStatusResponse, LikeToggleResponse, SaveToggleResponse};
use atelier_types::models::User;

use crate::auth::{AppState, run_blocking};
use crate::error::{ApiError, parse_post_id};

async fn toggle(
    state: &AppState,
    kind: InteractionKind,
    user: &User,
    post_id: Uuid,
) -> Result<bool, ApiError> {
    let user_id = user.id;
    let toggle = run_blocking(state, move |s| Ok(s.db.toggle(kind, user_id, post_id)?)).await?;
    debug!(
        "{} toggled {:?} on {} -> {}",
        user.username, kind, post_id, toggle.active
    );
    Ok(toggle.active)
}

pub async fn toggle_like(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<LikeToggleResponse>, ApiError> {
    let post_id = parse_post_id(&post_id)?;
    let liked = toggle(&state, InteractionKind::Like, &user, post_id).await?;

    Ok(Json(LikeToggleResponse {
        success: true,
        liked,
        message: if liked { "Post liked" } else { "Post unliked" },
    }))
}

pub async fn toggle_save(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<SaveToggleResponse>, ApiError> {
    let post_id = parse_post_id(&post_id)?;
    let saved = toggle(&state, InteractionKind::Save, &user, post_id).await?;

    Ok(Json(SaveToggleResponse {
        success: true,
        saved,
        message: if saved { "Post saved" } else { "Post unsaved" },
    }))
}

pub async fn like_status(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<LikeStatusResponse>, ApiError> {
    let post_id = parse_post_id(&post_id)?;
    let user_id = user.id;
    let (liked, like_count) = run_blocking(&state, move |s| {
        let liked = s.db.is_active(InteractionKind::Like, user_id, post_id)?;
        let count = s.db.count_for_post(InteractionKind::Like, post_id)?;
        Ok((liked, count))
    })
    .await?;

    Ok(Json(LikeStatusResponse {
        success: true,
        liked,
        like_count,
    }))
}
