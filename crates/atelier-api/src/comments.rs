use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use atelier_engagement::EngagementError;
use atelier_types::api::{CommentResponse, CommentsResponse, CreateCommentRequest};
use atelier_types::models::{Comment, User};

use crate::auth::{AppState, run_blocking};
use crate::error::{ApiError, parse_post_id};

const MAX_COMMENT_LEN: usize = 2000;

pub async fn create_comment(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Extension(user): Extension<User>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post_id = parse_post_id(&post_id)?;
    let content = req.content.trim().to_string();
    if content.is_empty() || content.len() > MAX_COMMENT_LEN {
        return Err(ApiError::BadRequest(format!(
            "Comment must be 1-{} characters",
            MAX_COMMENT_LEN
        )));
    }

    let comment_id = Uuid::new_v4();
    let user_id = user.id;
    let row = run_blocking(&state, move |s| {
        Ok(s.db.insert_comment(
            &comment_id.to_string(),
            &post_id.to_string(),
            &user_id.to_string(),
            &content,
        )?)
    })
    .await?
    .ok_or(EngagementError::NotFound("Post"))?;

    info!("{} commented on {}", user.username, post_id);
    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            success: true,
            comment: Comment::from(row),
        }),
    ))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<CommentsResponse>, ApiError> {
    let post_id = parse_post_id(&post_id)?;
    let rows = run_blocking(&state, move |s| Ok(s.db.list_comments(&post_id.to_string())?))
        .await?
        .ok_or(EngagementError::NotFound("Post"))?;

    Ok(Json(CommentsResponse {
        success: true,
        comments: rows.into_iter().map(Comment::from).collect(),
    }))
}
