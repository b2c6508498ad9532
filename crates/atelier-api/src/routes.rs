use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
};

use atelier_media::MAX_IMAGE_SIZE;
use atelier_types::api::HealthResponse;

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{comments, interactions, posts, stats};

/// Headroom over the image limit for the other form fields.
const MAX_BODY_SIZE: usize = MAX_IMAGE_SIZE + 1024 * 1024;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: "Atelier is running!",
    })
}

/// All `/api` routes. Paths shared by a public and a protected method get the
/// auth layer on the protected method only.
pub fn api_router(state: AppState) -> Router {
    let authed = middleware::from_fn_with_state(state.clone(), require_auth);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/me", get(auth::me).route_layer(authed.clone()))
        .route("/api/upload", post(posts::upload_image).route_layer(authed.clone()))
        .route("/api/categories", get(posts::list_categories))
        .route(
            "/api/posts",
            get(posts::list_posts).merge(post(posts::create_post).route_layer(authed.clone())),
        )
        .route("/api/my-posts", get(posts::my_posts).route_layer(authed.clone()))
        .route("/api/posts/{id}", delete(posts::delete_post).route_layer(authed.clone()))
        .route("/api/posts/{id}/view", post(posts::record_view))
        .route(
            "/api/posts/{id}/like",
            post(interactions::toggle_like).route_layer(authed.clone()),
        )
        .route(
            "/api/posts/{id}/like-status",
            get(interactions::like_status).route_layer(authed.clone()),
        )
        .route(
            "/api/posts/{id}/save",
            post(interactions::toggle_save).route_layer(authed.clone()),
        )
        .route(
            "/api/posts/{id}/comments",
            get(comments::list_comments)
                .merge(post(comments::create_comment).route_layer(authed.clone())),
        )
        .route(
            "/api/teacher-stats",
            get(stats::teacher_stats).route_layer(authed.clone()),
        )
        .route(
            "/api/student-stats",
            get(stats::student_stats).route_layer(authed.clone()),
        )
        .route(
            "/api/student-achievements",
            get(stats::student_achievements).route_layer(authed),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state)
}
