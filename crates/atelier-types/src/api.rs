use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Category, Comment, Post, PostType, Role, User};

// -- JWT Claims --

/// Token claims. Role is carried for clients; the server re-reads it from the
/// store on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub success: bool,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

// -- Media --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub image_url: String,
    pub public_id: String,
}

// -- Posts --

#[derive(Debug, Default, Deserialize)]
pub struct PostQuery {
    #[serde(rename = "type")]
    pub post_type: Option<String>,
    pub category: Option<i64>,
    pub author: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub success: bool,
    pub message: &'static str,
    pub post: Post,
}

#[derive(Debug, Serialize)]
pub struct PostsResponse {
    pub success: bool,
    pub posts: Vec<Post>,
}

#[derive(Debug, Serialize)]
pub struct DeletePostResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Fields of a post creation form, after multipart decoding.
#[derive(Debug, Default)]
pub struct NewPostForm {
    pub title: String,
    pub content: String,
    pub category_id: Option<i64>,
    pub post_type: PostType,
}

// -- Interactions --

#[derive(Debug, Serialize)]
pub struct LikeToggleResponse {
    pub success: bool,
    pub liked: bool,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SaveToggleResponse {
    pub success: bool,
    pub saved: bool,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatusResponse {
    pub success: bool,
    pub liked: bool,
    pub like_count: u64,
}

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub success: bool,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub success: bool,
    pub comment: Comment,
}

#[derive(Debug, Serialize)]
pub struct CommentsResponse {
    pub success: bool,
    pub comments: Vec<Comment>,
}

// -- Categories --

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub success: bool,
    pub categories: Vec<Category>,
}

// -- Statistics --

#[derive(Debug, Serialize)]
pub struct StatsResponse<T> {
    pub success: bool,
    pub stats: T,
}
