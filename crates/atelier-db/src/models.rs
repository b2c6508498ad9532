//! Database row types. These map directly to SQLite rows and are kept apart
//! from the atelier-types API models; conversions live here.

use atelier_types::models::{Category, Comment, Post, PostType, Role, User};
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

pub struct PostRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category_id: Option<i64>,
    pub author_id: String,
    pub image_url: Option<String>,
    pub image_public_id: Option<String>,
    pub post_type: String,
    pub view_count: i64,
    pub created_at: String,
    pub author_name: Option<String>,
    pub category_name: Option<String>,
}

pub struct CommentRow {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub username: Option<String>,
    pub content: String,
    pub created_at: String,
}

pub struct CategoryRow {
    pub id: i64,
    pub name: String,
}

/// Insert payload for a post.
pub struct NewPost {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category_id: Option<i64>,
    pub author_id: String,
    pub image_url: Option<String>,
    pub image_public_id: Option<String>,
    pub post_type: PostType,
}

/// Optional filters for listing posts. All set filters must match.
#[derive(Debug, Default, Clone)]
pub struct PostFilter {
    pub post_type: Option<PostType>,
    pub category_id: Option<i64>,
    pub author_username: Option<String>,
}

fn parse_uuid(raw: &str, field: &str, row_id: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}' on row '{}': {}", field, raw, row_id, e);
        Uuid::default()
    })
}

/// Timestamps are written as RFC 3339; rows from older tooling may carry
/// SQLite's plain "YYYY-MM-DD HH:MM:SS".
pub(crate) fn parse_timestamp(raw: &str, row_id: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on row '{}': {}", raw, row_id, e);
            DateTime::default()
        })
}

impl UserRow {
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or_else(|e| {
            warn!("Corrupt role on user '{}': {}", self.id, e);
            Role::Student
        })
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let role = row.role();
        User {
            id: parse_uuid(&row.id, "id", &row.id),
            username: row.username,
            email: row.email,
            role,
        }
    }
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        let post_type = row.post_type.parse().unwrap_or_else(|e| {
            warn!("Corrupt post_type on post '{}': {}", row.id, e);
            PostType::Blog
        });
        Post {
            id: parse_uuid(&row.id, "id", &row.id),
            author_id: parse_uuid(&row.author_id, "author_id", &row.id),
            created_at: parse_timestamp(&row.created_at, &row.id),
            title: row.title,
            content: row.content,
            category_id: row.category_id,
            image_url: row.image_url,
            image_public_id: row.image_public_id,
            post_type,
            view_count: row.view_count,
            author_name: row.author_name,
            category_name: row.category_name,
        }
    }
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: parse_uuid(&row.id, "id", &row.id),
            post_id: parse_uuid(&row.post_id, "post_id", &row.id),
            user_id: parse_uuid(&row.user_id, "user_id", &row.id),
            created_at: parse_timestamp(&row.created_at, &row.id),
            username: row.username,
            content: row.content,
        }
    }
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
        }
    }
}
