use axum::{
    Extension, Json,
    extract::{
        Multipart, Path, Query, State,
        multipart::{Field, MultipartError},
    },
    http::StatusCode,
    response::IntoResponse,
};
use bytes::Bytes;
use tracing::{error, info, warn};
use uuid::Uuid;

use atelier_db::models::{NewPost, PostFilter};
use atelier_engagement::EngagementError;
use atelier_media::validate_image;
use atelier_types::api::{
    CategoriesResponse, DeletePostResponse, NewPostForm, PostQuery, PostResponse, PostsResponse,
    UploadResponse, ViewResponse,
};
use atelier_types::models::{Category, Post, User};

use crate::auth::{AppState, run_blocking};
use crate::error::{ApiError, parse_post_id};

/// An image part that passed MIME and size checks.
struct ImagePart {
    data: Bytes,
    mime: String,
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::BadRequest(e.body_text())
    }
}

/// Reads a file part. Browsers send an empty part when no file was picked.
async fn read_image(field: Field<'_>) -> Result<Option<ImagePart>, ApiError> {
    let mime = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = field.bytes().await.map_err(multipart_error)?;
    if data.is_empty() {
        return Ok(None);
    }

    validate_image(&mime, data.len())?;
    Ok(Some(ImagePart { data, mime }))
}

async fn read_text(field: Field<'_>) -> Result<String, ApiError> {
    Ok(field.text().await.map_err(multipart_error)?.trim().to_string())
}

async fn read_post_form(
    mut multipart: Multipart,
) -> Result<(NewPostForm, Option<ImagePart>), ApiError> {
    let mut form = NewPostForm::default();
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => image = read_image(field).await?,
            "title" => form.title = read_text(field).await?,
            "content" => form.content = read_text(field).await?,
            "category_id" => {
                let raw = read_text(field).await?;
                form.category_id = if raw.is_empty() {
                    None
                } else {
                    Some(
                        raw.parse()
                            .map_err(|_| ApiError::BadRequest("Invalid category_id".into()))?,
                    )
                };
            }
            "post_type" => {
                let raw = read_text(field).await?;
                if !raw.is_empty() {
                    form.post_type = raw.parse().map_err(|_| {
                        ApiError::BadRequest("post_type must be 'blog' or 'social'".into())
                    })?;
                }
            }
            _ => {}
        }
    }

    Ok((form, image))
}

/// POST /api/upload: forwards a single `image` part to the media host.
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut image = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("image") {
            image = read_image(field).await?;
        }
    }
    let image = image.ok_or_else(|| ApiError::BadRequest("No image file provided".into()))?;

    let uploaded = state.media.upload(image.data, &image.mime).await?;
    info!("{} uploaded image {}", user.username, uploaded.public_id);

    Ok(Json(UploadResponse {
        success: true,
        image_url: uploaded.url,
        public_id: uploaded.public_id,
    }))
}

/// POST /api/posts. Multipart form with an optional `image` part.
/// Both roles may author posts.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let (form, image) = read_post_form(multipart).await?;

    if form.title.is_empty() || form.content.is_empty() {
        return Err(ApiError::BadRequest("Title and content are required".into()));
    }
    if let Some(category_id) = form.category_id {
        let known = run_blocking(&state, move |s| Ok(s.db.category_exists(category_id)?)).await?;
        if !known {
            return Err(ApiError::BadRequest("Unknown category".into()));
        }
    }

    info!(
        "User {} ({}) creating {} post",
        user.username, user.role, form.post_type
    );

    let uploaded = match image {
        Some(image) => Some(state.media.upload(image.data, &image.mime).await?),
        None => None,
    };

    let post_id = Uuid::new_v4().to_string();
    let new_post = NewPost {
        id: post_id.clone(),
        title: form.title,
        content: form.content,
        category_id: form.category_id,
        author_id: user.id.to_string(),
        image_url: uploaded.as_ref().map(|u| u.url.clone()),
        image_public_id: uploaded.as_ref().map(|u| u.public_id.clone()),
        post_type: form.post_type,
    };

    let inserted = run_blocking(&state, move |s| {
        s.db.insert_post(&new_post)?;
        Ok(s.db.get_post(&new_post.id)?)
    })
    .await;

    let row = match inserted {
        Ok(Some(row)) => row,
        Ok(None) => {
            error!("Post {} vanished right after insert", post_id);
            return Err(ApiError::Internal);
        }
        Err(e) => {
            // don't leave an orphaned image behind
            if let Some(u) = &uploaded {
                if let Err(me) = state.media.destroy(&u.public_id).await {
                    warn!("Could not delete image {}: {}", u.public_id, me);
                }
            }
            return Err(e);
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            success: true,
            message: "Post created successfully!",
            post: Post::from(row),
        }),
    ))
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostQuery>,
) -> Result<Json<PostsResponse>, ApiError> {
    let filter = PostFilter {
        // unknown types are ignored, not rejected
        post_type: query.post_type.and_then(|t| t.parse().ok()),
        category_id: query.category,
        author_username: query.author,
    };

    let rows = run_blocking(&state, move |s| Ok(s.db.list_posts(&filter)?)).await?;

    Ok(Json(PostsResponse {
        success: true,
        posts: rows.into_iter().map(Post::from).collect(),
    }))
}

pub async fn my_posts(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<PostsResponse>, ApiError> {
    let author_id = user.id.to_string();
    let rows = run_blocking(&state, move |s| Ok(s.db.list_posts_by_author(&author_id)?)).await?;

    Ok(Json(PostsResponse {
        success: true,
        posts: rows.into_iter().map(Post::from).collect(),
    }))
}

/// DELETE /api/posts/{id}, author only. Anyone else sees 404.
/// The hosted image is removed best-effort after the row is gone.
pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<DeletePostResponse>, ApiError> {
    let post_id = parse_post_id(&post_id)?;
    let author_id = user.id.to_string();
    let removed = run_blocking(&state, move |s| {
        Ok(s.db.delete_post_owned(&post_id.to_string(), &author_id)?)
    })
    .await?
    .ok_or(EngagementError::NotFound("Post"))?;

    if let Some(public_id) = removed.image_public_id.as_deref() {
        if let Err(e) = state.media.destroy(public_id).await {
            warn!("Could not delete image {} for post {}: {}", public_id, post_id, e);
        }
    }

    info!("{} deleted post {}", user.username, post_id);
    Ok(Json(DeletePostResponse {
        success: true,
        message: "Post deleted successfully",
    }))
}

/// POST /api/posts/{id}/view never fails the request, it only reports success.
pub async fn record_view(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Json<ViewResponse> {
    let Ok(post_id) = post_id.parse::<Uuid>() else {
        return Json(ViewResponse { success: false });
    };

    let result = run_blocking(&state, move |s| {
        Ok(s.db.increment_view_count(&post_id.to_string())?)
    })
    .await;

    let success = match result {
        Ok(found) => found,
        Err(e) => {
            warn!("View count error for {}: {}", post_id, e);
            false
        }
    };
    Json(ViewResponse { success })
}

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoriesResponse>, ApiError> {
    let rows = run_blocking(&state, |s| Ok(s.db.list_categories()?)).await?;

    Ok(Json(CategoriesResponse {
        success: true,
        categories: rows.into_iter().map(Category::from).collect(),
    }))
}
