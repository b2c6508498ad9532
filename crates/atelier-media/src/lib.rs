//! Image hosting for post attachments.
//!
//! The API layer only talks to [`MediaStore`]; the Cloudinary client is the
//! production implementation and [`DisabledMediaStore`] stands in when no
//! credentials are configured.

pub mod cloudinary;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use cloudinary::{CloudinaryConfig, CloudinaryStore};

/// 5 MiB upload limit for images
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Media storage is not configured")]
    Disabled,

    #[error("Only image files are allowed!")]
    NotAnImage,

    #[error("Image exceeds {MAX_IMAGE_SIZE} bytes")]
    TooLarge,

    #[error("Media host rejected request: {0}")]
    Rejected(String),

    #[error("Media host unreachable: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, data: Bytes, mime: &str) -> Result<UploadedImage, MediaError>;

    async fn destroy(&self, public_id: &str) -> Result<(), MediaError>;
}

/// Checks MIME type and size before anything is sent to the host.
pub fn validate_image(mime: &str, len: usize) -> Result<(), MediaError> {
    if !mime.starts_with("image/") {
        return Err(MediaError::NotAnImage);
    }
    if len == 0 {
        return Err(MediaError::Rejected("empty image".into()));
    }
    if len > MAX_IMAGE_SIZE {
        return Err(MediaError::TooLarge);
    }
    Ok(())
}

/// Refuses every operation. Used when no media host is configured.
pub struct DisabledMediaStore;

#[async_trait]
impl MediaStore for DisabledMediaStore {
    async fn upload(&self, _data: Bytes, _mime: &str) -> Result<UploadedImage, MediaError> {
        Err(MediaError::Disabled)
    }

    async fn destroy(&self, _public_id: &str) -> Result<(), MediaError> {
        Err(MediaError::Disabled)
    }
}
