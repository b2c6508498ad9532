use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use bytes::Bytes;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tracing::{info, warn};

use crate::{MediaError, MediaStore, UploadedImage, validate_image};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";
const FOLDER: &str = "fashion-hub";
/// Fit within 800x600, automatic quality, re-encoded as JPEG.
const TRANSFORMATION: &str = "c_limit,h_600,w_800/q_auto/f_jpg";

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

pub struct CloudinaryStore {
    config: CloudinaryConfig,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct UploadReply {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyReply {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorReply {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig) -> Self {
        info!("Media store: Cloudinary cloud '{}'", config.cloud_name);
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/{}/image/{}", API_BASE, self.config.cloud_name, action)
    }

    /// Signs `params`, adds `api_key`, `signature` and the unsigned `file`
    /// field, and posts everything as a form.
    async fn signed_post(
        &self,
        action: &str,
        mut params: Vec<(&'static str, String)>,
        file: Option<String>,
    ) -> Result<reqwest::Response, MediaError> {
        let signature = sign(&params, &self.config.api_secret);
        params.push(("api_key", self.config.api_key.clone()));
        params.push(("signature", signature));
        if let Some(file) = file {
            params.push(("file", file));
        }

        let resp = self.http.post(self.endpoint(action)).form(&params).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let message = match resp.json::<ErrorReply>().await {
                Ok(body) => body.error.message,
                Err(_) => status.to_string(),
            };
            return Err(MediaError::Rejected(message));
        }
        Ok(resp)
    }
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn upload(&self, data: Bytes, mime: &str) -> Result<UploadedImage, MediaError> {
        validate_image(mime, data.len())?;

        let data_uri = format!("data:{};base64,{}", mime, B64.encode(&data));
        let params = vec![
            ("folder", FOLDER.to_string()),
            ("timestamp", chrono::Utc::now().timestamp().to_string()),
            ("transformation", TRANSFORMATION.to_string()),
        ];

        let resp = self.signed_post("upload", params, Some(data_uri)).await?;

        let reply: UploadReply = resp.json().await?;
        info!("Uploaded image {} ({} bytes)", reply.public_id, data.len());
        Ok(UploadedImage {
            url: reply.secure_url,
            public_id: reply.public_id,
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<(), MediaError> {
        let params = vec![
            ("public_id", public_id.to_string()),
            ("timestamp", chrono::Utc::now().timestamp().to_string()),
        ];

        let reply: DestroyReply = self.signed_post("destroy", params, None).await?.json().await?;
        match reply.result.as_str() {
            "ok" => {
                info!("Destroyed image {}", public_id);
                Ok(())
            }
            other => {
                warn!("Destroy of {} returned '{}'", public_id, other);
                Err(MediaError::Rejected(other.to_string()))
            }
        }
    }
}

/// Request signature: SHA-1 hex of the non-empty params sorted by name,
/// joined as `k=v&k=v`, with the API secret appended.
fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}
