//! Media host client
//!
//! Route handlers only see the `MediaUploader` trait: hand it an in-memory
//! file, get back a public URL. `CloudinaryUploader` is the production
//! implementation; tests plug in their own.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{multipart, Client};
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{error, info};

use crate::config::CloudinaryConfig;

/// A file received in a multipart request, held entirely in memory
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Multipart field the file arrived under (e.g. `gallery`, `education[2][logo]`)
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// How the media host should treat the upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    /// Let the host detect image or video
    Auto,
    Image,
    Video,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions {
    pub resource_type: ResourceType,
    pub folder: Option<&'static str>,
}

impl UploadOptions {
    pub const AUTO: Self = Self {
        resource_type: ResourceType::Auto,
        folder: None,
    };

    pub const fn image(folder: &'static str) -> Self {
        Self {
            resource_type: ResourceType::Image,
            folder: Some(folder),
        }
    }

    pub const fn video(folder: &'static str) -> Self {
        Self {
            resource_type: ResourceType::Video,
            folder: Some(folder),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("request to media host failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("media host rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("media host response carried no URL")]
    MissingUrl,

    #[error("{0}")]
    Other(String),
}

/// Converts an uploaded binary into a durable public URL
#[async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload(&self, file: &UploadedFile, options: UploadOptions)
        -> Result<String, UploadError>;
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Signed uploads to the Cloudinary upload API
#[derive(Debug, Clone)]
pub struct CloudinaryUploader {
    client: Client,
    config: CloudinaryConfig,
}

impl CloudinaryUploader {
    pub fn new(config: CloudinaryConfig) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, resource_type: ResourceType) -> String {
        format!(
            "{}/{}/{}/upload",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            resource_type.as_str()
        )
    }
}

/// Digest used for upload signatures
///
/// Cloudinary accounts verify SHA-1 unless switched to SHA-256 in their
/// security settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl SignatureAlgorithm {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Some(Self::Sha1),
            "sha256" | "sha-256" => Some(Self::Sha256),
            _ => None,
        }
    }
}

/// Signs upload parameters: sorted `key=value` pairs joined by `&`,
/// followed by the API secret, hashed with `algorithm`
pub fn sign_params(
    params: &[(&str, String)],
    api_secret: &str,
    algorithm: SignatureAlgorithm,
) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    let payload = format!("{}{}", to_sign, api_secret);
    match algorithm {
        SignatureAlgorithm::Sha1 => hex::encode(Sha1::digest(payload.as_bytes())),
        SignatureAlgorithm::Sha256 => hex::encode(Sha256::digest(payload.as_bytes())),
    }
}

#[async_trait]
impl MediaUploader for CloudinaryUploader {
    async fn upload(
        &self,
        file: &UploadedFile,
        options: UploadOptions,
    ) -> Result<String, UploadError> {
        let mut params = vec![("timestamp", Utc::now().timestamp().to_string())];
        if let Some(folder) = options.folder {
            params.push(("folder", folder.to_string()));
        }
        let signature = sign_params(
            &params,
            &self.config.api_secret,
            self.config.signature_algorithm,
        );

        let mut part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone().unwrap_or_else(|| "upload".to_string()));
        if let Some(content_type) = &file.content_type {
            part = part.mime_str(content_type)?;
        }

        let mut form = multipart::Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self
            .client
            .post(self.endpoint(options.resource_type))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorEnvelope>().await {
                Ok(envelope) => envelope.error.message,
                Err(_) => status.to_string(),
            };
            error!("Media host returned {}: {}", status, message);
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse = response.json().await?;
        let url = body.secure_url.ok_or(UploadError::MissingUrl)?;
        info!(
            "Uploaded {} ({} bytes) to {}",
            file.file_name.as_deref().unwrap_or("unnamed file"),
            file.bytes.len(),
            url
        );
        Ok(url)
    }
}
