//! Third-party image hosting (ImgBB single-endpoint multipart upload).
//!
//! # Invariants
//! - An upload either yields a hosted URL or an `UploadError`; partial
//!   results are never returned.

use crate::config::ImageHostConfig;
use crate::error::{HasMessage, MessageId};
use async_trait::async_trait;
use log::{info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

pub type UploadResult<T> = Result<T, UploadError>;

#[derive(Debug)]
pub enum UploadError {
    EmptyImage,
    MissingApiKey,
    Transport(String),
    Rejected { status: u16, message: String },
    Decode(String),
}

impl Display for UploadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyImage => write!(f, "image payload is empty"),
            Self::MissingApiKey => write!(f, "image host api key is not configured"),
            Self::Transport(message) => write!(f, "image upload failed: {message}"),
            Self::Rejected { status, message } => {
                write!(f, "image host rejected upload ({status}): {message}")
            }
            Self::Decode(message) => write!(f, "invalid image host response: {message}"),
        }
    }
}

impl Error for UploadError {}

impl HasMessage for UploadError {
    fn message_id(&self) -> MessageId {
        match self {
            Self::Transport(_) => MessageId::NoConnection,
            Self::EmptyImage => MessageId::InvalidInput,
            _ => MessageId::UploadFailed,
        }
    }
}

/// Image picked by the user, ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedImage {
    pub url: String,
    pub delete_url: Option<String>,
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, image: &ImageUpload) -> UploadResult<HostedImage>;
}

#[async_trait]
impl<T: ImageHost + ?Sized> ImageHost for Arc<T> {
    async fn upload(&self, image: &ImageUpload) -> UploadResult<HostedImage> {
        (**self).upload(image).await
    }
}

pub struct ImgBbClient {
    http: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ImgBbResponse {
    #[serde(default)]
    success: bool,
    data: Option<ImgBbData>,
    error: Option<ImgBbError>,
}

#[derive(Debug, Deserialize)]
struct ImgBbData {
    url: String,
    #[serde(default)]
    delete_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImgBbError {
    #[serde(default)]
    message: String,
}

impl ImgBbClient {
    pub fn new(config: &ImageHostConfig) -> UploadResult<Self> {
        let http = Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .map_err(|err| UploadError::Transport(err.to_string()))?;
        Ok(Self::with_client(http, config))
    }

    pub fn with_client(http: Client, config: &ImageHostConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl ImageHost for ImgBbClient {
    async fn upload(&self, image: &ImageUpload) -> UploadResult<HostedImage> {
        if image.bytes.is_empty() {
            return Err(UploadError::EmptyImage);
        }
        if self.api_key.trim().is_empty() {
            return Err(UploadError::MissingApiKey);
        }

        let started_at = Instant::now();
        let part = Part::bytes(image.bytes.clone()).file_name(image.file_name.clone());
        let form = Form::new().part("image", part);
        let response = self
            .http
            .post(format!("{}/1/upload", self.base_url))
            .query(&[("key", self.api_key.as_str())])
            .multipart(form)
            .send()
            .await
            .map_err(|err| UploadError::Transport(err.to_string()))?;

        let status = response.status();
        let body: ImgBbResponse = response
            .json()
            .await
            .map_err(|err| UploadError::Decode(err.to_string()))?;

        match body.data {
            Some(data) if status.is_success() && body.success => {
                info!(
                    "event=image_upload module=upload status=ok bytes={} duration_ms={}",
                    image.bytes.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(HostedImage {
                    url: data.url,
                    delete_url: data.delete_url,
                })
            }
            _ => {
                warn!(
                    "event=image_upload module=upload status=error http_status={} duration_ms={}",
                    status.as_u16(),
                    started_at.elapsed().as_millis()
                );
                Err(UploadError::Rejected {
                    status: status.as_u16(),
                    message: body
                        .error
                        .map(|error| error.message)
                        .unwrap_or_else(|| status.to_string()),
                })
            }
        }
    }
}
