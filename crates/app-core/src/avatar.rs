//! Converts a remote avatar URL into an inlineable `data:` URI.

use axum::http::StatusCode;
use base64::Engine;
use base64::engine::general_purpose;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;

// Used when the image server omits the Content-Type header.
const FALLBACK_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, Error)]
pub enum AvatarError {
    #[error("HTTP request for avatar failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Avatar endpoint returned status {0}")]
    Status(StatusCode),
}

#[async_trait::async_trait]
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait AvatarFetcher: Send + Sync {
    /// Downloads the image and encodes it as `data:<type>;base64,<payload>`.
    async fn fetch_data_uri(&self, url: &str) -> Result<String, AvatarError>;
}

/// The whole image is buffered in memory before encoding; no retries, no
/// size limit, no streaming.
#[derive(Debug, Clone, Default)]
pub struct HttpAvatarFetcher {
    client: Client,
}

impl HttpAvatarFetcher {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }
}

#[async_trait::async_trait]
impl AvatarFetcher for HttpAvatarFetcher {
    async fn fetch_data_uri(&self, url: &str) -> Result<String, AvatarError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AvatarError::Status(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();

        let bytes = response.bytes().await?;

        Ok(to_data_uri(&bytes, &content_type))
    }
}

fn to_data_uri(data: &[u8], content_type: &str) -> String {
    format!("data:{content_type};base64,{}", general_purpose::STANDARD.encode(data))
}
