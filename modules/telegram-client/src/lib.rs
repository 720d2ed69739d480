pub mod error;
pub mod types;

pub use error::{Result, TelegramError};
pub use types::{ApiResponse, Chat, Document, File, Message, PhotoSize, Update, User, Video};

use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::time::Duration;

const BASE_URL: &str = "https://api.telegram.org";

pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(token: String) -> Self {
        Self::with_base_url(token, BASE_URL)
    }

    /// Custom API host, used by tests pointing at a local stub.
    pub fn with_base_url(token: String, base_url: &str) -> Self {
        // No overall client timeout: getUpdates long-polls, downloads can be
        // large. Per-call timeouts are set where they matter.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Long-poll for new updates. `offset` is one past the last update_id
    /// already consumed. Only message and channel_post updates are requested.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message", "channel_post"],
        });

        let updates: Vec<Update> = self
            .call("getUpdates", &body, Duration::from_secs(timeout_secs + 10))
            .await?;

        tracing::debug!(count = updates.len(), offset, "Fetched updates");
        Ok(updates)
    }

    /// Resolve a file_id into a downloadable server-side path.
    pub async fn get_file(&self, file_id: &str) -> Result<File> {
        let body = serde_json::json!({ "file_id": file_id });
        self.call("getFile", &body, Duration::from_secs(30)).await
    }

    /// Download a file previously resolved with getFile.
    pub async fn download(&self, file_path: &str) -> Result<Bytes> {
        let url = format!("{}/file/bot{}/{}", self.base_url, self.token, file_path);
        let resp = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(300))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(TelegramError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.bytes().await?)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<T> {
        let url = format!("{}/bot{}/{}", self.base_url, self.token, method);
        let resp = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(TelegramError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: ApiResponse<T> = resp.json().await?;
        if !envelope.ok {
            return Err(TelegramError::Rejected(
                envelope.description.unwrap_or_else(|| "unknown".to_string()),
            ));
        }

        envelope
            .result
            .ok_or_else(|| TelegramError::Rejected("ok response with no result".to_string()))
    }
}
