pub mod error;

pub use error::{Result, SupabaseError};

use bytes::Bytes;
use std::time::Duration;

/// Client for one Supabase Storage bucket. Upload-only: the collector never
/// reads objects back.
pub struct SupabaseStorageClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    bucket: String,
}

impl SupabaseStorageClient {
    pub fn new(base_url: &str, api_key: &str, bucket: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            bucket: bucket.to_string(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Store an object under `path` in the bucket. Fails if the object
    /// already exists (no upsert).
    pub async fn upload_object(&self, path: &str, body: Bytes, content_type: &str) -> Result<()> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, path
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .header("Content-Type", content_type)
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(path, "Uploaded object");
        Ok(())
    }

    /// Public address for an object in a public bucket. Purely derived from
    /// the key; does not check that the object exists.
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}
