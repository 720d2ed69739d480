// Blob upload: deterministic storage keys plus the Supabase-backed uploader.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Datelike, Utc};
use supabase_client::SupabaseStorageClient;
use tgvault_common::CollectorError;

use crate::traits::{MediaUploader, UploadResult};

/// Destination key for one media item. Pure and idempotent: the same inputs
/// always yield the same key. Date path is the post timestamp in UTC.
pub fn storage_key(
    chat_id: i64,
    posted_at: DateTime<Utc>,
    msg_id: i64,
    ordinal: u32,
    extension: &str,
) -> String {
    let ext = if extension.is_empty() { ".bin" } else { extension };
    format!(
        "{}/{:04}/{:02}/{:02}/{}/{}{}",
        chat_id,
        posted_at.year(),
        posted_at.month(),
        posted_at.day(),
        msg_id,
        ordinal,
        ext
    )
}

/// Content type for the upload, inferred from the original extension.
pub fn content_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".webp" => "image/webp",
        ".gif" => "image/gif",
        ".mp4" => "video/mp4",
        ".mov" => "video/quicktime",
        ".webm" => "video/webm",
        _ => "application/octet-stream",
    }
}

pub struct SupabaseUploader {
    client: SupabaseStorageClient,
}

impl SupabaseUploader {
    pub fn new(client: SupabaseStorageClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MediaUploader for SupabaseUploader {
    async fn upload(&self, local: &Path, key: &str) -> Result<UploadResult> {
        let bytes = tokio::fs::read(local)
            .await
            .map_err(|e| CollectorError::Storage(format!("reading {}: {e}", local.display())))?;

        let extension = local
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        self.client
            .upload_object(key, Bytes::from(bytes), content_type_for(&extension))
            .await
            .map_err(|e| CollectorError::Storage(e.to_string()))?;

        // The public address is derived, not fetched; for a public bucket it
        // cannot fail here. A missing address would still not fail the upload.
        Ok(UploadResult {
            path: key.to_string(),
            public_url: Some(self.client.public_url(key)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn key_layout() {
        let posted_at = Utc.with_ymd_and_hms(2024, 3, 2, 10, 0, 0).unwrap();
        assert_eq!(
            storage_key(-100123, posted_at, 50, 1, ".jpg"),
            "-100123/2024/03/02/50/1.jpg"
        );
        assert_eq!(
            storage_key(-100123, posted_at, 50, 3, ""),
            "-100123/2024/03/02/50/3.bin"
        );
    }

    #[test]
    fn key_derivation_is_idempotent() {
        let posted_at = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap();
        let a = storage_key(77, posted_at, 9001, 2, ".mp4");
        let b = storage_key(77, posted_at, 9001, 2, ".mp4");
        assert_eq!(a, b);
        assert_eq!(a, "77/2025/12/31/9001/2.mp4");
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for(".jpg"), "image/jpeg");
        assert_eq!(content_type_for(".JPG"), "image/jpeg");
        assert_eq!(content_type_for(".mp4"), "video/mp4");
        assert_eq!(content_type_for(".bin"), "application/octet-stream");
        assert_eq!(content_type_for(""), "application/octet-stream");
    }

    #[tokio::test]
    async fn missing_local_file_maps_to_storage_error() {
        let uploader = SupabaseUploader::new(SupabaseStorageClient::new(
            "https://proj.supabase.co",
            "key",
            "tg_media",
        ));

        // Fails while reading, before any network call.
        let err = uploader
            .upload(Path::new("/definitely/not/here.jpg"), "x/1.jpg")
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CollectorError>(),
            Some(CollectorError::Storage(_))
        ));
    }
}
