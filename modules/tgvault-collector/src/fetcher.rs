// Media download into the local working area.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use telegram_client::TelegramClient;
use tracing::debug;

use tgvault_common::{CollectorError, SourceMessage};

use crate::traits::{FetchedMedia, MediaFetcher};

pub struct TelegramFetcher {
    client: TelegramClient,
    media_dir: PathBuf,
}

impl TelegramFetcher {
    pub fn new(client: TelegramClient, media_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            media_dir: media_dir.into(),
        }
    }
}

/// Extension of a server-side file path, including the leading dot.
/// `.bin` when the path has none.
fn extension_of(file_path: &str) -> String {
    Path::new(file_path)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_else(|| ".bin".to_string())
}

#[async_trait]
impl MediaFetcher for TelegramFetcher {
    async fn fetch(&self, msg: &SourceMessage, ordinal: u32) -> Result<FetchedMedia> {
        let file_id = msg
            .media
            .file_id()
            .context("message carries no downloadable media")?;

        let file = self
            .client
            .get_file(file_id)
            .await
            .map_err(|e| CollectorError::Source(e.to_string()))?;
        let file_path = file
            .file_path
            .with_context(|| format!("no file path for {file_id}"))?;
        let extension = extension_of(&file_path);

        // Namespaced by source, post and ordinal so concurrent posts in the
        // shared working dir cannot collide.
        let post_ref = msg
            .group_id
            .clone()
            .unwrap_or_else(|| msg.message_id.to_string());
        let local_path = self
            .media_dir
            .join(format!("{}_{}_{}{}", msg.chat_id, post_ref, ordinal, extension));

        let bytes = self
            .client
            .download(&file_path)
            .await
            .map_err(|e| CollectorError::Source(e.to_string()))?;
        tokio::fs::write(&local_path, &bytes)
            .await
            .with_context(|| format!("writing {}", local_path.display()))?;

        debug!(
            chat_id = msg.chat_id,
            message_id = msg.message_id,
            size = bytes.len(),
            path = %local_path.display(),
            "Downloaded media"
        );

        Ok(FetchedMedia {
            local_path,
            extension,
        })
    }
}
