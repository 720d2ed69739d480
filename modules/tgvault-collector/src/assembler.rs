// Post assembly: the core of the pipeline. Turns one classified event into
// at most one finalized Post, or nothing when no media survives.

use chrono::Utc;
use tracing::{debug, warn};

use tgvault_common::{Post, RawEvent, SourceMessage, UploadedMedia};

use crate::traits::{FetchedMedia, MediaFetcher, MediaUploader};
use crate::uploader::storage_key;

pub struct Assembler<F, U> {
    fetcher: F,
    uploader: U,
}

/// Richest caption: the longest non-empty trimmed text among constituents,
/// empty string when there is none. Length is character count, not byte
/// count, so multibyte captions compare fairly. Ties keep the first
/// occurrence.
pub fn best_caption(messages: &[SourceMessage]) -> String {
    let mut best = "";
    let mut best_len = 0;
    for text in messages.iter().map(|m| m.text.trim()) {
        let len = text.chars().count();
        if len > best_len {
            best = text;
            best_len = len;
        }
    }
    best.to_string()
}

impl<F: MediaFetcher, U: MediaUploader> Assembler<F, U> {
    pub fn new(fetcher: F, uploader: U) -> Self {
        Self { fetcher, uploader }
    }

    /// Build one Post from a standalone message or album.
    ///
    /// Media-bearing constituents keep their arrival order throughout; a
    /// constituent whose fetch or upload fails is dropped and logged without
    /// aborting the post. Returns None when nothing is left to persist.
    pub async fn assemble(&self, event: &RawEvent) -> Option<Post> {
        let messages = event.messages();
        let first = messages.first()?;
        let posted_at = first.date.unwrap_or_else(Utc::now);

        let media_messages: Vec<&SourceMessage> =
            messages.iter().filter(|m| m.media.is_media()).collect();
        if media_messages.is_empty() {
            debug!(
                chat_id = first.chat_id,
                message_id = first.message_id,
                "No media in event, skipping"
            );
            return None;
        }

        // Download in arrival order. The fetch ordinal namespaces the local
        // filename; failed items drop out here.
        let mut fetched: Vec<FetchedMedia> = Vec::new();
        for (i, msg) in media_messages.iter().enumerate() {
            let ordinal = (i + 1) as u32;
            match self.fetcher.fetch(msg, ordinal).await {
                Ok(media) => fetched.push(media),
                Err(e) => warn!(
                    chat_id = msg.chat_id,
                    message_id = msg.message_id,
                    error = %e,
                    "Fetch failed, dropping media item"
                ),
            }
        }

        // Upload survivors under compacted 1-based indices, keyed by the
        // representative (first constituent) message id.
        let mut manifest: Vec<UploadedMedia> = Vec::new();
        for (i, media) in fetched.iter().enumerate() {
            let index = (i + 1) as u32;
            let key = storage_key(
                first.chat_id,
                posted_at,
                first.message_id,
                index,
                &media.extension,
            );
            match self.uploader.upload(&media.local_path, &key).await {
                Ok(result) => manifest.push(UploadedMedia {
                    index,
                    path: result.path,
                    public_url: result.public_url,
                }),
                Err(e) => warn!(
                    chat_id = first.chat_id,
                    msg_id = first.message_id,
                    key = %key,
                    error = %e,
                    "Upload failed, dropping media item"
                ),
            }

            // The working file is spent once its upload attempt finishes,
            // success or not; the shared media dir must not grow unbounded.
            if let Err(e) = tokio::fs::remove_file(&media.local_path).await {
                debug!(
                    path = %media.local_path.display(),
                    error = %e,
                    "Could not remove local media file"
                );
            }
        }

        if manifest.is_empty() {
            debug!(
                chat_id = first.chat_id,
                message_id = first.message_id,
                "No media survived fetch/upload, discarding event"
            );
            return None;
        }

        Some(Post {
            chat_id: first.chat_id,
            chat_title: first.display_title(),
            msg_id: first.message_id,
            text: best_caption(messages),
            posted_at,
            sender_username: first.sender_username.clone(),
            sender_name: first.sender_name.clone(),
            // Reserved for a future classification path.
            matched: true,
            images_count: manifest.len() as i32,
            photo_list: manifest,
        })
    }
}
