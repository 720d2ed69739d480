// Trait abstractions for the pipeline's external collaborators.
//
// MessageSource — the platform update stream (real: long-poll session).
// MediaFetcher — payload download to the local working area.
// MediaUploader — transfer to blob storage plus public address resolution.
// PostWriter — one row per post into the sink table.
//
// These enable deterministic testing with the mocks in `testing`:
// no network, no database.

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;

use tgvault_common::{Post, SourceMessage};

/// A batch-delivering stream of normalized platform messages.
/// `Ok(None)` means the stream has ended (only scripted test sources do).
#[async_trait]
pub trait MessageSource: Send {
    async fn next_batch(&mut self) -> Result<Option<Vec<SourceMessage>>>;
}

/// One successfully downloaded media payload.
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    pub local_path: PathBuf,
    /// Original extension including the leading dot, `.bin` when unknown.
    pub extension: String,
}

#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download the media payload of one message. `ordinal` namespaces the
    /// local filename within the post.
    async fn fetch(&self, msg: &SourceMessage, ordinal: u32) -> Result<FetchedMedia>;
}

/// Outcome of one blob upload. The address is best-effort: a missing
/// public URL does not mean the upload failed.
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub path: String,
    pub public_url: Option<String>,
}

#[async_trait]
pub trait MediaUploader: Send + Sync {
    /// Transfer a local file to blob storage under `key`.
    async fn upload(&self, local: &Path, key: &str) -> Result<UploadResult>;
}

#[async_trait]
pub trait PostWriter: Send + Sync {
    /// Insert exactly one row for the post. No upsert, no retry.
    async fn commit(&self, post: &Post) -> Result<()>;
}

// Shared handles work wherever the owned service does.

#[async_trait]
impl<F: MediaFetcher> MediaFetcher for std::sync::Arc<F> {
    async fn fetch(&self, msg: &SourceMessage, ordinal: u32) -> Result<FetchedMedia> {
        (**self).fetch(msg, ordinal).await
    }
}

#[async_trait]
impl<U: MediaUploader> MediaUploader for std::sync::Arc<U> {
    async fn upload(&self, local: &Path, key: &str) -> Result<UploadResult> {
        (**self).upload(local, key).await
    }
}

#[async_trait]
impl<W: PostWriter> PostWriter for std::sync::Arc<W> {
    async fn commit(&self, post: &Post) -> Result<()> {
        (**self).commit(post).await
    }
}
