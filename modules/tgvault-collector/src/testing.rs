// Test mocks for the pipeline trait seams.
//
// Four mocks matching the four boundaries:
// - ScriptedSource (MessageSource) — canned batches, then end-of-stream
// - MockFetcher (MediaFetcher) — file_id→extension map, failure set
// - MockUploader (MediaUploader) — records uploads, failure set
// - MockWriter (PostWriter) — records committed posts
//
// Plus helpers for constructing SourceMessage fixtures.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tgvault_common::{MediaDescriptor, Post, SourceMessage};

use crate::traits::{
    FetchedMedia, MediaFetcher, MediaUploader, MessageSource, PostWriter, UploadResult,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn photo_message(
    chat_id: i64,
    message_id: i64,
    group_id: Option<&str>,
    caption: &str,
    date: Option<DateTime<Utc>>,
) -> SourceMessage {
    SourceMessage {
        chat_id,
        message_id,
        group_id: group_id.map(String::from),
        date,
        text: caption.to_string(),
        media: MediaDescriptor::Photo {
            file_id: format!("photo-{message_id}"),
        },
        chat_title: None,
        chat_username: None,
        sender_username: None,
        sender_name: None,
    }
}

pub fn text_message(
    chat_id: i64,
    message_id: i64,
    group_id: Option<&str>,
    text: &str,
) -> SourceMessage {
    SourceMessage {
        chat_id,
        message_id,
        group_id: group_id.map(String::from),
        date: None,
        text: text.to_string(),
        media: MediaDescriptor::None,
        chat_title: None,
        chat_username: None,
        sender_username: None,
        sender_name: None,
    }
}

// ---------------------------------------------------------------------------
// ScriptedSource
// ---------------------------------------------------------------------------

/// Delivers pre-built batches in order, then signals end-of-stream.
pub struct ScriptedSource {
    batches: VecDeque<Vec<SourceMessage>>,
}

impl ScriptedSource {
    pub fn new(batches: Vec<Vec<SourceMessage>>) -> Self {
        Self {
            batches: batches.into(),
        }
    }
}

#[async_trait]
impl MessageSource for ScriptedSource {
    async fn next_batch(&mut self) -> Result<Option<Vec<SourceMessage>>> {
        Ok(self.batches.pop_front())
    }
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// File_id-keyed fetcher. Unregistered ids fail, as do ids registered with
/// `.failing()`. Records every attempted file_id.
#[derive(Default)]
pub struct MockFetcher {
    extensions: HashMap<String, String>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a downloadable file with its original extension.
    pub fn on_file(mut self, file_id: &str, extension: &str) -> Self {
        self.extensions
            .insert(file_id.to_string(), extension.to_string());
        self
    }

    /// Make fetches of this file_id fail.
    pub fn failing(mut self, file_id: &str) -> Self {
        self.failing.insert(file_id.to_string());
        self
    }

    /// Every file_id a fetch was attempted for, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaFetcher for MockFetcher {
    async fn fetch(&self, msg: &SourceMessage, ordinal: u32) -> Result<FetchedMedia> {
        let Some(file_id) = msg.media.file_id() else {
            bail!("no media on message {}", msg.message_id);
        };
        self.calls.lock().unwrap().push(file_id.to_string());

        if self.failing.contains(file_id) {
            bail!("scripted fetch failure for {file_id}");
        }
        let Some(extension) = self.extensions.get(file_id) else {
            bail!("unregistered file_id {file_id}");
        };

        Ok(FetchedMedia {
            local_path: PathBuf::from(format!(
                "/tmp/{}_{}_{}{}",
                msg.chat_id, msg.message_id, ordinal, extension
            )),
            extension: extension.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// MockUploader
// ---------------------------------------------------------------------------

/// Records (local path, key) pairs. Keys in the failure set error; the
/// `without_urls` mode simulates failed public address resolution.
#[derive(Default)]
pub struct MockUploader {
    failing: HashSet<String>,
    fail_all: bool,
    without_urls: bool,
    uploads: Mutex<Vec<(PathBuf, String)>>,
}

impl MockUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make uploads under this exact key fail.
    pub fn failing(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    /// Make every upload fail.
    pub fn failing_all(mut self) -> Self {
        self.fail_all = true;
        self
    }

    /// Uploads succeed but resolve no public address.
    pub fn without_urls(mut self) -> Self {
        self.without_urls = true;
        self
    }

    /// Every successful upload in order.
    pub fn uploads(&self) -> Vec<(PathBuf, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaUploader for MockUploader {
    async fn upload(&self, local: &Path, key: &str) -> Result<UploadResult> {
        if self.fail_all || self.failing.contains(key) {
            bail!("scripted upload failure for {key}");
        }
        self.uploads
            .lock()
            .unwrap()
            .push((local.to_path_buf(), key.to_string()));

        Ok(UploadResult {
            path: key.to_string(),
            public_url: if self.without_urls {
                None
            } else {
                Some(format!("https://cdn.test/{key}"))
            },
        })
    }
}

// ---------------------------------------------------------------------------
// MockWriter
// ---------------------------------------------------------------------------

/// In-memory post sink.
#[derive(Default)]
pub struct MockWriter {
    fail: bool,
    posts: Mutex<Vec<Post>>,
}

impl MockWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every commit fail.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn posts(&self) -> Vec<Post> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl PostWriter for MockWriter {
    async fn commit(&self, post: &Post) -> Result<()> {
        if self.fail {
            bail!("scripted write failure");
        }
        self.posts.lock().unwrap().push(post.clone());
        Ok(())
    }
}

