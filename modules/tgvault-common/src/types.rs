use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Sources ---

/// A monitored chat/channel: numeric id (channels are negative) or a
/// @handle / t.me link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatRef {
    Id(i64),
    Handle(String),
}

impl ChatRef {
    /// Does an incoming message from `chat_id` (with optional public
    /// `username`) belong to this source?
    pub fn matches(&self, chat_id: i64, username: Option<&str>) -> bool {
        match self {
            ChatRef::Id(id) => *id == chat_id,
            ChatRef::Handle(handle) => {
                let wanted = normalize_handle(handle);
                username
                    .map(|u| u.eq_ignore_ascii_case(&wanted))
                    .unwrap_or(false)
            }
        }
    }
}

impl std::fmt::Display for ChatRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatRef::Id(id) => write!(f, "{id}"),
            ChatRef::Handle(h) => write!(f, "{h}"),
        }
    }
}

/// Strip @ prefix and t.me link forms down to the bare username.
fn normalize_handle(raw: &str) -> String {
    let trimmed = raw
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("t.me/")
        .trim_start_matches('@');
    trimmed.trim_end_matches('/').to_string()
}

/// Parse the comma-separated MONITORED_CHATS value. Numeric tokens
/// (including negative channel ids) become ids, everything else a handle.
/// Blank tokens are skipped.
pub fn parse_monitored(env: &str) -> Vec<ChatRef> {
    env.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            let digits = t.strip_prefix('-').unwrap_or(t);
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                match t.parse::<i64>() {
                    Ok(id) => ChatRef::Id(id),
                    Err(_) => ChatRef::Handle(t.to_string()),
                }
            } else {
                ChatRef::Handle(t.to_string())
            }
        })
        .collect()
}

// --- Messages ---

/// What kind of media a platform message carries, with the opaque platform
/// reference needed to download it. Produced by one classification function
/// in the session adapter; nothing else probes message attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaDescriptor {
    None,
    Photo { file_id: String },
    Video { file_id: String },
    /// Generic document. Only kept when the declared MIME type is video/*.
    Document { file_id: String, mime: String },
}

impl MediaDescriptor {
    /// Whether this message belongs in a post's media manifest.
    pub fn is_media(&self) -> bool {
        match self {
            MediaDescriptor::None => false,
            MediaDescriptor::Photo { .. } | MediaDescriptor::Video { .. } => true,
            MediaDescriptor::Document { mime, .. } => mime.starts_with("video/"),
        }
    }

    pub fn file_id(&self) -> Option<&str> {
        match self {
            MediaDescriptor::None => None,
            MediaDescriptor::Photo { file_id }
            | MediaDescriptor::Video { file_id }
            | MediaDescriptor::Document { file_id, .. } => Some(file_id),
        }
    }
}

/// One normalized platform message. Pure data: the Telegram wire types never
/// leave the session adapter.
#[derive(Debug, Clone)]
pub struct SourceMessage {
    pub chat_id: i64,
    pub message_id: i64,
    /// Shared album identifier; present on every member of a multi-message post.
    pub group_id: Option<String>,
    pub date: Option<DateTime<Utc>>,
    /// Body text or caption, never null.
    pub text: String,
    pub media: MediaDescriptor,
    pub chat_title: Option<String>,
    pub chat_username: Option<String>,
    pub sender_username: Option<String>,
    pub sender_name: Option<String>,
}

impl SourceMessage {
    /// Display name for the chat: title, then @username, then the raw id.
    pub fn display_title(&self) -> String {
        if let Some(title) = self.chat_title.as_deref() {
            if !title.is_empty() {
                return title.to_string();
            }
        }
        if let Some(username) = self.chat_username.as_deref() {
            if !username.is_empty() {
                return format!("@{username}");
            }
        }
        self.chat_id.to_string()
    }
}

/// One unit of work for the assembler: a lone message or a full album.
#[derive(Debug, Clone)]
pub enum RawEvent {
    Standalone(SourceMessage),
    Album {
        group_id: String,
        /// Members in platform delivery order, length >= 1.
        messages: Vec<SourceMessage>,
    },
}

impl RawEvent {
    pub fn messages(&self) -> &[SourceMessage] {
        match self {
            RawEvent::Standalone(msg) => std::slice::from_ref(msg),
            RawEvent::Album { messages, .. } => messages,
        }
    }
}

// --- Posts ---

/// One uploaded media item in a post's manifest. Serializes to the
/// photo_list element shape stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedMedia {
    /// 1-based position in the manifest.
    pub index: u32,
    /// Storage key within the bucket.
    pub path: String,
    /// Publicly dereferenceable address; null if resolution failed.
    pub public_url: Option<String>,
}

/// The unit of persistence: one logical post with its uploaded media.
/// Immutable once handed to the writer.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub chat_id: i64,
    pub chat_title: String,
    /// Representative message id: the first (group-defining) constituent.
    pub msg_id: i64,
    /// Richest non-empty caption among constituents, else empty string.
    pub text: String,
    pub posted_at: DateTime<Utc>,
    pub sender_username: Option<String>,
    pub sender_name: Option<String>,
    /// Reserved for a future classification path; always true today.
    pub matched: bool,
    pub images_count: i32,
    pub photo_list: Vec<UploadedMedia>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(chat_id: i64) -> SourceMessage {
        SourceMessage {
            chat_id,
            message_id: 1,
            group_id: None,
            date: None,
            text: String::new(),
            media: MediaDescriptor::None,
            chat_title: None,
            chat_username: None,
            sender_username: None,
            sender_name: None,
        }
    }

    #[test]
    fn parse_monitored_mixed() {
        let refs = parse_monitored("@chan1, -1001234567890 ,chan2,,42");
        assert_eq!(
            refs,
            vec![
                ChatRef::Handle("@chan1".to_string()),
                ChatRef::Id(-1001234567890),
                ChatRef::Handle("chan2".to_string()),
                ChatRef::Id(42),
            ]
        );
    }

    #[test]
    fn parse_monitored_link() {
        let refs = parse_monitored("https://t.me/replicadesignerbags");
        assert_eq!(refs.len(), 1);
        assert!(refs[0].matches(0, Some("replicadesignerbags")));
    }

    #[test]
    fn parse_monitored_empty() {
        assert!(parse_monitored("").is_empty());
        assert!(parse_monitored(" , ,").is_empty());
    }

    #[test]
    fn chat_ref_matching() {
        assert!(ChatRef::Id(-100123).matches(-100123, None));
        assert!(!ChatRef::Id(-100123).matches(-100124, None));
        assert!(ChatRef::Handle("@Deals".to_string()).matches(-1, Some("deals")));
        assert!(!ChatRef::Handle("@deals".to_string()).matches(-1, None));
    }

    #[test]
    fn media_classification() {
        assert!(!MediaDescriptor::None.is_media());
        assert!(MediaDescriptor::Photo { file_id: "f".into() }.is_media());
        assert!(MediaDescriptor::Video { file_id: "f".into() }.is_media());
        assert!(MediaDescriptor::Document {
            file_id: "f".into(),
            mime: "video/mp4".into()
        }
        .is_media());
        assert!(!MediaDescriptor::Document {
            file_id: "f".into(),
            mime: "application/pdf".into()
        }
        .is_media());
    }

    #[test]
    fn display_title_fallback_chain() {
        let mut m = msg(-100123);
        assert_eq!(m.display_title(), "-100123");

        m.chat_username = Some("deals".to_string());
        assert_eq!(m.display_title(), "@deals");

        m.chat_title = Some("Daily Deals".to_string());
        assert_eq!(m.display_title(), "Daily Deals");
    }

    #[test]
    fn photo_list_element_shape() {
        let item = UploadedMedia {
            index: 1,
            path: "-100123/2024/03/02/50/1.jpg".to_string(),
            public_url: None,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "index": 1,
                "path": "-100123/2024/03/02/50/1.jpg",
                "public_url": null
            })
        );
    }
}
