// Session adapter: the only module that sees Telegram wire types.
// Maps updates into domain messages and long-polls the update stream.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use telegram_client::{Message, TelegramClient, Update};
use tracing::debug;

use tgvault_common::{MediaDescriptor, SourceMessage};

use crate::traits::MessageSource;

/// Classify a wire message's media. The single place that probes the
/// optional photo/video/document attributes.
pub fn classify_media(msg: &Message) -> MediaDescriptor {
    if let Some(photo) = msg.largest_photo() {
        return MediaDescriptor::Photo {
            file_id: photo.file_id.clone(),
        };
    }
    if let Some(video) = &msg.video {
        return MediaDescriptor::Video {
            file_id: video.file_id.clone(),
        };
    }
    if let Some(doc) = &msg.document {
        if let Some(mime) = &doc.mime_type {
            return MediaDescriptor::Document {
                file_id: doc.file_id.clone(),
                mime: mime.clone(),
            };
        }
    }
    MediaDescriptor::None
}

/// Normalize one wire message into the domain shape. Sender resolution is
/// best-effort: user messages carry `from`, channel posts carry the channel
/// itself in `sender_chat`, and either may be absent.
pub fn to_source_message(msg: Message) -> SourceMessage {
    let media = classify_media(&msg);
    let text = msg.raw_text().trim().to_string();

    let (sender_username, sender_name) = if let Some(user) = &msg.from {
        let name = match (&user.first_name, &user.last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(first), None) => Some(first.clone()),
            _ => None,
        };
        (user.username.clone(), name)
    } else if let Some(chat) = &msg.sender_chat {
        (chat.username.clone(), chat.title.clone())
    } else {
        (None, None)
    };

    let date = msg
        .date
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

    SourceMessage {
        chat_id: msg.chat.id,
        message_id: msg.message_id,
        group_id: msg.media_group_id,
        date,
        text,
        media,
        chat_title: msg.chat.title,
        chat_username: msg.chat.username,
        sender_username,
        sender_name,
    }
}

/// Long-polling update stream with offset bookkeeping.
///
/// Album members arrive as separate updates sharing a media_group_id. When a
/// batch ends on a group member, a few short follow-up polls pull the
/// trailing members so the whole album lands in one classification batch.
pub struct UpdateStream {
    client: TelegramClient,
    offset: i64,
    poll_timeout_secs: u64,
}

/// Extra short polls issued while the batch tail is still an album member.
const TAIL_DRAIN_POLLS: usize = 3;

impl UpdateStream {
    pub fn new(client: TelegramClient, poll_timeout_secs: u64) -> Self {
        Self {
            client,
            offset: 0,
            poll_timeout_secs,
        }
    }

    fn tail_in_group(updates: &[Update]) -> bool {
        updates
            .last()
            .and_then(|u| u.message.as_ref().or(u.channel_post.as_ref()))
            .map(|m| m.media_group_id.is_some())
            .unwrap_or(false)
    }

    fn advance_offset(&mut self, updates: &[Update]) {
        if let Some(last) = updates.last() {
            self.offset = last.update_id + 1;
        }
    }
}

#[async_trait]
impl MessageSource for UpdateStream {
    async fn next_batch(&mut self) -> Result<Option<Vec<SourceMessage>>> {
        let mut updates = self
            .client
            .get_updates(self.offset, self.poll_timeout_secs)
            .await?;
        self.advance_offset(&updates);

        let mut drains = 0;
        while Self::tail_in_group(&updates) && drains < TAIL_DRAIN_POLLS {
            let more = self.client.get_updates(self.offset, 1).await?;
            if more.is_empty() {
                break;
            }
            debug!(count = more.len(), "Drained trailing album members");
            self.advance_offset(&more);
            updates.extend(more);
            drains += 1;
        }

        let batch: Vec<SourceMessage> = updates
            .into_iter()
            .filter_map(Update::into_message)
            .map(to_source_message)
            .collect();

        Ok(Some(batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire_message(json: &str) -> Message {
        serde_json::from_str(json).expect("invalid test JSON")
    }

    #[test]
    fn photo_message_classified() {
        let msg = wire_message(
            r#"{
            "message_id": 50,
            "date": 1709373600,
            "chat": {"id": -100123, "type": "channel", "title": "Deals", "username": "deals"},
            "media_group_id": "g50",
            "caption": "Buy now",
            "photo": [{"file_id": "ph1", "file_unique_id": "u", "width": 800, "height": 600}]
        }"#,
        );

        let domain = to_source_message(msg);
        assert_eq!(domain.chat_id, -100123);
        assert_eq!(domain.message_id, 50);
        assert_eq!(domain.group_id.as_deref(), Some("g50"));
        assert_eq!(domain.text, "Buy now");
        assert_eq!(
            domain.media,
            MediaDescriptor::Photo {
                file_id: "ph1".to_string()
            }
        );
        assert_eq!(
            domain.date.unwrap().to_rfc3339(),
            "2024-03-02T10:00:00+00:00"
        );
    }

    #[test]
    fn video_document_classified_by_mime() {
        let msg = wire_message(
            r#"{
            "message_id": 8,
            "date": 1709373600,
            "chat": {"id": 1, "type": "private"},
            "document": {"file_id": "doc1", "file_unique_id": "u", "mime_type": "video/mp4"}
        }"#,
        );
        let domain = to_source_message(msg);
        assert!(domain.media.is_media());
    }

    #[test]
    fn pdf_document_not_media() {
        let msg = wire_message(
            r#"{
            "message_id": 9,
            "date": 1709373600,
            "chat": {"id": 1, "type": "private"},
            "document": {"file_id": "doc2", "file_unique_id": "u", "mime_type": "application/pdf"}
        }"#,
        );
        let domain = to_source_message(msg);
        assert!(!domain.media.is_media());
    }

    #[test]
    fn sticker_like_message_has_no_media() {
        let msg = wire_message(
            r#"{
            "message_id": 10,
            "date": 1709373600,
            "chat": {"id": 1, "type": "private"},
            "text": "plain"
        }"#,
        );
        let domain = to_source_message(msg);
        assert_eq!(domain.media, MediaDescriptor::None);
        assert_eq!(domain.text, "plain");
    }

    #[test]
    fn channel_post_sender_is_the_channel() {
        let msg = wire_message(
            r#"{
            "message_id": 11,
            "date": 1709373600,
            "chat": {"id": -100123, "type": "channel", "title": "Deals"},
            "sender_chat": {"id": -100123, "type": "channel", "title": "Deals", "username": "deals"},
            "text": "hi"
        }"#,
        );
        let domain = to_source_message(msg);
        assert_eq!(domain.sender_username.as_deref(), Some("deals"));
        assert_eq!(domain.sender_name.as_deref(), Some("Deals"));
    }

    #[test]
    fn user_sender_full_name() {
        let msg = wire_message(
            r#"{
            "message_id": 12,
            "date": 1709373600,
            "chat": {"id": 42, "type": "private", "first_name": "Ann"},
            "from": {"id": 42, "username": "ann", "first_name": "Ann", "last_name": "Lee"},
            "text": "hi"
        }"#,
        );
        let domain = to_source_message(msg);
        assert_eq!(domain.sender_username.as_deref(), Some("ann"));
        assert_eq!(domain.sender_name.as_deref(), Some("Ann Lee"));
    }
}
