use serde::Deserialize;

/// Envelope for every Bot API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

/// One entry from getUpdates. Exactly one of the payload fields is set
/// for the update kinds we subscribe to.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub channel_post: Option<Message>,
}

impl Update {
    /// The message payload regardless of whether it arrived as a group
    /// message or a channel post.
    pub fn into_message(self) -> Option<Message> {
        self.message.or(self.channel_post)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    /// Unix timestamp of the message. Telegram always sets this, but we
    /// keep it optional so a malformed update cannot fail the whole batch.
    pub date: Option<i64>,
    pub chat: Chat,
    pub from: Option<User>,
    /// For channel posts the author is the channel itself.
    pub sender_chat: Option<Chat>,
    /// Shared by all members of one album.
    pub media_group_id: Option<String>,
    pub text: Option<String>,
    pub caption: Option<String>,
    /// Available sizes, smallest first.
    pub photo: Option<Vec<PhotoSize>>,
    pub video: Option<Video>,
    pub document: Option<Document>,
}

impl Message {
    /// Visible text of the message: body text for plain messages, caption
    /// for media messages. Never null.
    pub fn raw_text(&self) -> &str {
        self.text
            .as_deref()
            .or(self.caption.as_deref())
            .unwrap_or("")
    }

    /// file_id of the largest available photo size, if any.
    pub fn largest_photo(&self) -> Option<&PhotoSize> {
        self.photo
            .as_ref()?
            .iter()
            .max_by_key(|p| p.width * p.height)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub file_unique_id: String,
    pub width: i64,
    pub height: i64,
    pub file_size: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Video {
    pub file_id: String,
    pub file_unique_id: String,
    pub mime_type: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub file_id: String,
    pub file_unique_id: String,
    pub mime_type: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
}

/// Result of getFile: a short-lived server-side path for downloading.
#[derive(Debug, Clone, Deserialize)]
pub struct File {
    pub file_id: String,
    pub file_unique_id: String,
    pub file_size: Option<i64>,
    pub file_path: Option<String>,
}
