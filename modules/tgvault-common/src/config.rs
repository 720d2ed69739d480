use std::env;

use crate::types::{parse_monitored, ChatRef};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub monitored_chats: Vec<ChatRef>,

    // Supabase
    pub supabase_url: String,
    pub supabase_key: String,
    pub supabase_bucket: String,

    // Postgres
    pub database_url: String,

    // Local working area for downloaded media
    pub media_dir: String,

    // Long-poll duration for the update stream
    pub poll_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        let monitored_chats = parse_monitored(&required_env("MONITORED_CHATS"));
        if monitored_chats.is_empty() {
            panic!("MONITORED_CHATS is empty, list the chats/channels to monitor");
        }

        Self {
            bot_token: required_env("TELEGRAM_BOT_TOKEN"),
            monitored_chats,
            supabase_url: required_env("SUPABASE_URL"),
            supabase_key: required_env("SUPABASE_KEY"),
            supabase_bucket: env::var("SUPABASE_BUCKET")
                .unwrap_or_else(|_| "tg_media".to_string()),
            database_url: required_env("DATABASE_URL"),
            media_dir: env::var("MEDIA_DIR").unwrap_or_else(|_| "./media".to_string()),
            poll_timeout_secs: env::var("POLL_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .expect("POLL_TIMEOUT_SECS must be a number"),
        }
    }

    /// Log the loaded configuration with secrets masked.
    pub fn log_redacted(&self) {
        let sources: Vec<String> = self.monitored_chats.iter().map(|c| c.to_string()).collect();
        tracing::info!(
            monitored_chats = ?sources,
            supabase_url = %self.supabase_url,
            supabase_bucket = %self.supabase_bucket,
            media_dir = %self.media_dir,
            poll_timeout_secs = self.poll_timeout_secs,
            bot_token = "***",
            supabase_key = "***",
            database_url = "***",
            "Loaded config"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
