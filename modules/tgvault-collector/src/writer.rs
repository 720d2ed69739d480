// Postgres persistence for assembled posts.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use tgvault_common::{CollectorError, Post};

use crate::traits::PostWriter;

pub struct PgWriter {
    pool: PgPool,
}

impl PgWriter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl PostWriter for PgWriter {
    async fn commit(&self, post: &Post) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO incoming_posts
                (chat_id, chat_title, msg_id, text, posted_at,
                 sender_username, sender_name, matched, images_count, photo_list)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(post.chat_id)
        .bind(&post.chat_title)
        .bind(post.msg_id)
        .bind(&post.text)
        .bind(post.posted_at)
        .bind(&post.sender_username)
        .bind(&post.sender_name)
        .bind(post.matched)
        .bind(post.images_count)
        .bind(serde_json::to_value(&post.photo_list)?)
        .execute(&self.pool)
        .await
        .map_err(|e| CollectorError::Database(e.to_string()))?;

        Ok(())
    }
}
