use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use supabase_client::SupabaseStorageClient;
use telegram_client::TelegramClient;
use tgvault_collector::{
    Assembler, Collector, Dispatcher, PgWriter, SupabaseUploader, TelegramFetcher, UpdateStream,
};
use tgvault_common::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tgvault=info".parse()?))
        .init();

    info!("tgvault collector starting...");

    // Load config; missing credentials or an empty source list abort here.
    let config = Config::from_env();
    config.log_redacted();

    // Connect to Postgres and run migrations
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let writer = PgWriter::new(pool);
    writer.migrate().await?;

    // Working area for downloaded media
    tokio::fs::create_dir_all(&config.media_dir).await?;

    let telegram = TelegramClient::new(config.bot_token.clone());
    let storage = SupabaseStorageClient::new(
        &config.supabase_url,
        &config.supabase_key,
        &config.supabase_bucket,
    );

    let stream = UpdateStream::new(
        TelegramClient::new(config.bot_token.clone()),
        config.poll_timeout_secs,
    );
    let dispatcher = Dispatcher::new(config.monitored_chats.clone());
    let assembler = Assembler::new(
        TelegramFetcher::new(telegram, &config.media_dir),
        SupabaseUploader::new(storage),
    );

    info!(
        sources = config.monitored_chats.len(),
        "Listening for posts"
    );

    Collector::new(stream, dispatcher, assembler, writer).run().await
}
