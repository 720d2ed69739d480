// The single logical event loop: poll, classify, assemble, commit.
// One event/album is processed end to end before the next; no failure
// crosses a post's boundary into another post's processing.

use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use tgvault_common::RawEvent;

use crate::assembler::Assembler;
use crate::dispatcher::Dispatcher;
use crate::traits::{MediaFetcher, MediaUploader, MessageSource, PostWriter};

/// Pause after a failed poll so a dead endpoint can't hot-loop us.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

pub struct Collector<S, F, U, W> {
    source: S,
    dispatcher: Dispatcher,
    assembler: Assembler<F, U>,
    writer: W,
}

impl<S, F, U, W> Collector<S, F, U, W>
where
    S: MessageSource,
    F: MediaFetcher,
    U: MediaUploader,
    W: PostWriter,
{
    pub fn new(source: S, dispatcher: Dispatcher, assembler: Assembler<F, U>, writer: W) -> Self {
        Self {
            source,
            dispatcher,
            assembler,
            writer,
        }
    }

    /// Run until the source ends. The real update stream never ends, so in
    /// production this returns only on scripted/test sources.
    pub async fn run(mut self) -> Result<()> {
        info!("Collector started");

        loop {
            let batch = match self.source.next_batch().await {
                Ok(Some(batch)) => batch,
                Ok(None) => {
                    info!("Source stream ended");
                    return Ok(());
                }
                Err(e) => {
                    warn!(error = %e, "Update poll failed");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };

            for event in self.dispatcher.classify(batch) {
                self.process(event).await;
            }
        }
    }

    async fn process(&self, event: RawEvent) {
        let Some(post) = self.assembler.assemble(&event).await else {
            return;
        };

        info!(
            chat_id = post.chat_id,
            msg_id = post.msg_id,
            images = post.images_count,
            "Assembled post"
        );

        if let Err(e) = self.writer.commit(&post).await {
            warn!(
                chat_id = post.chat_id,
                msg_id = post.msg_id,
                error = %e,
                "Failed to write post, discarding"
            );
        }
    }
}
