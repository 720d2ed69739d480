// Source filter and event classification.
//
// Takes one delivery batch, drops messages from non-monitored chats, and
// partitions the rest into albums and standalones. A message carrying a
// media_group_id is always claimed by its album and never emitted as a
// standalone, so album members cannot double-process. Stateless across
// batches.

use std::collections::HashMap;

use tgvault_common::{ChatRef, RawEvent, SourceMessage};

pub struct Dispatcher {
    sources: Vec<ChatRef>,
}

impl Dispatcher {
    pub fn new(sources: Vec<ChatRef>) -> Self {
        Self { sources }
    }

    /// Allow-list check against the monitored sources.
    pub fn allows(&self, msg: &SourceMessage) -> bool {
        self.sources
            .iter()
            .any(|s| s.matches(msg.chat_id, msg.chat_username.as_deref()))
    }

    /// Partition one batch into events. Albums keep member arrival order;
    /// album first-seen order and standalone positions are preserved.
    pub fn classify(&self, batch: Vec<SourceMessage>) -> Vec<RawEvent> {
        let mut events: Vec<RawEvent> = Vec::new();
        let mut album_index: HashMap<(i64, String), usize> = HashMap::new();

        for msg in batch {
            if !self.allows(&msg) {
                continue;
            }

            match msg.group_id.clone() {
                Some(group_id) => {
                    let key = (msg.chat_id, group_id.clone());
                    match album_index.get(&key).copied() {
                        Some(idx) => {
                            if let RawEvent::Album { messages, .. } = &mut events[idx] {
                                messages.push(msg);
                            }
                        }
                        None => {
                            album_index.insert(key, events.len());
                            events.push(RawEvent::Album {
                                group_id,
                                messages: vec![msg],
                            });
                        }
                    }
                }
                None => events.push(RawEvent::Standalone(msg)),
            }
        }

        events
    }
}
