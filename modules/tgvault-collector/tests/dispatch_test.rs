//! Classification tests: one delivery batch → albums + standalones.
//!
//! No I/O: batches are hand-built SourceMessage fixtures.

use tgvault_common::{parse_monitored, ChatRef, RawEvent};

use tgvault_collector::testing::{photo_message, text_message};
use tgvault_collector::Dispatcher;

fn dispatcher_for(chat_id: i64) -> Dispatcher {
    Dispatcher::new(vec![ChatRef::Id(chat_id)])
}

#[test]
fn group_member_never_standalone() {
    let dispatcher = dispatcher_for(-100123);
    let batch = vec![photo_message(-100123, 50, Some("g50"), "", None)];

    let events = dispatcher.classify(batch);

    assert_eq!(events.len(), 1);
    match &events[0] {
        RawEvent::Album { group_id, messages } => {
            assert_eq!(group_id, "g50");
            assert_eq!(messages.len(), 1);
        }
        RawEvent::Standalone(_) => panic!("group member classified as standalone"),
    }
}

#[test]
fn album_members_grouped_in_order() {
    let dispatcher = dispatcher_for(-100123);
    let batch = vec![
        photo_message(-100123, 50, Some("g50"), "", None),
        photo_message(-100123, 51, Some("g50"), "Buy now", None),
        photo_message(-100123, 52, Some("g50"), "", None),
    ];

    let events = dispatcher.classify(batch);

    assert_eq!(events.len(), 1);
    let RawEvent::Album { messages, .. } = &events[0] else {
        panic!("expected album");
    };
    let ids: Vec<i64> = messages.iter().map(|m| m.message_id).collect();
    assert_eq!(ids, vec![50, 51, 52]);
}

#[test]
fn interleaved_albums_stay_separate() {
    let dispatcher = Dispatcher::new(vec![ChatRef::Id(-1), ChatRef::Id(-2)]);
    let batch = vec![
        photo_message(-1, 10, Some("a"), "", None),
        photo_message(-2, 20, Some("a"), "", None),
        photo_message(-1, 11, Some("a"), "", None),
        photo_message(-2, 21, Some("a"), "", None),
    ];

    let events = dispatcher.classify(batch);

    // Same group id string, different chats: two albums.
    assert_eq!(events.len(), 2);
    for event in &events {
        let RawEvent::Album { messages, .. } = event else {
            panic!("expected album");
        };
        assert_eq!(messages.len(), 2);
        let chat_ids: Vec<i64> = messages.iter().map(|m| m.chat_id).collect();
        assert_eq!(chat_ids[0], chat_ids[1]);
    }
}

#[test]
fn standalone_passes_through() {
    let dispatcher = dispatcher_for(7);
    let batch = vec![text_message(7, 1, None, "hello")];

    let events = dispatcher.classify(batch);

    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], RawEvent::Standalone(m) if m.message_id == 1));
}

#[test]
fn non_monitored_chats_filtered() {
    let dispatcher = dispatcher_for(-100123);
    let batch = vec![
        photo_message(-100123, 50, None, "", None),
        photo_message(-999, 60, None, "", None),
        photo_message(-999, 61, Some("g"), "", None),
    ];

    let events = dispatcher.classify(batch);

    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], RawEvent::Standalone(m) if m.chat_id == -100123));
}

#[test]
fn handle_sources_match_by_username() {
    let dispatcher = Dispatcher::new(parse_monitored("@deals"));
    let mut allowed = photo_message(-5, 1, None, "", None);
    allowed.chat_username = Some("Deals".to_string());
    let denied = photo_message(-5, 2, None, "", None);

    let events = dispatcher.classify(vec![allowed, denied]);

    assert_eq!(events.len(), 1);
}

#[test]
fn mixed_batch_keeps_arrival_positions() {
    let dispatcher = dispatcher_for(-1);
    let batch = vec![
        text_message(-1, 1, None, "first"),
        photo_message(-1, 2, Some("g"), "", None),
        text_message(-1, 3, None, "middle"),
        photo_message(-1, 4, Some("g"), "", None),
        text_message(-1, 5, None, "last"),
    ];

    let events = dispatcher.classify(batch);

    assert_eq!(events.len(), 4);
    assert!(matches!(&events[0], RawEvent::Standalone(m) if m.message_id == 1));
    assert!(matches!(&events[1], RawEvent::Album { messages, .. } if messages.len() == 2));
    assert!(matches!(&events[2], RawEvent::Standalone(m) if m.message_id == 3));
    assert!(matches!(&events[3], RawEvent::Standalone(m) if m.message_id == 5));
}
