use chrono::{Duration, TimeZone, Utc};

use super::*;

#[test]
fn test_new_conversation() {
    let convo = Conversation::new();
    assert!(!convo.id().is_empty());
    assert_eq!(convo.title(), "New Chat");
    assert!(convo.is_empty());
    assert_eq!(convo.created_at(), convo.updated_at());

    let other = Conversation::new();
    assert_ne!(convo.id(), other.id());
}

#[test]
fn test_conversation_mutations_bump_updated_at() {
    let past = Utc::now() - Duration::hours(1);
    let mut convo = Conversation::new().with_created_at(past);

    convo.append_message(Message::new_user("Hi"));
    assert_eq!(convo.created_at(), past);
    assert!(convo.updated_at() > past);

    let after_append = convo.updated_at();
    convo.set_title("Greetings");
    assert_eq!(convo.title(), "Greetings");
    assert!(convo.updated_at() >= after_append);

    convo.clear_messages();
    assert!(convo.is_empty());
    assert_eq!(convo.title(), "Greetings");
    assert_eq!(convo.created_at(), past);
}

#[test]
fn test_touch_moves_forward_past_a_future_timestamp() {
    let future = Utc::now() + Duration::hours(1);
    let mut convo = Conversation::new().with_updated_at(future);
    convo.touch();
    assert!(convo.updated_at() > future);

    let after_touch = convo.updated_at();
    convo.append_message(Message::new_user("Hi"));
    assert!(convo.updated_at() > after_touch);
    assert!(convo.messages()[0].is_user());
}

#[test]
fn test_conversation_last_message_of() {
    let mut convo = Conversation::new();
    assert!(convo.last_message_of(None).is_none());

    convo.append_message(Message::new_user("first").with_id("u1"));
    convo.append_message(Message::new_assistant("reply").with_id("a1"));
    convo.append_message(Message::new_user("second").with_id("u2"));
    convo.append_message(Message::new_assistant("another").with_id("a2"));

    assert_eq!(convo.last_message_of(None).unwrap().id(), "a2");
    assert_eq!(convo.last_message_of(Some(Role::User)).unwrap().id(), "u2");
    assert_eq!(
        convo.last_message_of(Some(Role::Assistant)).unwrap().id(),
        "a2"
    );

    let only_assistant = Conversation::new().with_messages(vec![Message::new_assistant("hey")]);
    assert!(only_assistant.last_message_of(Some(Role::User)).is_none());
}

#[test]
fn test_build_turns() {
    let convo = Conversation::new().with_messages(vec![
        Message::new_user("Hi"),
        Message::new_assistant("Hello!"),
        Message::new_user("How are you?"),
    ]);

    let turns = convo.build_turns();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[0], ChatTurn::new(Role::User, "Hi"));
    assert_eq!(turns[1], ChatTurn::new(Role::Assistant, "Hello!"));
    assert_eq!(turns[2], ChatTurn::new(Role::User, "How are you?"));

    let json = serde_json::to_value(&turns[0]).unwrap();
    assert_eq!(json, serde_json::json!({"role": "user", "content": "Hi"}));
}

#[test]
fn test_sort_by_recent() {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut convos = vec![
        Conversation::new().with_id("old").with_created_at(base),
        Conversation::new()
            .with_id("newest")
            .with_created_at(base)
            .with_updated_at(base + Duration::days(2)),
        Conversation::new()
            .with_id("middle")
            .with_created_at(base)
            .with_updated_at(base + Duration::days(1)),
    ];

    sort_by_recent(&mut convos);
    let ids = convos.iter().map(|c| c.id()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["newest", "middle", "old"]);
}

#[test]
fn test_serialized_layout() {
    let ts = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
    let convo = Conversation::new()
        .with_id("c1")
        .with_title("Hi")
        .with_created_at(ts)
        .with_messages(vec![
            Message::new_user("Hi").with_id("m1").with_timestamp(ts),
        ]);

    let json = serde_json::to_value(&convo).unwrap();
    assert_eq!(json["id"], "c1");
    assert_eq!(json["title"], "Hi");
    assert_eq!(json["createdAt"], "2024-05-06T07:08:09Z");
    assert_eq!(json["updatedAt"], "2024-05-06T07:08:09Z");
    assert_eq!(json["messages"][0]["role"], "user");
    assert_eq!(json["messages"][0]["timestamp"], "2024-05-06T07:08:09Z");
}
