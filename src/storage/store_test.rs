use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};

use crate::{
    models::{Message, Role},
    storage::{MemorySlot, Slot},
};

use super::*;

fn conversation(i: usize) -> Conversation {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Conversation::new()
        .with_id(format!("c{i:02}"))
        .with_title(format!("Title {i:02}"))
        .with_created_at(base)
        .with_updated_at(base + Duration::minutes(i as i64))
}

fn conversations(n: usize) -> Vec<Conversation> {
    (0..n).map(conversation).collect()
}

fn store_with(slot: MemorySlot) -> (Arc<MemorySlot>, ConversationStore) {
    let slot = Arc::new(slot);
    let store = ConversationStore::new(slot.clone());
    (slot, store)
}

struct BrokenSlot;

#[async_trait]
impl Slot for BrokenSlot {
    async fn read(&self) -> Result<Option<String>, SlotError> {
        Err(SlotError::Io(std::io::Error::other("disk on fire")))
    }

    async fn write(&self, _blob: String) -> Result<(), SlotError> {
        Err(SlotError::Io(std::io::Error::other("disk on fire")))
    }
}

#[tokio::test]
async fn test_load_all_empty_or_corrupt() {
    for blob in [
        "",
        "   ",
        "not json",
        "{\"id\": \"c1\"}",
        "42",
        "null",
        "[{\"id\": \"c1\"}]",
        "[{\"id\":\"c1\",\"title\":\"t\",\"messages\":[],\"createdAt\":\"yesterday\",\"updatedAt\":\"2024-01-01T00:00:00Z\"}]",
    ] {
        let (_, store) = store_with(MemorySlot::default().with_blob(blob));
        assert!(store.load_all().await.is_empty(), "blob: {blob:?}");
    }

    let (_, store) = store_with(MemorySlot::default());
    assert!(store.load_all().await.is_empty());

    let store = ConversationStore::new(Arc::new(BrokenSlot));
    assert!(store.load_all().await.is_empty());
}

#[tokio::test]
async fn test_round_trip() {
    let ts = Utc.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).unwrap() + Duration::nanoseconds(123_456_789);
    let convo = Conversation::new()
        .with_id("c1")
        .with_title("Hi")
        .with_created_at(ts)
        .with_updated_at(ts + Duration::seconds(3))
        .with_messages(vec![
            Message::new_user("Hi").with_id("m1").with_timestamp(ts),
            Message::new_assistant("Hello!\nHow can I help?")
                .with_id("m2")
                .with_timestamp(ts + Duration::seconds(3)),
        ]);

    let (_, store) = store_with(MemorySlot::default());
    let outcome = store.save_all(&[convo.clone()]).await.unwrap();
    assert_eq!(outcome, SaveOutcome::Saved);

    let loaded = store.load_all().await;
    assert_eq!(loaded, vec![convo]);
    assert_eq!(loaded[0].messages()[1].role(), Role::Assistant);
}

#[tokio::test]
async fn test_load_tolerates_foreign_timestamps_and_extra_fields() {
    let blob = r#"[{
        "id": "conv-1700000000000",
        "title": "From the browser",
        "pinned": true,
        "createdAt": "2023-11-14T22:13:20.000Z",
        "updatedAt": "2023-11-14T23:13:20.000+01:00",
        "messages": [
            {"id": "user-1", "role": "user", "content": "Hi", "timestamp": "2023-11-14T22:13:20.000Z", "extra": 1}
        ]
    }]"#;

    let (_, store) = store_with(MemorySlot::default().with_blob(blob));
    let loaded = store.load_all().await;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id(), "conv-1700000000000");
    assert_eq!(loaded[0].created_at(), loaded[0].updated_at());
    assert_eq!(loaded[0].messages()[0].content(), "Hi");
}

#[tokio::test]
async fn test_load_dedups_ids() {
    let older = conversation(1).with_id("dup").with_title("older");
    let newer = conversation(5).with_id("dup").with_title("newer");
    let other = conversation(3);
    let blob = encode(&[older, other, newer]).unwrap();

    let (_, store) = store_with(MemorySlot::default().with_blob(blob));
    let loaded = store.load_all().await;
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].id(), "dup");
    assert_eq!(loaded[0].title(), "newer");
    assert_eq!(loaded[1].id(), "c03");
}

#[tokio::test]
async fn test_upsert_and_remove() {
    let (_, store) = store_with(MemorySlot::default());

    store.upsert(conversation(1)).await.unwrap();
    store.upsert(conversation(2)).await.unwrap();
    assert_eq!(store.load_all().await.len(), 2);

    let renamed = conversation(1).with_title("Renamed");
    store.upsert(renamed).await.unwrap();
    let loaded = store.load_all().await;
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].id(), "c01");
    assert_eq!(loaded[0].title(), "Renamed");

    store.remove("c01").await.unwrap();
    let loaded = store.load_all().await;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id(), "c02");

    store.remove("missing").await.unwrap();
    assert_eq!(store.load_all().await.len(), 1);
}

#[tokio::test]
async fn test_save_all_quota_trims_to_most_recent() {
    let all = conversations(60);
    let mut expected = all.clone();
    sort_by_recent(&mut expected);
    expected.truncate(MAX_CONVERSATIONS);
    let quota = encode(&expected).unwrap().len();

    let (slot, store) = store_with(MemorySlot::default().with_quota(Some(quota)));
    let outcome = store.save_all(&all).await.unwrap();

    let dropped = (0..10).rev().map(|i| format!("c{i:02}")).collect::<Vec<_>>();
    assert_eq!(outcome, SaveOutcome::Trimmed { dropped });
    assert_eq!(slot.writes(), 1);

    let loaded = store.load_all().await;
    assert_eq!(loaded.len(), MAX_CONVERSATIONS);
    assert_eq!(loaded, expected);
    assert!(loaded.iter().all(|c| c.id() >= "c10"));
}

#[tokio::test]
async fn test_save_all_quota_retry_fails() {
    let (slot, store) = store_with(MemorySlot::default().with_quota(Some(100)));

    let err = store.save_all(&conversations(60)).await.unwrap_err();
    assert!(matches!(err, StorageError::QuotaExceeded));
    assert!(err.to_string().contains("Storage quota exceeded"));
    assert_eq!(slot.writes(), 0);
    assert!(slot.blob().is_none());
}

#[tokio::test]
async fn test_save_all_quota_under_cap_surfaces_error() {
    let existing = encode(&conversations(1)).unwrap();
    let quota = existing.len();
    let (slot, store) = store_with(
        MemorySlot::default()
            .with_quota(Some(quota))
            .with_blob(existing.clone()),
    );

    let err = store.save_all(&conversations(10)).await.unwrap_err();
    assert!(matches!(err, StorageError::QuotaExceeded));
    // Nothing was dropped behind the caller's back.
    assert_eq!(slot.blob(), Some(existing));
}

#[tokio::test]
async fn test_save_all_medium_fault() {
    let store = ConversationStore::new(Arc::new(BrokenSlot));
    let err = store.save_all(&conversations(60)).await.unwrap_err();
    assert!(matches!(err, StorageError::Medium(_)));
    assert!(err.to_string().contains("disk on fire"));
}

#[tokio::test]
async fn test_configurable_retention_cap() {
    let all = conversations(5);
    let mut expected = all.clone();
    sort_by_recent(&mut expected);
    expected.truncate(3);
    let quota = encode(&expected).unwrap().len();

    let slot = Arc::new(MemorySlot::default().with_quota(Some(quota)));
    let store = ConversationStore::new(slot).with_max_conversations(3);
    assert_eq!(store.max_conversations(), 3);
    assert_eq!(
        ConversationStore::new(Arc::new(MemorySlot::default()))
            .with_max_conversations(0)
            .max_conversations(),
        1
    );
    let outcome = store.save_all(&all).await.unwrap();
    assert_eq!(
        outcome,
        SaveOutcome::Trimmed {
            dropped: vec!["c01".to_string(), "c00".to_string()]
        }
    );
    assert_eq!(store.load_all().await, expected);
}
