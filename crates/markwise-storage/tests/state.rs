use std::sync::Arc;

use markwise_storage::state::{create_state, load_state, load_state_opt, save_state, update_state};
use markwise_storage::{Bucket, RetryPolicy, StorageError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct Counter {
    n: u32,
    tags: Vec<String>,
}

async fn bucket() -> (tempfile::TempDir, Bucket) {
    let dir = tempfile::tempdir().unwrap();
    let bucket = Bucket::open(dir.path(), RetryPolicy::default())
        .await
        .unwrap();
    (dir, bucket)
}

#[tokio::test]
async fn save_and_load_round_trip() {
    let (_dir, bucket) = bucket().await;
    let value = Counter {
        n: 3,
        tags: vec!["x".into()],
    };

    let etag = save_state(&bucket, "c.json", &value).await.unwrap();
    let (loaded, loaded_etag): (Counter, String) = load_state(&bucket, "c.json").await.unwrap();

    assert_eq!(loaded, value);
    assert_eq!(loaded_etag, etag);
}

#[tokio::test]
async fn load_opt_maps_missing_to_none() {
    let (_dir, bucket) = bucket().await;
    let loaded: Option<Counter> = load_state_opt(&bucket, "none.json").await.unwrap();
    assert!(loaded.is_none());
}

#[tokio::test]
async fn create_state_is_exclusive() {
    let (_dir, bucket) = bucket().await;

    create_state(&bucket, "c.json", &Counter::default())
        .await
        .unwrap();
    let err = create_state(&bucket, "c.json", &Counter::default())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, StorageError::AlreadyExists { .. }));
}

#[tokio::test]
async fn corrupt_state_is_a_serialization_error() {
    let (_dir, bucket) = bucket().await;
    markwise_storage::objects::put_object(&bucket, "bad.json", b"not json".to_vec())
        .await
        .unwrap();

    let err = load_state::<Counter>(&bucket, "bad.json")
        .await
        .err()
        .unwrap();
    assert!(matches!(err, StorageError::Serialization(_)));
}

#[tokio::test]
async fn concurrent_updates_are_not_lost() {
    let (_dir, bucket) = bucket().await;
    let bucket = Arc::new(bucket);

    let mut handles = Vec::new();
    for i in 0..8 {
        let bucket = bucket.clone();
        handles.push(tokio::spawn(async move {
            update_state(&bucket, "counter.json", |c: &mut Counter| {
                c.n += 1;
                c.tags.push(format!("t{i}"));
            })
            .await
            .unwrap();
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let (counter, _): (Counter, _) = load_state(&bucket, "counter.json").await.unwrap();
    assert_eq!(counter.n, 8);
    assert_eq!(counter.tags.len(), 8);
}
