use std::io::{Error, ErrorKind};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use markwise_storage::retry::with_retry;
use markwise_storage::{RetryPolicy, StorageError};

fn io(kind: ErrorKind) -> StorageError {
    StorageError::Io {
        key: "k".into(),
        source: Error::from(kind),
    }
}

fn fast(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::from_millis(1))
}

#[tokio::test]
async fn transient_failure_then_success() {
    let calls = AtomicU32::new(0);

    let result = with_retry(fast(3), "k", || async {
        if calls.fetch_add(1, Ordering::SeqCst) < 2 {
            Err(io(ErrorKind::TimedOut))
        } else {
            Ok(42)
        }
    })
    .await;

    assert_eq!(result.unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let calls = AtomicU32::new(0);

    let err = with_retry(fast(3), "k", || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err::<(), _>(io(ErrorKind::Interrupted))
    })
    .await
    .err()
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(matches!(err, StorageError::Transient { attempts: 3, .. }));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn permanent_failure_is_not_retried() {
    let calls = AtomicU32::new(0);

    let err = with_retry(fast(5), "k", || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err::<(), _>(io(ErrorKind::PermissionDenied))
    })
    .await
    .err()
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(err, StorageError::Io { .. }));
}

#[tokio::test]
async fn zero_attempts_still_runs_once() {
    let calls = AtomicU32::new(0);
    let _ = with_retry(fast(0), "k", || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok::<_, StorageError>(())
    })
    .await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
