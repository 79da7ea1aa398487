//! Tests for `Semaphore::acquire_async`.

#![cfg(feature = "async")]

use file_semaphore::{AcquireOptions, Semaphore, SemaphoreConfig, SemaphoreError, SystemHost};
use std::time::Duration;
use tempfile::TempDir;

#[tokio::test]
async fn acquire_async_on_free_lock() {
    let dir = TempDir::new().unwrap();
    let semaphore = Semaphore::with_defaults(dir.path().join("a.lock")).unwrap();

    let record = semaphore
        .acquire_async(AcquireOptions::default().with_tag("async"))
        .await
        .unwrap();
    assert_eq!(record.tag.as_deref(), Some("async"));
}

#[tokio::test]
async fn acquire_async_times_out() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a.lock");
    let holder = Semaphore::with_defaults(&path).unwrap();
    holder.try_acquire(None).unwrap();

    let waiter = Semaphore::with_host(
        &path,
        SemaphoreConfig::default().with_retry_interval(Duration::from_millis(10)),
        SystemHost::for_pid(1),
    )
    .unwrap();

    let err = waiter
        .acquire_async(AcquireOptions::default().with_timeout(Duration::from_millis(50)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SemaphoreError::Timeout {
            holder_pid: Some(_),
            ..
        }
    ));
}

#[tokio::test]
async fn dropped_future_leaves_no_temp_files() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a.lock");
    let holder = Semaphore::with_defaults(&path).unwrap();
    holder.try_acquire(None).unwrap();

    let waiter = Semaphore::with_host(&path, SemaphoreConfig::default(), SystemHost::for_pid(1))
        .unwrap();
    let wait = waiter.acquire_async(AcquireOptions::default());
    let result = tokio::time::timeout(Duration::from_millis(50), wait).await;
    assert!(result.is_err());

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}
