//! S6 (§8): distributed lock contention and release, driven directly
//! against a real Redis connection rather than through an HTTP surface —
//! no handler exposes `acquire`/`release` as its own endpoint, settlement
//! execution uses them internally (§4.5).

mod common;

use common::test_config;
use settle_core::lock::DistributedLock;
use settle_core::kv::KvStore;
use settle_common::error::{CoreError, LockError};
use std::time::Duration;

fn lock() -> DistributedLock {
    let kv = KvStore::new(&test_config().redis.connection_url()).expect("KvStore::new");
    DistributedLock::new(kv)
}

#[tokio::test]
async fn a_second_acquire_on_a_held_resource_fails_with_lock_not_acquired() {
    let lock = lock();
    let resource = format!("test-resource-{}", uuid::Uuid::new_v4());

    let first = lock.acquire(&resource, Duration::from_secs(30)).await.expect("first acquire");

    let second = lock.acquire(&resource, Duration::from_secs(30)).await;
    assert!(matches!(second, Err(CoreError::Lock(LockError::LockNotAcquired))));

    lock.release(&first).await.expect("release");
}

#[tokio::test]
async fn release_then_reacquire_succeeds() {
    let lock = lock();
    let resource = format!("test-resource-{}", uuid::Uuid::new_v4());

    let first = lock.acquire(&resource, Duration::from_secs(30)).await.expect("first acquire");
    lock.release(&first).await.expect("release");

    let second = lock.acquire(&resource, Duration::from_secs(30)).await;
    assert!(second.is_ok());
    lock.release(&second.unwrap()).await.expect("release again");
}

#[tokio::test]
async fn extend_succeeds_while_held_and_fails_once_released() {
    let lock = lock();
    let resource = format!("test-resource-{}", uuid::Uuid::new_v4());

    let handle = lock.acquire(&resource, Duration::from_secs(5)).await.expect("acquire");
    lock.extend(&handle, Duration::from_secs(30)).await.expect("extend while held");

    lock.release(&handle).await.expect("release");
    let extend_after_release = lock.extend(&handle, Duration::from_secs(30)).await;
    assert!(matches!(extend_after_release, Err(CoreError::Lock(LockError::LockNotHeld))));
}

#[tokio::test]
async fn acquire_many_releases_every_lock_it_took_when_a_later_one_is_contended() {
    let lock = lock();
    let suffix = uuid::Uuid::new_v4();
    let a = format!("a-{suffix}");
    let b = format!("b-{suffix}");

    // Pre-hold `b` so `acquire_many` fails partway through (it sorts
    // ascending, so `a` is acquired first, then `b` is contended).
    let held_b = lock.acquire(&b, Duration::from_secs(30)).await.expect("pre-acquire b");

    let result = lock.acquire_many(&[b.clone(), a.clone()], Duration::from_secs(30)).await;
    assert!(matches!(result, Err(CoreError::Lock(LockError::LockNotAcquired))));

    // `a` must have been released again during the unwind, not left held.
    let reacquire_a = lock.acquire(&a, Duration::from_secs(30)).await;
    assert!(reacquire_a.is_ok());

    lock.release(&held_b).await.expect("release b");
    lock.release(&reacquire_a.unwrap()).await.expect("release a");
}
