//! S5 (§8): the outbox worker's retry/dead-letter progression — a
//! processor that always fails must walk a row through the `2^(n-1)`
//! backoff schedule (§4.7) and land it in `dead_letter` once the retry
//! budget is spent, and an event type with no registered processor must be
//! dead-lettered on first contact rather than retried forever.

mod common;

use async_trait::async_trait;
use common::{make_outbox_entry_due_now, outbox_entry_snapshot, seed_outbox_entry};
use settle_core::outbox::{EventProcessor, OutboxEvent, OutboxWorker, OutboxWorkerConfig};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

struct AlwaysFails;

#[async_trait]
impl EventProcessor for AlwaysFails {
    fn event_type(&self) -> &str {
        "widget.touched"
    }

    async fn process(&self, _event: &OutboxEvent) -> Result<(), String> {
        Err("downstream unavailable".to_string())
    }
}

fn worker(pool: PgPool) -> OutboxWorker {
    let mut worker = OutboxWorker::new(
        pool,
        OutboxWorkerConfig {
            poll_interval: Duration::from_millis(10),
            batch_size: 10,
            lease_ttl: Duration::from_secs(30),
        },
    );
    worker.register(Arc::new(AlwaysFails));
    worker
}

#[sqlx::test(migrations = "../core/migrations")]
async fn a_permanently_failing_event_is_retried_then_dead_lettered(pool: PgPool) {
    let id = seed_outbox_entry(&pool, "widget.touched").await;
    let worker = worker(pool.clone());

    // max_retries is 5 (the default), so five failing polls walk the row
    // from retry_count 0 through 5, dead-lettering on the fifth.
    for expected_retry_count in 1..=4 {
        let claimed = worker.poll_once().await.expect("poll_once");
        assert_eq!(claimed, 1);

        let (status, retry_count) = outbox_entry_snapshot(&pool, id).await;
        assert_eq!(status, "failed");
        assert_eq!(retry_count, expected_retry_count);

        // The claim-time lease is still outstanding and `fail_or_dead_letter`
        // never clears it, so a second poll in the same instant claims
        // nothing until the row is backdated past both the lease and the
        // backoff delay.
        let claimed_too_soon = worker.poll_once().await.expect("poll_once");
        assert_eq!(claimed_too_soon, 0);

        make_outbox_entry_due_now(&pool, id).await;
    }

    let claimed = worker.poll_once().await.expect("poll_once");
    assert_eq!(claimed, 1);
    let (status, retry_count) = outbox_entry_snapshot(&pool, id).await;
    assert_eq!(status, "dead_letter");
    assert_eq!(retry_count, 5);

    // Dead-lettered rows are excluded from future claims (`retry_count <
    // max_retries` in the claim query) even once backdated again.
    make_outbox_entry_due_now(&pool, id).await;
    let claimed_after_dead_letter = worker.poll_once().await.expect("poll_once");
    assert_eq!(claimed_after_dead_letter, 0);
}

#[sqlx::test(migrations = "../core/migrations")]
async fn an_event_with_no_registered_processor_is_dead_lettered_immediately(pool: PgPool) {
    let id = seed_outbox_entry(&pool, "no.such.processor").await;
    let worker = worker(pool.clone());

    let claimed = worker.poll_once().await.expect("poll_once");
    assert_eq!(claimed, 1);

    let (status, retry_count) = outbox_entry_snapshot(&pool, id).await;
    assert_eq!(status, "dead_letter");
    assert_eq!(retry_count, 0);
}
