//! Transactional Outbox + Worker (§2 OB, §4.7): producers `enqueue` an
//! event in the same unit of work as the business write; a worker polls,
//! leases, dispatches, retries with exponential backoff, and dead-letters
//! exhausted rows. Retry/backoff shape is grounded on the teacher's
//! `daemon/src/rpc/callback.rs` `CallbackService::deliver_with_retry`
//! (attempt loop, per-attempt delay, terminal failure after the retry
//! budget), generalized from a fixed delay table to the spec's
//! `delay(n) = 2^(n-1)` formula and from an in-process retry loop to a
//! claim-lease-dispatch cycle so crashed workers recover (§4.7 step 4).

use async_trait::async_trait;
use serde_json::Value;
use settle_common::error::CoreResult;
use settle_common::ids::{InternalId, OutboxEntryId};
use sqlx::{FromRow, PgPool, Postgres};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::lock::random_owner_token;
use crate::storage::db_err;

#[derive(FromRow)]
struct OutboxRow {
    external_id: uuid::Uuid,
    event_type: String,
    aggregate_type: String,
    aggregate_id: i64,
    payload: Value,
    retry_count: i32,
    max_retries: i32,
}

/// A delivered event, as handed to a registered `EventProcessor`.
pub struct OutboxEvent {
    pub id: OutboxEntryId,
    pub event_type: String,
    pub aggregate_type: String,
    pub aggregate_id: InternalId,
    pub payload: Value,
    pub retry_count: i32,
}

impl From<OutboxRow> for OutboxEvent {
    fn from(row: OutboxRow) -> Self {
        OutboxEvent {
            id: OutboxEntryId(row.external_id),
            event_type: row.event_type,
            aggregate_type: row.aggregate_type,
            aggregate_id: InternalId(row.aggregate_id),
            payload: row.payload,
            retry_count: row.retry_count,
        }
    }
}

/// A handler for one `event_type`. Must be duplicate-safe: the worker
/// guarantees at-least-once delivery, never exactly-once (§4.7).
#[async_trait]
pub trait EventProcessor: Send + Sync {
    fn event_type(&self) -> &str;
    async fn process(&self, event: &OutboxEvent) -> Result<(), String>;
}

/// Writes a new `Pending` outbox row. Callers pass the open transaction of
/// their own unit of work so the event commits atomically with the
/// business write it describes (§4.7: "same database transaction").
pub async fn enqueue(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    event_type: &str,
    aggregate_type: &str,
    aggregate_id: InternalId,
    payload: Value,
) -> CoreResult<OutboxEntryId> {
    let now = settle_common::time::get_current_time_in_seconds() as i64;
    let external_id = uuid::Uuid::new_v4();
    sqlx::query(
        "INSERT INTO outbox_entries \
         (external_id, event_type, aggregate_type, aggregate_id, payload, status, \
          retry_count, max_retries, next_retry_at, created_at) \
         VALUES ($1, $2, $3, $4, $5, 'pending', 0, $6, $7, $7)",
    )
    .bind(external_id)
    .bind(event_type)
    .bind(aggregate_type)
    .bind(aggregate_id.0)
    .bind(payload)
    .bind(settle_common::domain::outbox::DEFAULT_MAX_RETRIES)
    .bind(now)
    .execute(&mut **tx)
    .await
    .map_err(|e| db_err("enqueue", e))?;

    Ok(OutboxEntryId(external_id))
}

/// Exponential backoff per §4.7: `delay(n) = 2^(n-1)` seconds, n = retry
/// count after the failing attempt (1, 2, 4, 8, 16, ...).
fn backoff_seconds(retry_count: i32) -> i64 {
    1i64.checked_shl((retry_count - 1).max(0) as u32).unwrap_or(i64::MAX)
}

pub struct OutboxWorkerConfig {
    pub poll_interval: Duration,
    pub batch_size: i64,
    pub lease_ttl: Duration,
}

impl Default for OutboxWorkerConfig {
    fn default() -> Self {
        OutboxWorkerConfig {
            poll_interval: Duration::from_secs(1),
            batch_size: 50,
            lease_ttl: Duration::from_secs(30),
        }
    }
}

pub struct OutboxWorker {
    pool: PgPool,
    config: OutboxWorkerConfig,
    processors: HashMap<String, Arc<dyn EventProcessor>>,
}

impl OutboxWorker {
    pub fn new(pool: PgPool, config: OutboxWorkerConfig) -> Self {
        OutboxWorker {
            pool,
            config,
            processors: HashMap::new(),
        }
    }

    pub fn register(&mut self, processor: Arc<dyn EventProcessor>) {
        self.processors.insert(processor.event_type().to_string(), processor);
    }

    /// Runs the poll/lease/dispatch/retry cycle until `shutdown` fires,
    /// sleeping `poll_interval` between empty batches (§4.7, §5 — the
    /// worker is a dedicated task with a single-threaded polling loop).
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        loop {
            match self.poll_once().await {
                Ok(0) => {}
                Ok(n) => log::debug!("outbox worker dispatched {n} event(s)"),
                Err(e) => log::error!("outbox poll failed: {e}"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        log::info!("outbox worker shutting down");
                        return;
                    }
                }
            }
        }
    }

    /// One poll cycle: claims a batch, dispatches each leased row, and
    /// returns how many were processed (any outcome, including
    /// dead-letter).
    pub async fn poll_once(&self) -> CoreResult<usize> {
        let lease_owner = random_owner_token();
        let now = settle_common::time::get_current_time_in_seconds() as i64;
        let lease_expiry = now + self.config.lease_ttl.as_secs() as i64;

        let rows = sqlx::query_as::<_, OutboxRow>(
            "UPDATE outbox_entries SET status = 'processing', lease_owner = $1, lease_expiry = $2 \
             WHERE external_id IN ( \
                 SELECT external_id FROM outbox_entries \
                 WHERE status IN ('pending', 'failed') \
                   AND next_retry_at <= $3 \
                   AND (lease_expiry IS NULL OR lease_expiry <= $3) \
                   AND retry_count < max_retries \
                 ORDER BY created_at \
                 LIMIT $4 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING external_id, event_type, aggregate_type, aggregate_id, payload, retry_count, max_retries",
        )
        .bind(&lease_owner)
        .bind(lease_expiry)
        .bind(now)
        .bind(self.config.batch_size)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("outbox:claim", e))?;

        let claimed = rows.len();
        for row in rows {
            self.dispatch(row).await;
        }
        Ok(claimed)
    }

    async fn dispatch(&self, row: OutboxRow) {
        let event: OutboxEvent = row.into();
        let Some(processor) = self.processors.get(&event.event_type) else {
            if let Err(e) = self.dead_letter(&event.id, "unknown event type").await {
                log::error!("failed to dead-letter outbox entry {}: {e}", event.id);
            }
            return;
        };

        match processor.process(&event).await {
            Ok(()) => {
                if let Err(e) = self.complete(&event.id).await {
                    log::error!("failed to complete outbox entry {}: {e}", event.id);
                }
                metrics::counter!("settle_outbox_dispatch_success_total").increment(1);
            }
            Err(failure) => {
                metrics::counter!("settle_outbox_dispatch_failure_total").increment(1);
                if let Err(e) = self.fail_or_dead_letter(&event.id, event.retry_count, &failure).await {
                    log::error!("failed to record outbox failure for {}: {e}", event.id);
                }
            }
        }
    }

    async fn complete(&self, id: &OutboxEntryId) -> CoreResult<()> {
        sqlx::query("UPDATE outbox_entries SET status = 'completed' WHERE external_id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("outbox:complete", e))?;
        Ok(())
    }

    async fn dead_letter(&self, id: &OutboxEntryId, reason: &str) -> CoreResult<()> {
        sqlx::query("UPDATE outbox_entries SET status = 'dead_letter', error_message = $1 WHERE external_id = $2")
            .bind(reason)
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("outbox:dead_letter", e))?;
        Ok(())
    }

    async fn fail_or_dead_letter(&self, id: &OutboxEntryId, retry_count_before: i32, error: &str) -> CoreResult<()> {
        let retry_count = retry_count_before + 1;
        let row = sqlx::query_as::<_, (i32,)>("SELECT max_retries FROM outbox_entries WHERE external_id = $1")
            .bind(id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_err("outbox:read_max_retries", e))?;
        let max_retries = row.0;

        if retry_count >= max_retries {
            sqlx::query(
                "UPDATE outbox_entries SET status = 'dead_letter', retry_count = $1, error_message = $2 \
                 WHERE external_id = $3",
            )
            .bind(retry_count)
            .bind(error)
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("outbox:dead_letter_exhausted", e))?;
            return Ok(());
        }

        let now = settle_common::time::get_current_time_in_seconds() as i64;
        let next_retry_at = now + backoff_seconds(retry_count);
        sqlx::query(
            "UPDATE outbox_entries SET status = 'failed', retry_count = $1, next_retry_at = $2, \
             error_message = $3 WHERE external_id = $4",
        )
        .bind(retry_count)
        .bind(next_retry_at)
        .bind(error)
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("outbox:schedule_retry", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_each_retry() {
        assert_eq!(backoff_seconds(1), 1);
        assert_eq!(backoff_seconds(2), 2);
        assert_eq!(backoff_seconds(3), 4);
        assert_eq!(backoff_seconds(4), 8);
        assert_eq!(backoff_seconds(5), 16);
    }
}
