// settle-worker: standalone outbox dispatcher + idempotency-cache janitor
// (§5). Runs alongside settle-api against the same Postgres database.

use clap::Parser;
use settle_core::idempotency::IdempotencyCache;
use settle_core::outbox::{OutboxWorker, OutboxWorkerConfig};
use settle_daemon::config::Config;
use settle_daemon::outbox_processor::WebhookProcessor;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

/// Event types the worker dispatches to the configured webhook, one
/// `WebhookProcessor` per type (§4.7 step 4). Kept as a flat list rather
/// than discovered dynamically since the set of event types a producer
/// may enqueue is fixed by the handlers in this binary's sibling crate.
const WEBHOOK_EVENT_TYPES: &[&str] = &[
    "payment.authorized",
    "payment.captured",
    "payment.voided",
    "payment.refunded",
    "settlement.completed",
    "withdrawal.requested",
    "withdrawal.approved",
    "withdrawal.submitted",
    "withdrawal.confirmed",
    "withdrawal.completed",
    "withdrawal.rejected",
    "withdrawal.failed",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::parse();

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_open_conns)
        .min_connections(config.database.max_idle_conns)
        .connect(&config.database.connection_url())
        .await?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let mut outbox_worker = OutboxWorker::new(
        pool.clone(),
        OutboxWorkerConfig {
            poll_interval: Duration::from_secs(config.worker.poll_interval_secs),
            batch_size: config.worker.batch_size,
            lease_ttl: Duration::from_secs(config.worker.lock_ttl_secs),
        },
    );

    if config.worker.webhook_url.is_empty() {
        log::warn!("WORKER_WEBHOOK_URL is unset: outbox events will dead-letter with no registered processor");
    } else {
        for event_type in WEBHOOK_EVENT_TYPES {
            outbox_worker.register(Arc::new(WebhookProcessor::new(
                *event_type,
                config.worker.webhook_url.clone(),
            )));
        }
    }

    let outbox_shutdown = shutdown_rx.clone();
    let outbox_handle = tokio::spawn(async move {
        outbox_worker.run(outbox_shutdown).await;
    });

    let cleaner_pool = pool.clone();
    let mut cleaner_shutdown = shutdown_rx;
    let cleaner_handle = tokio::spawn(async move {
        loop {
            let cache = IdempotencyCache::new(&cleaner_pool);
            match cache.purge_expired().await {
                Ok(0) => {}
                Ok(n) => log::debug!("idempotency cache purged {n} expired entr{}", if n == 1 { "y" } else { "ies" }),
                Err(e) => log::error!("idempotency cache purge failed: {e}"),
            }

            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(60)) => {}
                _ = cleaner_shutdown.changed() => {
                    if *cleaner_shutdown.borrow() {
                        log::info!("idempotency cache cleaner shutting down");
                        return;
                    }
                }
            }
        }
    });

    log::info!("settle-worker running");
    tokio::signal::ctrl_c().await?;
    log::info!("settle-worker received shutdown signal");
    let _ = shutdown_tx.send(true);

    let _ = tokio::join!(outbox_handle, cleaner_handle);
    Ok(())
}
