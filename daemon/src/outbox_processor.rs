//! Outbound event delivery for the Transactional Outbox (§4.7). Grounded on
//! the teacher's `daemon/src/rpc/callback.rs` `CallbackService`: a
//! `reqwest::Client` built with a fixed timeout, an HTTPS-only webhook URL
//! check, and a single POST attempt per call. The teacher's own retry loop
//! is dropped here since `OutboxWorker` already owns retry/backoff/dead-
//! lettering one layer up (§4.7 step 4) — this processor only needs to
//! report success or failure for a single attempt.

use async_trait::async_trait;
use reqwest::Client;
use settle_core::outbox::{EventProcessor, OutboxEvent};
use std::time::Duration;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivers a single outbox event type to one configured webhook URL.
/// Registered once per event type with `OutboxWorker::register` (§4.7).
pub struct WebhookProcessor {
    event_type: String,
    url: String,
    client: Client,
}

impl WebhookProcessor {
    pub fn new(event_type: impl Into<String>, url: impl Into<String>) -> Self {
        WebhookProcessor {
            event_type: event_type.into(),
            url: url.into(),
            client: Client::builder()
                .timeout(DELIVERY_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }
}

#[async_trait]
impl EventProcessor for WebhookProcessor {
    fn event_type(&self) -> &str {
        &self.event_type
    }

    async fn process(&self, event: &OutboxEvent) -> Result<(), String> {
        if !self.url.starts_with("https://") {
            return Err("webhook url must use https".to_string());
        }

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("X-Event-Type", &event.event_type)
            .header("X-Aggregate-Type", &event.aggregate_type)
            .header("X-Delivery-Attempt", (event.retry_count + 1).to_string())
            .json(&event.payload)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_else(|_| "<unreadable body>".to_string());
            Err(format!("HTTP {status}: {body}"))
        }
    }
}
