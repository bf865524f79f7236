use crate::ids::{InternalId, OutboxEntryId};
use crate::time::TimestampSeconds;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutboxStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    DeadLetter,
}

/// Default maximum delivery attempts before an entry dead-letters (§3).
pub const DEFAULT_MAX_RETRIES: i32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxEntry {
    pub id: OutboxEntryId,
    pub event_type: String,
    pub aggregate_type: String,
    pub aggregate_id: InternalId,
    pub payload: Value,
    pub status: OutboxStatus,
    pub retry_count: i32,
    pub max_retries: i32,
    pub next_retry_at: TimestampSeconds,
    pub error_message: Option<String>,
    pub lease_owner: Option<String>,
    pub lease_expiry: Option<TimestampSeconds>,
    pub created_at: TimestampSeconds,
}

impl OutboxEntry {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, OutboxStatus::Completed | OutboxStatus::DeadLetter)
    }
}
