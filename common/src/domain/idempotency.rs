use crate::time::TimestampSeconds;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default TTL for general mutating endpoints; payment-class operations
/// use `PAYMENT_TTL_SECONDS` instead (§4.8).
pub const DEFAULT_TTL_SECONDS: i64 = 24 * 60 * 60;
pub const PAYMENT_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdempotencyKey {
    pub key: String,
    pub request_path: String,
    pub request_hash: String,
    pub response_status: u16,
    pub response_body: Value,
    pub expires_at: TimestampSeconds,
}
