use crate::ids::{InternalId, RequestId};
use crate::time::TimestampSeconds;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Append-only, never deleted (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: InternalId,
    pub actor: String,
    pub action: String,
    pub resource: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
    pub request_id: RequestId,
    pub created_at: TimestampSeconds,
}
