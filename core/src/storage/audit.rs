use super::{db_err, PgStorage};
use async_trait::async_trait;
use serde_json::Value;
use settle_common::domain::audit::AuditLog;
use settle_common::error::CoreResult;
use settle_common::ids::{InternalId, RequestId};
use sqlx::FromRow;

#[derive(FromRow)]
struct AuditLogRow {
    id: i64,
    actor: String,
    action: String,
    resource: String,
    before: Option<Value>,
    after: Option<Value>,
    request_id: uuid::Uuid,
    created_at: i64,
}

impl From<AuditLogRow> for AuditLog {
    fn from(row: AuditLogRow) -> Self {
        AuditLog {
            id: InternalId(row.id),
            actor: row.actor,
            action: row.action,
            resource: row.resource,
            before: row.before,
            after: row.after,
            request_id: RequestId(row.request_id),
            created_at: row.created_at as u64,
        }
    }
}

pub struct NewAuditLog {
    pub actor: String,
    pub action: String,
    pub resource: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
    pub request_id: RequestId,
}

/// Append-only (§3): no update/delete methods on this trait, mirroring
/// the domain type's own "never deleted" invariant.
#[async_trait]
pub trait AuditLogProvider: Send + Sync {
    async fn append_audit_log(&self, entry: NewAuditLog) -> CoreResult<AuditLog>;
    async fn list_audit_logs_for_resource(&self, resource: &str) -> CoreResult<Vec<AuditLog>>;
}

#[async_trait]
impl AuditLogProvider for PgStorage {
    async fn append_audit_log(&self, entry: NewAuditLog) -> CoreResult<AuditLog> {
        let now = settle_common::time::get_current_time_in_seconds() as i64;
        let row = sqlx::query_as::<_, AuditLogRow>(
            "INSERT INTO audit_logs (actor, action, resource, before, after, request_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, actor, action, resource, before, after, request_id, created_at",
        )
        .bind(entry.actor)
        .bind(entry.action)
        .bind(entry.resource)
        .bind(entry.before)
        .bind(entry.after)
        .bind(entry.request_id.0)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("append_audit_log", e))?;

        Ok(row.into())
    }

    async fn list_audit_logs_for_resource(&self, resource: &str) -> CoreResult<Vec<AuditLog>> {
        let rows = sqlx::query_as::<_, AuditLogRow>(
            "SELECT id, actor, action, resource, before, after, request_id, created_at \
             FROM audit_logs WHERE resource = $1 ORDER BY id",
        )
        .bind(resource)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("list_audit_logs_for_resource", e))?;

        Ok(rows.into_iter().map(AuditLog::from).collect())
    }
}
