use super::{db_err, PgStorage};
use async_trait::async_trait;
use rust_decimal::Decimal;
use settle_common::domain::settlement::{Settlement, SettlementStatus};
use settle_common::error::{CoreError, CoreResult};
use settle_common::ids::{PaymentId, SettlementId};
use settle_common::money::Money;
use sqlx::FromRow;

fn parse_status(s: &str) -> SettlementStatus {
    match s {
        "processing" => SettlementStatus::Processing,
        "completed" => SettlementStatus::Completed,
        "failed" => SettlementStatus::Failed,
        _ => SettlementStatus::Pending,
    }
}

pub(crate) fn status_str(s: SettlementStatus) -> &'static str {
    match s {
        SettlementStatus::Pending => "pending",
        SettlementStatus::Processing => "processing",
        SettlementStatus::Completed => "completed",
        SettlementStatus::Failed => "failed",
    }
}

#[derive(FromRow)]
struct SettlementRow {
    external_id: uuid::Uuid,
    payment_external_id: uuid::Uuid,
    amount: Decimal,
    status: String,
    created_at: i64,
    updated_at: i64,
}

impl From<SettlementRow> for Settlement {
    fn from(row: SettlementRow) -> Self {
        Settlement {
            id: SettlementId(row.external_id),
            payment_id: PaymentId(row.payment_external_id),
            amount: Money::from(row.amount),
            status: parse_status(&row.status),
            created_at: row.created_at as u64,
            updated_at: row.updated_at as u64,
        }
    }
}

#[async_trait]
pub trait SettlementProvider: Send + Sync {
    async fn create_settlement(&self, payment_id: PaymentId, amount: Money) -> CoreResult<Settlement>;
    async fn get_settlement(&self, id: SettlementId) -> CoreResult<Settlement>;
    async fn set_settlement_status(
        &self,
        id: SettlementId,
        status: SettlementStatus,
        now: u64,
    ) -> CoreResult<Settlement>;
}

#[async_trait]
impl SettlementProvider for PgStorage {
    async fn create_settlement(&self, payment_id: PaymentId, amount: Money) -> CoreResult<Settlement> {
        let now = settle_common::time::get_current_time_in_seconds() as i64;
        let external_id = uuid::Uuid::new_v4();
        sqlx::query(
            "INSERT INTO settlements (external_id, payment_external_id, amount, status, created_at, updated_at) \
             VALUES ($1, $2, $3, 'pending', $4, $4)",
        )
        .bind(external_id)
        .bind(payment_id.0)
        .bind(amount.as_decimal())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("create_settlement", e))?;

        self.get_settlement(SettlementId(external_id)).await
    }

    async fn get_settlement(&self, id: SettlementId) -> CoreResult<Settlement> {
        sqlx::query_as::<_, SettlementRow>(
            "SELECT external_id, payment_external_id, amount, status, created_at, updated_at \
             FROM settlements WHERE external_id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("get_settlement", e))?
        .map(Settlement::from)
        .ok_or_else(|| CoreError::NotFound(format!("settlement {id}")))
    }

    async fn set_settlement_status(
        &self,
        id: SettlementId,
        status: SettlementStatus,
        now: u64,
    ) -> CoreResult<Settlement> {
        sqlx::query("UPDATE settlements SET status = $1, updated_at = $2 WHERE external_id = $3")
            .bind(status_str(status))
            .bind(now as i64)
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("set_settlement_status", e))?;

        self.get_settlement(id).await
    }
}

/// Transaction-scoped settlement reads/writes so `execute` can create the
/// row, drive it Processing -> Completed, and enqueue the completion event
/// under one unit of work instead of three auto-committed statements.
pub async fn create_settlement_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    payment_id: PaymentId,
    amount: Money,
) -> CoreResult<Settlement> {
    let now = settle_common::time::get_current_time_in_seconds() as i64;
    let external_id = uuid::Uuid::new_v4();
    sqlx::query(
        "INSERT INTO settlements (external_id, payment_external_id, amount, status, created_at, updated_at) \
         VALUES ($1, $2, $3, 'pending', $4, $4)",
    )
    .bind(external_id)
    .bind(payment_id.0)
    .bind(amount.as_decimal())
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| db_err("create_settlement", e))?;

    get_settlement_tx(tx, SettlementId(external_id)).await
}

pub async fn get_settlement_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: SettlementId,
) -> CoreResult<Settlement> {
    sqlx::query_as::<_, SettlementRow>(
        "SELECT external_id, payment_external_id, amount, status, created_at, updated_at \
         FROM settlements WHERE external_id = $1",
    )
    .bind(id.0)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| db_err("get_settlement", e))?
    .map(Settlement::from)
    .ok_or_else(|| CoreError::NotFound(format!("settlement {id}")))
}

pub async fn set_settlement_status_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: SettlementId,
    status: SettlementStatus,
    now: u64,
) -> CoreResult<Settlement> {
    sqlx::query("UPDATE settlements SET status = $1, updated_at = $2 WHERE external_id = $3")
        .bind(status_str(status))
        .bind(now as i64)
        .bind(id.0)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_err("set_settlement_status", e))?;

    get_settlement_tx(tx, id).await
}
