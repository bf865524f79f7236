use super::{db_err, PgStorage};
use async_trait::async_trait;
use rust_decimal::Decimal;
use settle_common::domain::deposit::{Deposit, DepositStatus};
use settle_common::error::{CoreError, CoreResult};
use settle_common::ids::{AccountId, DepositId};
use settle_common::money::Money;
use sqlx::FromRow;

fn parse_status(s: &str) -> DepositStatus {
    match s {
        "confirming" => DepositStatus::Confirming,
        "credited" => DepositStatus::Credited,
        "completed" => DepositStatus::Completed,
        "failed" => DepositStatus::Failed,
        _ => DepositStatus::Detected,
    }
}

pub(crate) fn status_str(s: DepositStatus) -> &'static str {
    match s {
        DepositStatus::Detected => "detected",
        DepositStatus::Confirming => "confirming",
        DepositStatus::Credited => "credited",
        DepositStatus::Completed => "completed",
        DepositStatus::Failed => "failed",
    }
}

#[derive(FromRow)]
struct DepositRow {
    external_id: uuid::Uuid,
    account_id: uuid::Uuid,
    amount: Decimal,
    chain_tx_hash: String,
    status: String,
    created_at: i64,
    updated_at: i64,
}

impl From<DepositRow> for Deposit {
    fn from(row: DepositRow) -> Self {
        Deposit {
            id: DepositId(row.external_id),
            account_id: AccountId(row.account_id),
            amount: Money::from(row.amount),
            chain_tx_hash: row.chain_tx_hash,
            status: parse_status(&row.status),
            created_at: row.created_at as u64,
            updated_at: row.updated_at as u64,
        }
    }
}

#[async_trait]
pub trait DepositProvider: Send + Sync {
    async fn record_deposit(&self, account: AccountId, amount: Money, chain_tx_hash: &str) -> CoreResult<Deposit>;
    async fn get_deposit(&self, id: DepositId) -> CoreResult<Deposit>;
    async fn get_deposit_by_tx_hash(&self, chain_tx_hash: &str) -> CoreResult<Option<Deposit>>;
    async fn set_deposit_status(&self, id: DepositId, status: DepositStatus, now: u64) -> CoreResult<Deposit>;
}

#[async_trait]
impl DepositProvider for PgStorage {
    async fn record_deposit(&self, account: AccountId, amount: Money, chain_tx_hash: &str) -> CoreResult<Deposit> {
        let now = settle_common::time::get_current_time_in_seconds() as i64;
        let external_id = uuid::Uuid::new_v4();
        sqlx::query(
            "INSERT INTO deposits (external_id, account_id, amount, chain_tx_hash, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, 'detected', $5, $5)",
        )
        .bind(external_id)
        .bind(account.0)
        .bind(amount.as_decimal())
        .bind(chain_tx_hash)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("record_deposit", e))?;

        self.get_deposit(DepositId(external_id)).await
    }

    async fn get_deposit(&self, id: DepositId) -> CoreResult<Deposit> {
        sqlx::query_as::<_, DepositRow>(
            "SELECT external_id, account_id, amount, chain_tx_hash, status, created_at, updated_at \
             FROM deposits WHERE external_id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("get_deposit", e))?
        .map(Deposit::from)
        .ok_or_else(|| CoreError::NotFound(format!("deposit {id}")))
    }

    async fn get_deposit_by_tx_hash(&self, chain_tx_hash: &str) -> CoreResult<Option<Deposit>> {
        let row = sqlx::query_as::<_, DepositRow>(
            "SELECT external_id, account_id, amount, chain_tx_hash, status, created_at, updated_at \
             FROM deposits WHERE chain_tx_hash = $1",
        )
        .bind(chain_tx_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("get_deposit_by_tx_hash", e))?;

        Ok(row.map(Deposit::from))
    }

    async fn set_deposit_status(&self, id: DepositId, status: DepositStatus, now: u64) -> CoreResult<Deposit> {
        sqlx::query("UPDATE deposits SET status = $1, updated_at = $2 WHERE external_id = $3")
            .bind(status_str(status))
            .bind(now as i64)
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("set_deposit_status", e))?;

        self.get_deposit(id).await
    }
}
