use super::{db_err, PgStorage};
use async_trait::async_trait;
use rust_decimal::Decimal;
use settle_common::domain::withdrawal::{Withdrawal, WithdrawalStatus};
use settle_common::error::{CoreError, CoreResult};
use settle_common::ids::{AccountId, WithdrawalId};
use settle_common::money::Money;
use sqlx::FromRow;

/// The well-known clearing account seeded by the init migration (§4.3,
/// §4.6): a completed withdrawal's `Capture` entry is balanced against a
/// `Credit` to this account rather than to another user-owned account,
/// since the counterparty is the chain, not a ledger participant.
pub fn chain_settlement_account() -> AccountId {
    AccountId(uuid::Uuid::from_bytes([
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1,
    ]))
}

fn parse_status(s: &str) -> WithdrawalStatus {
    match s {
        "approved" => WithdrawalStatus::Approved,
        "submitted" => WithdrawalStatus::Submitted,
        "confirmed" => WithdrawalStatus::Confirmed,
        "completed" => WithdrawalStatus::Completed,
        "rejected" => WithdrawalStatus::Rejected,
        "failed" => WithdrawalStatus::Failed,
        _ => WithdrawalStatus::Pending,
    }
}

pub(crate) fn status_str(s: WithdrawalStatus) -> &'static str {
    match s {
        WithdrawalStatus::Pending => "pending",
        WithdrawalStatus::Approved => "approved",
        WithdrawalStatus::Submitted => "submitted",
        WithdrawalStatus::Confirmed => "confirmed",
        WithdrawalStatus::Completed => "completed",
        WithdrawalStatus::Rejected => "rejected",
        WithdrawalStatus::Failed => "failed",
    }
}

#[derive(FromRow)]
struct WithdrawalRow {
    external_id: uuid::Uuid,
    account_id: uuid::Uuid,
    amount: Decimal,
    destination_address: String,
    status: String,
    chain_tx_hash: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl From<WithdrawalRow> for Withdrawal {
    fn from(row: WithdrawalRow) -> Self {
        Withdrawal {
            id: WithdrawalId(row.external_id),
            account_id: AccountId(row.account_id),
            amount: Money::from(row.amount),
            destination_address: row.destination_address,
            status: parse_status(&row.status),
            chain_tx_hash: row.chain_tx_hash,
            created_at: row.created_at as u64,
            updated_at: row.updated_at as u64,
        }
    }
}

#[async_trait]
pub trait WithdrawalProvider: Send + Sync {
    async fn request_withdrawal(
        &self,
        account: AccountId,
        amount: Money,
        destination_address: &str,
    ) -> CoreResult<Withdrawal>;
    async fn get_withdrawal(&self, id: WithdrawalId) -> CoreResult<Withdrawal>;
    async fn set_withdrawal_status(
        &self,
        id: WithdrawalId,
        status: WithdrawalStatus,
        chain_tx_hash: Option<&str>,
        now: u64,
    ) -> CoreResult<Withdrawal>;
}

#[async_trait]
impl WithdrawalProvider for PgStorage {
    async fn request_withdrawal(
        &self,
        account: AccountId,
        amount: Money,
        destination_address: &str,
    ) -> CoreResult<Withdrawal> {
        let now = settle_common::time::get_current_time_in_seconds() as i64;
        let external_id = uuid::Uuid::new_v4();
        sqlx::query(
            "INSERT INTO withdrawals \
             (external_id, account_id, amount, destination_address, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, 'pending', $5, $5)",
        )
        .bind(external_id)
        .bind(account.0)
        .bind(amount.as_decimal())
        .bind(destination_address)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("request_withdrawal", e))?;

        self.get_withdrawal(WithdrawalId(external_id)).await
    }

    async fn get_withdrawal(&self, id: WithdrawalId) -> CoreResult<Withdrawal> {
        sqlx::query_as::<_, WithdrawalRow>(
            "SELECT external_id, account_id, amount, destination_address, status, chain_tx_hash, \
                    created_at, updated_at \
             FROM withdrawals WHERE external_id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("get_withdrawal", e))?
        .map(Withdrawal::from)
        .ok_or_else(|| CoreError::NotFound(format!("withdrawal {id}")))
    }

    async fn set_withdrawal_status(
        &self,
        id: WithdrawalId,
        status: WithdrawalStatus,
        chain_tx_hash: Option<&str>,
        now: u64,
    ) -> CoreResult<Withdrawal> {
        sqlx::query(
            "UPDATE withdrawals SET status = $1, updated_at = $2, \
             chain_tx_hash = COALESCE($3, chain_tx_hash) WHERE external_id = $4",
        )
        .bind(status_str(status))
        .bind(now as i64)
        .bind(chain_tx_hash)
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("set_withdrawal_status", e))?;

        self.get_withdrawal(id).await
    }
}

/// Transaction-scoped withdrawal reads/writes, mirroring
/// `settle_core::outbox::enqueue`'s own `&mut Transaction` parameter so a
/// handler can drive a withdrawal through the Balance Engine and a status
/// change in one unit of work.
pub async fn request_withdrawal_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    account: AccountId,
    amount: Money,
    destination_address: &str,
) -> CoreResult<Withdrawal> {
    let now = settle_common::time::get_current_time_in_seconds() as i64;
    let external_id = uuid::Uuid::new_v4();
    sqlx::query(
        "INSERT INTO withdrawals \
         (external_id, account_id, amount, destination_address, status, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, 'pending', $5, $5)",
    )
    .bind(external_id)
    .bind(account.0)
    .bind(amount.as_decimal())
    .bind(destination_address)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| db_err("request_withdrawal", e))?;

    get_withdrawal_tx(tx, WithdrawalId(external_id)).await
}

pub async fn get_withdrawal_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: WithdrawalId,
) -> CoreResult<Withdrawal> {
    sqlx::query_as::<_, WithdrawalRow>(
        "SELECT external_id, account_id, amount, destination_address, status, chain_tx_hash, \
                created_at, updated_at \
         FROM withdrawals WHERE external_id = $1",
    )
    .bind(id.0)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| db_err("get_withdrawal", e))?
    .map(Withdrawal::from)
    .ok_or_else(|| CoreError::NotFound(format!("withdrawal {id}")))
}

pub async fn set_withdrawal_status_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: WithdrawalId,
    status: WithdrawalStatus,
    chain_tx_hash: Option<&str>,
    now: u64,
) -> CoreResult<Withdrawal> {
    sqlx::query(
        "UPDATE withdrawals SET status = $1, updated_at = $2, \
         chain_tx_hash = COALESCE($3, chain_tx_hash) WHERE external_id = $4",
    )
    .bind(status_str(status))
    .bind(now as i64)
    .bind(chain_tx_hash)
    .bind(id.0)
    .execute(&mut *tx)
    .await
    .map_err(|e| db_err("set_withdrawal_status", e))?;

    get_withdrawal_tx(tx, id).await
}
