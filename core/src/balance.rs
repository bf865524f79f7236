//! The Account/Balance Engine (§2 AB, §4.2): mutates available/held
//! balances under optimistic versioning. Grounded on the teacher's
//! `daemon/src/escrow/auto_release.rs` balance-mutation shape (read
//! current state, `checked_add`/`checked_sub`, write back, emit a metric)
//! but moved from an in-memory `state.set_escrow()` call to a
//! conditional-update-by-version SQL statement, since the teacher's single
//! embedded store has no concurrent writer to race against and this one
//! does.

use rust_decimal::Decimal;
use settle_common::error::{BalanceError, CoreError, CoreResult};
use settle_common::ids::AccountId;
use settle_common::money::Money;
use sqlx::FromRow;

/// Read-then-CAS retry budget (§4.2, §9).
const MAX_CAS_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub id: i64,
    pub external_id: uuid::Uuid,
    pub available_balance: Decimal,
    pub held_balance: Decimal,
    pub version: i64,
    pub status: String,
}

impl AccountRow {
    fn ensure_open(&self) -> CoreResult<()> {
        if self.status == "closed" {
            return Err(CoreError::Balance(BalanceError::AccountClosed));
        }
        Ok(())
    }
}

/// Holds the caller's transaction for the duration of one or more balance
/// mutations (§4.1: every write here happens "under the current unit of
/// work", never on its own auto-committed connection).
pub struct BalanceEngine<'t, 'c> {
    tx: &'t mut sqlx::Transaction<'c, sqlx::Postgres>,
}

impl<'t, 'c> BalanceEngine<'t, 'c> {
    pub fn new(tx: &'t mut sqlx::Transaction<'c, sqlx::Postgres>) -> Self {
        BalanceEngine { tx }
    }

    async fn read_account(&mut self, account: AccountId) -> CoreResult<AccountRow> {
        sqlx::query_as::<_, AccountRow>(
            "SELECT id, external_id, available_balance, held_balance, version, status \
             FROM accounts WHERE external_id = $1",
        )
        .bind(account.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| {
            log::error!("failed to read account {account}: {e}");
            CoreError::DbError
        })?
        .ok_or_else(|| CoreError::NotFound(format!("account {account}")))
    }

    /// Conditional update by version (§4.2, §9): a 0-row result means CAS
    /// failure, retried up to `MAX_CAS_ATTEMPTS` times before surfacing
    /// `OptimisticConflict`.
    async fn cas_update<F>(&mut self, account: AccountId, mut apply: F) -> CoreResult<AccountRow>
    where
        F: FnMut(&AccountRow) -> CoreResult<(Decimal, Decimal)>,
    {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let row = self.read_account(account).await?;
            row.ensure_open()?;
            let (new_available, new_held) = apply(&row)?;

            let updated = sqlx::query(
                "UPDATE accounts SET available_balance = $1, held_balance = $2, version = version + 1 \
                 WHERE id = $3 AND version = $4",
            )
            .bind(new_available)
            .bind(new_held)
            .bind(row.id)
            .bind(row.version)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                log::error!("failed to update account {account}: {e}");
                CoreError::DbError
            })?;

            if updated.rows_affected() == 1 {
                metrics::counter!("settle_balance_cas_success_total").increment(1);
                return Ok(AccountRow {
                    available_balance: new_available,
                    held_balance: new_held,
                    version: row.version + 1,
                    ..row
                });
            }

            metrics::counter!("settle_balance_cas_retry_total").increment(1);
            log::debug!("optimistic CAS miss on account {account}, attempt {attempt}/{MAX_CAS_ATTEMPTS}");
        }

        Err(CoreError::Balance(BalanceError::OptimisticConflict {
            attempts: MAX_CAS_ATTEMPTS,
        }))
    }

    /// Decreases `available_balance`; fails `InsufficientBalance` if the
    /// result would be negative (§4.2).
    pub async fn debit(&mut self, account: AccountId, amount: Money) -> CoreResult<AccountRow> {
        self.cas_update(account, |row| {
            let next = row.available_balance - amount.as_decimal();
            if next < Decimal::ZERO {
                return Err(CoreError::Balance(BalanceError::InsufficientBalance));
            }
            Ok((next, row.held_balance))
        })
        .await
    }

    /// Increases `available_balance` (§4.2).
    pub async fn credit(&mut self, account: AccountId, amount: Money) -> CoreResult<AccountRow> {
        self.cas_update(account, |row| {
            Ok((row.available_balance + amount.as_decimal(), row.held_balance))
        })
        .await
    }

    /// Moves `amount` from `available_balance` to `held_balance`; fails
    /// `InsufficientBalance` when available < amount (§4.2).
    pub async fn hold(&mut self, account: AccountId, amount: Money) -> CoreResult<AccountRow> {
        self.cas_update(account, |row| {
            let next_available = row.available_balance - amount.as_decimal();
            if next_available < Decimal::ZERO {
                return Err(CoreError::Balance(BalanceError::InsufficientBalance));
            }
            Ok((next_available, row.held_balance + amount.as_decimal()))
        })
        .await
    }

    /// Moves `amount` from `held_balance` back to `available_balance`;
    /// fails `InsufficientHold` when held < amount (§4.2).
    pub async fn release(&mut self, account: AccountId, amount: Money) -> CoreResult<AccountRow> {
        self.cas_update(account, |row| {
            let next_held = row.held_balance - amount.as_decimal();
            if next_held < Decimal::ZERO {
                return Err(CoreError::Balance(BalanceError::InsufficientHold));
            }
            Ok((row.available_balance + amount.as_decimal(), next_held))
        })
        .await
    }

    /// Removes `amount` from `held_balance` (final — the funds have left
    /// the account for good) (§4.2).
    pub async fn capture(&mut self, account: AccountId, amount: Money) -> CoreResult<AccountRow> {
        self.cas_update(account, |row| {
            let next_held = row.held_balance - amount.as_decimal();
            if next_held < Decimal::ZERO {
                return Err(CoreError::Balance(BalanceError::InsufficientHold));
            }
            Ok((row.available_balance, next_held))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(available: i64, held: i64, version: i64) -> AccountRow {
        AccountRow {
            id: 1,
            external_id: uuid::Uuid::nil(),
            available_balance: Decimal::new(available, 0),
            held_balance: Decimal::new(held, 0),
            version,
            status: "active".to_string(),
        }
    }

    #[test]
    fn closed_account_rejects_mutation() {
        let mut closed = row(100, 0, 1);
        closed.status = "closed".to_string();
        assert!(closed.ensure_open().is_err());
    }

    #[test]
    fn open_account_allows_mutation() {
        assert!(row(100, 0, 1).ensure_open().is_ok());
    }
}
