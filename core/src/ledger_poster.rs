//! The Ledger Poster (§2 LP, §4.3): accepts a balanced set of debit/credit
//! entries and writes them atomically alongside their balance effects.
//! Grounded on the enrichment example's `LedgerTransactionRequest`
//! builder (`other_examples/.../ledger_service.rs`) for the
//! validate-then-post shape, adapted to the spec's simpler "caller
//! declares entry semantics, poster only enforces balance and writes
//! rows" contract (§4.3).

use crate::balance::BalanceEngine;
use rust_decimal::Decimal;
use settle_common::error::{CoreError, CoreResult, LedgerError};
use settle_common::ids::{AccountId, InternalId, TransactionGroupId};
use settle_common::money::Money;
use settle_common::time::get_current_time_in_seconds;

/// The balance effect a caller declares for an entry (§4.3: "Entry-side
/// semantics depend on the caller-declared reference type"). The Poster
/// itself does not interpret reference types — it just applies whichever
/// effect the caller chose and enforces that the debits and credits in the
/// batch balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceEffect {
    Debit,
    Credit,
    Hold,
    Release,
    Capture,
}

#[derive(Debug, Clone)]
pub struct LedgerEntryInput {
    pub account: AccountId,
    pub effect: BalanceEffect,
    pub amount: Money,
    pub reference_type: String,
    pub reference_id: InternalId,
    pub description: String,
}

/// A set of entries that has already been checked to balance. Constructing
/// one is the only way to call `LedgerPoster::post`, making the
/// double-entry invariant a precondition rather than something the poster
/// re-derives from caller intent (§9's recommended "BalancedBatch" shape).
pub struct BalancedBatch {
    entries: Vec<LedgerEntryInput>,
}

impl BalancedBatch {
    /// Validates amount > 0 per entry and that debit-effects and
    /// credit-effects sum equal (§4.3 steps 1-2). `Hold` and `Release` move
    /// money between an account's own available/held columns and net to
    /// zero across the ledger on their own, so they are excluded from the
    /// balance check. `Capture` is the opposite: it removes money from held
    /// for good (§4.2's "the funds have left the account for good"), so it
    /// counts as a debit-side effect that must be matched by `Credit`
    /// entries elsewhere in the same batch, exactly as S3's capture-with-fee
    /// split does (payer Capture 100 = payee Credit 97 + fee Credit 3).
    pub fn new(entries: Vec<LedgerEntryInput>) -> CoreResult<Self> {
        let mut debit_total = Decimal::ZERO;
        let mut credit_total = Decimal::ZERO;

        for entry in &entries {
            if !entry.amount.is_positive() {
                return Err(CoreError::Ledger(LedgerError::NonPositiveAmount));
            }
            match entry.effect {
                BalanceEffect::Debit | BalanceEffect::Capture => debit_total += entry.amount.as_decimal(),
                BalanceEffect::Credit => credit_total += entry.amount.as_decimal(),
                BalanceEffect::Hold | BalanceEffect::Release => {}
            }
        }

        if debit_total != credit_total {
            return Err(CoreError::Ledger(LedgerError::Unbalanced {
                debit: debit_total.to_string(),
                credit: credit_total.to_string(),
            }));
        }

        Ok(BalancedBatch { entries })
    }
}

/// Posts entries against the caller's transaction (§4.3 step 3, §4.1: ledger
/// writes and their balance effects happen "under the current unit of
/// work", so a crash between posting and the caller's own status update
/// can never leave one committed without the other).
pub struct LedgerPoster<'t, 'c> {
    tx: &'t mut sqlx::Transaction<'c, sqlx::Postgres>,
}

impl<'t, 'c> LedgerPoster<'t, 'c> {
    pub fn new(tx: &'t mut sqlx::Transaction<'c, sqlx::Postgres>) -> Self {
        LedgerPoster { tx }
    }

    /// Applies each entry's balance effect in order and writes an
    /// immutable ledger row per entry (§4.3 step 3).
    pub async fn post(
        &mut self,
        transaction_group_id: TransactionGroupId,
        batch: BalancedBatch,
    ) -> CoreResult<()> {
        for entry in &batch.entries {
            let mut balances = BalanceEngine::new(&mut *self.tx);
            let post_state = match entry.effect {
                BalanceEffect::Debit => balances.debit(entry.account, entry.amount).await?,
                BalanceEffect::Credit => balances.credit(entry.account, entry.amount).await?,
                BalanceEffect::Hold => balances.hold(entry.account, entry.amount).await?,
                BalanceEffect::Release => balances.release(entry.account, entry.amount).await?,
                BalanceEffect::Capture => balances.capture(entry.account, entry.amount).await?,
            };

            let side = match entry.effect {
                BalanceEffect::Debit | BalanceEffect::Hold => "debit",
                BalanceEffect::Credit | BalanceEffect::Release | BalanceEffect::Capture => "credit",
            };
            let balance_after = post_state.available_balance + post_state.held_balance;

            sqlx::query(
                "INSERT INTO ledger_entries \
                 (transaction_group_id, account_id, side, amount, balance_after, \
                  reference_type, reference_id, description, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(transaction_group_id.0)
            .bind(entry.account.0)
            .bind(side)
            .bind(entry.amount.as_decimal())
            .bind(balance_after)
            .bind(&entry.reference_type)
            .bind(entry.reference_id.0)
            .bind(&entry.description)
            .bind(get_current_time_in_seconds() as i64)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                log::error!("failed to insert ledger entry: {e}");
                CoreError::DbError
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use settle_common::ids::AccountId;

    fn entry(effect: BalanceEffect, amount: Decimal) -> LedgerEntryInput {
        LedgerEntryInput {
            account: AccountId::new(),
            effect,
            amount: Money::ledger(amount),
            reference_type: "payment-authorize".to_string(),
            reference_id: InternalId(1),
            description: "test".to_string(),
        }
    }

    #[test]
    fn balanced_debit_credit_batch_is_accepted() {
        let entries = vec![
            entry(BalanceEffect::Debit, dec!(100)),
            entry(BalanceEffect::Credit, dec!(100)),
        ];
        assert!(BalancedBatch::new(entries).is_ok());
    }

    #[test]
    fn unbalanced_batch_is_rejected() {
        let entries = vec![
            entry(BalanceEffect::Debit, dec!(100)),
            entry(BalanceEffect::Credit, dec!(97)),
        ];
        let result = BalancedBatch::new(entries);
        assert!(matches!(
            result,
            Err(CoreError::Ledger(LedgerError::Unbalanced { .. }))
        ));
    }

    #[test]
    fn zero_amount_entry_is_rejected() {
        let entries = vec![entry(BalanceEffect::Debit, dec!(0))];
        assert!(matches!(
            BalancedBatch::new(entries),
            Err(CoreError::Ledger(LedgerError::NonPositiveAmount))
        ));
    }

    #[test]
    fn three_way_capture_split_balances() {
        // S3: capture with fee split, 100 = 97 + 3.
        let entries = vec![
            entry(BalanceEffect::Debit, dec!(100)),
            entry(BalanceEffect::Credit, dec!(97)),
            entry(BalanceEffect::Credit, dec!(3)),
        ];
        assert!(BalancedBatch::new(entries).is_ok());
    }
}
