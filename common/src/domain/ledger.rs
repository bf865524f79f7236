use crate::ids::{AccountId, InternalId, TransactionGroupId};
use crate::money::Money;
use crate::time::TimestampSeconds;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LedgerSide {
    Debit,
    Credit,
}

/// What a ledger entry is posted against, for audit and reconciliation
/// (§3: "reference (type, id)").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReference {
    pub reference_type: String,
    pub reference_id: InternalId,
}

/// Append-only (§3, §9: "model as an immutable log with strongly-typed
/// entries; never update or delete"). `balance_after` is a materialized
/// snapshot of the account's post-state at the moment this row was
/// inserted, not a source of truth in its own right — the log is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: InternalId,
    pub transaction_group_id: TransactionGroupId,
    pub account_id: AccountId,
    pub side: LedgerSide,
    pub amount: Money,
    pub balance_after: Money,
    pub reference: LedgerReference,
    pub description: String,
    pub created_at: TimestampSeconds,
}
