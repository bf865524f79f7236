use crate::ids::{AccountId, UserId, WalletId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountType {
    User,
    Merchant,
    Escrow,
    System,
}

/// `Closed` is terminal (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountStatus {
    Active,
    Suspended,
    Closed,
}

/// `available_balance ≥ 0` and `held_balance ≥ 0` are CHECK-constraint
/// invariants enforced at the storage layer as a defense-in-depth guard
/// behind the Balance Engine's own bounds checks (§4.2, §9).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub account_type: AccountType,
    pub owner_user_id: Option<UserId>,
    pub primary_wallet_id: Option<WalletId>,
    pub available_balance: Money,
    pub held_balance: Money,
    /// Optimistic-versioning counter bumped on every successful CAS update
    /// (§4.2).
    pub version: i64,
    pub status: AccountStatus,
}

impl Account {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, AccountStatus::Closed)
    }
}
