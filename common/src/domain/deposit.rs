use crate::ids::{AccountId, DepositId};
use crate::money::Money;
use crate::time::TimestampSeconds;
use serde::{Deserialize, Serialize};

/// `Completed`, `Failed` are terminal (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DepositStatus {
    Detected,
    Confirming,
    Credited,
    Completed,
    Failed,
}

impl std::fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deposit {
    pub id: DepositId,
    pub account_id: AccountId,
    pub amount: Money,
    pub chain_tx_hash: String,
    pub status: DepositStatus,
    pub created_at: TimestampSeconds,
    pub updated_at: TimestampSeconds,
}

impl Deposit {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, DepositStatus::Completed | DepositStatus::Failed)
    }
}
