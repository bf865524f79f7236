use crate::ids::{AccountId, WithdrawalId};
use crate::money::Money;
use crate::time::TimestampSeconds;
use serde::{Deserialize, Serialize};

/// `Completed`, `Rejected`, `Failed` are terminal (§4.6). On `Pending` the
/// available balance is debited and the held balance credited; on
/// `Completed` the held balance is decremented; on `Rejected`/`Failed` the
/// hold is reversed — enforced by the state machine, not this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Submitted,
    Confirmed,
    Completed,
    Rejected,
    Failed,
}

impl std::fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    pub id: WithdrawalId,
    pub account_id: AccountId,
    pub amount: Money,
    pub destination_address: String,
    pub status: WithdrawalStatus,
    pub chain_tx_hash: Option<String>,
    pub created_at: TimestampSeconds,
    pub updated_at: TimestampSeconds,
}

impl Withdrawal {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            WithdrawalStatus::Completed | WithdrawalStatus::Rejected | WithdrawalStatus::Failed
        )
    }
}
