use crate::ids::{PaymentId, SettlementId};
use crate::money::Money;
use crate::time::TimestampSeconds;
use serde::{Deserialize, Serialize};

/// `Completed`, `Failed` are terminal (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettlementStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl std::fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub id: SettlementId,
    pub payment_id: PaymentId,
    pub amount: Money,
    pub status: SettlementStatus,
    pub created_at: TimestampSeconds,
    pub updated_at: TimestampSeconds,
}

impl Settlement {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            SettlementStatus::Completed | SettlementStatus::Failed
        )
    }
}
