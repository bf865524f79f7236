use crate::ids::{AccountId, OrderId, PaymentId};
use crate::money::Money;
use crate::time::TimestampSeconds;
use serde::{Deserialize, Serialize};

/// Expiry is not itself a state (§4.6): "if now > expires_at while
/// Authorized, transitioning on Capture fails with PaymentExpired; a
/// background task may auto-Void after expiry."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentStatus {
    Pending,
    Authorized,
    Captured,
    Voided,
    Refunded,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub payer_account_id: AccountId,
    pub payee_account_id: AccountId,
    pub fee_account_id: AccountId,
    pub amount: Money,
    pub fee_amount: Money,
    pub status: PaymentStatus,
    pub expires_at: TimestampSeconds,
    pub created_at: TimestampSeconds,
    pub updated_at: TimestampSeconds,
}

impl Payment {
    /// `Captured` is not terminal — `Refund` is admissible from it (§4.6).
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, PaymentStatus::Voided | PaymentStatus::Refunded)
    }

    pub fn is_expired(&self, now: TimestampSeconds) -> bool {
        now > self.expires_at
    }
}
