use crate::ids::{InternalId, OrderId, UserId};
use crate::money::Money;
use crate::time::TimestampSeconds;
use serde::{Deserialize, Serialize};

/// `Completed`, `Cancelled`, `Refunded` are terminal (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Paid,
    Shipped,
    Completed,
    Cancelled,
    Refunded,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: InternalId,
    pub order_id: OrderId,
    pub product_ref: String,
    pub quantity: u32,
    /// Price snapshot at creation time; immutable thereafter (§3).
    pub unit_price: Money,
}

/// `total_amount = Σ(item.quantity × item.unit_price)` at creation and is
/// immutable thereafter (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub buyer_user_id: UserId,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub created_at: TimestampSeconds,
    pub updated_at: TimestampSeconds,
}

impl Order {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Refunded
        )
    }
}
