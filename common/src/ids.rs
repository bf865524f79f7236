use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Internal monotonically increasing integer key (§3). Never exposed over
/// an external API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InternalId(pub i64);

impl fmt::Display for InternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque externally-exposed identifier (§3). A thin `Uuid` wrapper so
/// every aggregate's external id is a distinct type and can't be mixed up
/// with another aggregate's at the type level.
macro_rules! external_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                $name(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok($name(Uuid::parse_str(s)?))
            }
        }
    };
}

external_id!(UserId);
external_id!(WalletId);
external_id!(AccountId);
external_id!(OrderId);
external_id!(PaymentId);
external_id!(SettlementId);
external_id!(DepositId);
external_id!(WithdrawalId);
external_id!(OutboxEntryId);
external_id!(RequestId);
external_id!(TransactionGroupId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_id_round_trips_through_display_and_from_str() {
        let id = UserId::new();
        let parsed: UserId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn distinct_aggregate_ids_are_distinct_types() {
        let user = UserId::new();
        let order = OrderId::new();
        assert_ne!(user.0, Uuid::nil());
        assert_ne!(order.0, Uuid::nil());
    }
}
