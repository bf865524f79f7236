use crate::crypto::Address;
use crate::ids::{UserId, WalletId};
use crate::time::TimestampSeconds;
use serde::{Deserialize, Serialize};

/// Invariants enforced by `settle-core`'s wallet service, not by this type
/// itself (§3): (i) unique active address across non-deleted rows, (ii) at
/// most one primary per user, (iii) primary ⇒ verified, (iv) primary
/// cannot be deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: WalletId,
    pub owner_user_id: UserId,
    pub address: Address,
    pub label: Option<String>,
    pub is_primary: bool,
    pub is_verified: bool,
    pub deleted_at: Option<TimestampSeconds>,
    pub created_at: TimestampSeconds,
}

impl Wallet {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_address_as_lowercase_hex_string() {
        let wallet = Wallet {
            id: WalletId::new(),
            owner_user_id: UserId::new(),
            address: Address::parse("0xABCDEF0000000000000000000000000000dEaD").unwrap(),
            label: None,
            is_primary: false,
            is_verified: false,
            deleted_at: None,
            created_at: 0,
        };
        let json = serde_json::to_value(&wallet).unwrap();
        let addr = json["address"].as_str().unwrap();
        assert_eq!(addr, addr.to_lowercase());
    }
}
