use crate::crypto::Address;
use serde::{Deserialize, Serialize};

/// One row per role; unique per role (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SystemWalletRole {
    Treasury,
    Minter,
    Burner,
    Hot,
    Cold,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemWallet {
    pub role: SystemWalletRole,
    pub address: Address,
}
