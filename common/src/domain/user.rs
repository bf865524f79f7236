use crate::ids::UserId;
use crate::time::TimestampSeconds;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserRole {
    Buyer,
    Seller,
    Both,
    Admin,
}

/// KYC is tracked only as a status field here (§1 Non-goals: "KYC provider
/// integration beyond status fields").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KycStatus {
    None,
    Pending,
    Verified,
    Rejected,
}

/// `Deleted` is terminal (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserStatus {
    Active,
    Suspended,
    Deleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub role: UserRole,
    pub kyc_status: KycStatus,
    pub status: UserStatus,
    /// Set on first transition into `Verified` and preserved thereafter
    /// even if `kyc_status` later changes (§3).
    pub kyc_verified_at: Option<TimestampSeconds>,
    pub created_at: TimestampSeconds,
    pub updated_at: TimestampSeconds,
}

impl User {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, UserStatus::Deleted)
    }
}
