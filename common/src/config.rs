use crate::crypto::Address;

/// The EIP-712 signing parameters and timestamp tolerance named in §6
/// ("EIP712 chain id and verifying contract, timestamp tolerance"). Kept
/// in `settle-common` since both `settle-core` (verification) and
/// `settle-daemon` (configuration parsing) need the type.
#[derive(Debug, Clone)]
pub struct SignatureConfig {
    pub chain_id: u64,
    pub verifying_contract: Address,
    /// `|now - timestamp| ≤ tolerance` (§4.4 step 2); default 5 minutes.
    pub timestamp_tolerance_secs: u64,
}

impl SignatureConfig {
    pub const DEFAULT_TOLERANCE_SECS: u64 = 5 * 60;
}
