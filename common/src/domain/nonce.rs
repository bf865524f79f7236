use serde::{Deserialize, Serialize};

/// `Used` is terminal — at-most-once (§3, §9): "set-if-absent is the only
/// way to create them; Used is terminal."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NonceState {
    Reserved,
    Used,
}

/// Default reservation TTL (§3, §6: `nonce:<address>:<nonce>` key, 5 min
/// default).
pub const DEFAULT_NONCE_TTL_SECONDS: u64 = 5 * 60;

/// Keyed by `(lower-cased signer address, nonce string)` (§3). Modeled here
/// purely as a value type; the reserve/mark-used/release state machine
/// lives in `settle-core`'s Nonce Store, which is backed by Redis rather
/// than the relational store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NonceReservation {
    pub address: String,
    pub nonce: String,
    pub state: NonceState,
}
