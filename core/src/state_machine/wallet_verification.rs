//! Wallet verification: Unverified → Verified, driven by a successful
//! signature-verification call (§4.4, §4.6). Modeled as its own two-state
//! machine rather than reusing `Wallet.is_verified: bool` directly, so the
//! transition is still explicit data like every other aggregate here.
//!
//! On the first `Verified` wallet for a user, the owning service must set
//! it primary and update the user's `primary_wallet` pointer in the same
//! unit of work (§4.6). Setting primary requires `Verified`; deleting a
//! primary wallet is forbidden. Re-verifying an already-`Verified` wallet
//! is an idempotent success and does not consume a fresh nonce.

use super::TransitionTable;
use settle_common::error::CoreResult;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalletVerificationState {
    Unverified,
    Verified,
}

impl fmt::Display for WalletVerificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalletVerificationEvent {
    Verify,
}

impl fmt::Display for WalletVerificationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

fn table() -> &'static TransitionTable<WalletVerificationState, WalletVerificationEvent> {
    static TABLE: OnceLock<TransitionTable<WalletVerificationState, WalletVerificationEvent>> =
        OnceLock::new();
    TABLE.get_or_init(|| {
        use WalletVerificationEvent::*;
        use WalletVerificationState::*;
        TransitionTable::new(&[(Unverified, Verify, Verified)])
    })
}

pub fn is_terminal(state: WalletVerificationState) -> bool {
    state == WalletVerificationState::Verified
}

/// Re-verifying a `Verified` wallet is an idempotent success, not an error:
/// the SV call that drove it already consumed its own nonce independently.
pub fn transition(
    current: WalletVerificationState,
    event: WalletVerificationEvent,
) -> CoreResult<WalletVerificationState> {
    if current == WalletVerificationState::Verified {
        return Ok(current);
    }
    table().transition(current, event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unverified_to_verified() {
        let s = transition(
            WalletVerificationState::Unverified,
            WalletVerificationEvent::Verify,
        )
        .unwrap();
        assert_eq!(s, WalletVerificationState::Verified);
    }

    #[test]
    fn reverify_is_idempotent() {
        let s = transition(
            WalletVerificationState::Verified,
            WalletVerificationEvent::Verify,
        )
        .unwrap();
        assert_eq!(s, WalletVerificationState::Verified);
    }
}
