//! Payment: Pending → Authorized (holds payer funds) → Captured (moves
//! funds out of escrow, pays payee and fees). Void from Authorized
//! (releases hold). Refund from Captured (reverses ledger). Expiry: if
//! `now > expires_at` while Authorized, capturing fails `PaymentExpired`
//! even though the table would otherwise admit it (§4.6).

use super::TransitionTable;
use settle_common::domain::PaymentStatus;
use settle_common::error::{CoreError, CoreResult, InvalidStateTransition};
use settle_common::time::TimestampSeconds;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentEvent {
    Authorize,
    Capture,
    Void,
    Refund,
}

impl fmt::Display for PaymentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

fn table() -> &'static TransitionTable<PaymentStatus, PaymentEvent> {
    static TABLE: OnceLock<TransitionTable<PaymentStatus, PaymentEvent>> = OnceLock::new();
    TABLE.get_or_init(|| {
        use PaymentEvent::*;
        use PaymentStatus::*;
        TransitionTable::new(&[
            (Pending, Authorize, Authorized),
            (Authorized, Capture, Captured),
            (Authorized, Void, Voided),
            (Captured, Refund, Refunded),
        ])
    })
}

pub fn is_terminal(state: PaymentStatus) -> bool {
    matches!(state, PaymentStatus::Voided | PaymentStatus::Refunded)
}

/// Plain table lookup, for events where expiry doesn't apply.
pub fn transition(current: PaymentStatus, event: PaymentEvent) -> CoreResult<PaymentStatus> {
    table().transition(current, event)
}

/// `Capture` specifically, with the expiry guard from §4.6: a capture
/// attempted after `expires_at` on an `Authorized` payment fails even
/// though the bare table would admit `Authorized -> Captured`.
pub fn capture(
    current: PaymentStatus,
    expires_at: TimestampSeconds,
    now: TimestampSeconds,
) -> CoreResult<PaymentStatus> {
    if current == PaymentStatus::Authorized && now > expires_at {
        return Err(CoreError::StateTransition(InvalidStateTransition {
            current_state: current.to_string(),
            event: "PaymentExpired".to_string(),
        }));
    }
    transition(current, PaymentEvent::Capture)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_then_capture() {
        let state = transition(PaymentStatus::Pending, PaymentEvent::Authorize).unwrap();
        assert_eq!(state, PaymentStatus::Authorized);
        let state = transition(state, PaymentEvent::Capture).unwrap();
        assert_eq!(state, PaymentStatus::Captured);
    }

    #[test]
    fn void_from_authorized_releases_back_to_voided() {
        let state = transition(PaymentStatus::Authorized, PaymentEvent::Void).unwrap();
        assert_eq!(state, PaymentStatus::Voided);
    }

    #[test]
    fn capture_after_void_is_invalid_state_transition() {
        // S4: "Capture after void → InvalidStateTransition."
        assert!(transition(PaymentStatus::Voided, PaymentEvent::Capture).is_err());
    }

    #[test]
    fn refund_only_admissible_from_captured() {
        assert!(transition(PaymentStatus::Captured, PaymentEvent::Refund).is_ok());
        assert!(transition(PaymentStatus::Authorized, PaymentEvent::Refund).is_err());
    }

    #[test]
    fn capture_past_expiry_fails_even_though_table_would_admit_it() {
        let result = capture(PaymentStatus::Authorized, 1000, 1001);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("PaymentExpired"));
    }

    #[test]
    fn capture_before_expiry_succeeds() {
        let result = capture(PaymentStatus::Authorized, 1000, 999);
        assert_eq!(result.unwrap(), PaymentStatus::Captured);
    }
}
