//! Withdrawal: Pending → Approved → Submitted → Confirmed → Completed
//! (terminal) | Rejected | Failed (§4.6).
//!
//! Balance effects live in the service layer, not this table: on
//! `Pending` the available balance is debited and the held balance
//! credited; on `Completed` the held balance is decremented; on
//! `Rejected`/`Failed` the hold is reversed.

use super::TransitionTable;
use settle_common::domain::WithdrawalStatus;
use settle_common::error::CoreResult;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WithdrawalEvent {
    Approve,
    Submit,
    Confirm,
    Complete,
    Reject,
    Fail,
}

impl fmt::Display for WithdrawalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

fn table() -> &'static TransitionTable<WithdrawalStatus, WithdrawalEvent> {
    static TABLE: OnceLock<TransitionTable<WithdrawalStatus, WithdrawalEvent>> = OnceLock::new();
    TABLE.get_or_init(|| {
        use WithdrawalEvent::*;
        use WithdrawalStatus::*;
        TransitionTable::new(&[
            (Pending, Approve, Approved),
            (Approved, Submit, Submitted),
            (Submitted, Confirm, Confirmed),
            (Confirmed, Complete, Completed),
            (Pending, Reject, Rejected),
            (Approved, Reject, Rejected),
            (Submitted, Fail, Failed),
            (Confirmed, Fail, Failed),
        ])
    })
}

pub fn is_terminal(state: WithdrawalStatus) -> bool {
    matches!(
        state,
        WithdrawalStatus::Completed | WithdrawalStatus::Rejected | WithdrawalStatus::Failed
    )
}

pub fn transition(current: WithdrawalStatus, event: WithdrawalEvent) -> CoreResult<WithdrawalStatus> {
    table().transition(current, event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_reaches_completed() {
        let s = transition(WithdrawalStatus::Pending, WithdrawalEvent::Approve).unwrap();
        let s = transition(s, WithdrawalEvent::Submit).unwrap();
        let s = transition(s, WithdrawalEvent::Confirm).unwrap();
        let s = transition(s, WithdrawalEvent::Complete).unwrap();
        assert_eq!(s, WithdrawalStatus::Completed);
    }

    #[test]
    fn reject_only_admissible_before_submission() {
        assert!(transition(WithdrawalStatus::Pending, WithdrawalEvent::Reject).is_ok());
        assert!(transition(WithdrawalStatus::Approved, WithdrawalEvent::Reject).is_ok());
        assert!(transition(WithdrawalStatus::Submitted, WithdrawalEvent::Reject).is_err());
    }

    #[test]
    fn fail_only_admissible_after_submission() {
        assert!(transition(WithdrawalStatus::Submitted, WithdrawalEvent::Fail).is_ok());
        assert!(transition(WithdrawalStatus::Confirmed, WithdrawalEvent::Fail).is_ok());
        assert!(transition(WithdrawalStatus::Pending, WithdrawalEvent::Fail).is_err());
    }
}
