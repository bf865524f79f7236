//! Deposit: Detected → Confirming → Credited → Completed (terminal) |
//! Failed (§4.6).

use super::TransitionTable;
use settle_common::domain::DepositStatus;
use settle_common::error::CoreResult;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepositEvent {
    Confirm,
    Credit,
    Complete,
    Fail,
}

impl fmt::Display for DepositEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

fn table() -> &'static TransitionTable<DepositStatus, DepositEvent> {
    static TABLE: OnceLock<TransitionTable<DepositStatus, DepositEvent>> = OnceLock::new();
    TABLE.get_or_init(|| {
        use DepositEvent::*;
        use DepositStatus::*;
        TransitionTable::new(&[
            (Detected, Confirm, Confirming),
            (Confirming, Credit, Credited),
            (Credited, Complete, Completed),
            (Detected, Fail, Failed),
            (Confirming, Fail, Failed),
        ])
    })
}

pub fn is_terminal(state: DepositStatus) -> bool {
    matches!(state, DepositStatus::Completed | DepositStatus::Failed)
}

pub fn transition(current: DepositStatus, event: DepositEvent) -> CoreResult<DepositStatus> {
    table().transition(current, event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_reaches_completed() {
        let s = transition(DepositStatus::Detected, DepositEvent::Confirm).unwrap();
        let s = transition(s, DepositEvent::Credit).unwrap();
        let s = transition(s, DepositEvent::Complete).unwrap();
        assert_eq!(s, DepositStatus::Completed);
    }

    #[test]
    fn fail_admissible_before_credited() {
        assert!(transition(DepositStatus::Detected, DepositEvent::Fail).is_ok());
        assert!(transition(DepositStatus::Confirming, DepositEvent::Fail).is_ok());
        assert!(transition(DepositStatus::Credited, DepositEvent::Fail).is_err());
    }
}
