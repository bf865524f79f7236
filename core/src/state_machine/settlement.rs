//! Settlement: Pending → Processing → Completed | Failed (§4.6).

use super::TransitionTable;
use settle_common::domain::SettlementStatus;
use settle_common::error::CoreResult;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettlementEvent {
    Start,
    Complete,
    Fail,
}

impl fmt::Display for SettlementEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

fn table() -> &'static TransitionTable<SettlementStatus, SettlementEvent> {
    static TABLE: OnceLock<TransitionTable<SettlementStatus, SettlementEvent>> = OnceLock::new();
    TABLE.get_or_init(|| {
        use SettlementEvent::*;
        use SettlementStatus::*;
        TransitionTable::new(&[
            (Pending, Start, Processing),
            (Processing, Complete, Completed),
            (Processing, Fail, Failed),
        ])
    })
}

pub fn is_terminal(state: SettlementStatus) -> bool {
    matches!(state, SettlementStatus::Completed | SettlementStatus::Failed)
}

pub fn transition(current: SettlementStatus, event: SettlementEvent) -> CoreResult<SettlementStatus> {
    table().transition(current, event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let s = transition(SettlementStatus::Pending, SettlementEvent::Start).unwrap();
        let s = transition(s, SettlementEvent::Complete).unwrap();
        assert_eq!(s, SettlementStatus::Completed);
    }

    #[test]
    fn cannot_complete_without_processing_first() {
        assert!(transition(SettlementStatus::Pending, SettlementEvent::Complete).is_err());
    }
}
