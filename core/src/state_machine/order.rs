//! Order: Pending → Confirmed (reserves inventory) → Paid (authorizes
//! payment) → Shipped (deducts reserved inventory) → Completed (triggers
//! settlement). Cancel admissible from Pending/Confirmed. Refund
//! admissible from Paid only. Completed, Cancelled, Refunded terminal
//! (§4.6).

use super::TransitionTable;
use settle_common::domain::OrderStatus;
use settle_common::error::CoreResult;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderEvent {
    Confirm,
    Pay,
    Ship,
    Complete,
    Cancel,
    Refund,
}

impl fmt::Display for OrderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

fn table() -> &'static TransitionTable<OrderStatus, OrderEvent> {
    static TABLE: OnceLock<TransitionTable<OrderStatus, OrderEvent>> = OnceLock::new();
    TABLE.get_or_init(|| {
        use OrderEvent::*;
        use OrderStatus::*;
        TransitionTable::new(&[
            (Pending, Confirm, Confirmed),
            (Confirmed, Pay, Paid),
            (Paid, Ship, Shipped),
            (Shipped, Complete, Completed),
            (Pending, Cancel, Cancelled),
            (Confirmed, Cancel, Cancelled),
            (Paid, Refund, Refunded),
        ])
    })
}

pub fn is_terminal(state: OrderStatus) -> bool {
    matches!(
        state,
        OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Refunded
    )
}

/// Re-issuing a transition that would land the order in the state it is
/// already in is a success no-op; any other transition out of a terminal
/// state fails `InvalidStateTransition` (§4.6, §9).
pub fn transition(current: OrderStatus, event: OrderEvent) -> CoreResult<OrderStatus> {
    if is_terminal(current) {
        let would_be_target = table().transition(current, event).ok();
        if would_be_target == Some(current) {
            return Ok(current);
        }
    }
    table().transition(current, event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_reaches_completed() {
        let mut state = OrderStatus::Pending;
        state = transition(state, OrderEvent::Confirm).unwrap();
        state = transition(state, OrderEvent::Pay).unwrap();
        state = transition(state, OrderEvent::Ship).unwrap();
        state = transition(state, OrderEvent::Complete).unwrap();
        assert_eq!(state, OrderStatus::Completed);
    }

    #[test]
    fn cancel_admissible_from_pending_and_confirmed_only() {
        assert!(transition(OrderStatus::Pending, OrderEvent::Cancel).is_ok());
        assert!(transition(OrderStatus::Confirmed, OrderEvent::Cancel).is_ok());
        assert!(transition(OrderStatus::Paid, OrderEvent::Cancel).is_err());
    }

    #[test]
    fn refund_admissible_from_paid_only() {
        assert!(transition(OrderStatus::Paid, OrderEvent::Refund).is_ok());
        assert!(transition(OrderStatus::Shipped, OrderEvent::Refund).is_err());
    }

    #[test]
    fn transition_out_of_terminal_state_fails() {
        assert!(transition(OrderStatus::Completed, OrderEvent::Cancel).is_err());
        assert!(transition(OrderStatus::Cancelled, OrderEvent::Confirm).is_err());
    }

    #[test]
    fn invalid_transition_carries_current_state_in_error() {
        let err = transition(OrderStatus::Pending, OrderEvent::Ship).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Pending"));
    }
}
