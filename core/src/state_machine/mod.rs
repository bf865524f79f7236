//! Aggregate State Machines (§2 SM, §4.6): each aggregate is a
//! deterministic state machine whose transitions are explicit data
//! (§9: "model transition tables as explicit data (state, event) →
//! state'"). Grounded on the enrichment example's
//! `TransactionStateMachine` (`other_examples/.../ledger_service.rs`),
//! whose `valid_transitions`/`can_transition`/`transition` trio is the
//! direct ancestor of `TransitionTable` below.

pub mod deposit;
pub mod order;
pub mod payment;
pub mod settlement;
pub mod wallet_verification;
pub mod withdrawal;

use settle_common::error::{CoreError, CoreResult, InvalidStateTransition};
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

/// A transition table for one aggregate: `(current_state, event) ->
/// next_state`. Built once per aggregate module as a `lazy`-ish static via
/// `TransitionTable::new`, then reused by every call to `transition`.
pub struct TransitionTable<S, E> {
    table: HashMap<(S, E), S>,
}

impl<S, E> TransitionTable<S, E>
where
    S: Eq + Hash + Copy + Display,
    E: Eq + Hash + Copy + Display,
{
    pub fn new(rows: &[(S, E, S)]) -> Self {
        let mut table = HashMap::with_capacity(rows.len());
        for (from, event, to) in rows {
            table.insert((*from, *event), *to);
        }
        TransitionTable { table }
    }

    /// Looks up `(current, event)`; `InvalidStateTransition` carrying the
    /// actual current state if the pair is not admissible (§4.6).
    pub fn transition(&self, current: S, event: E) -> CoreResult<S> {
        self.table
            .get(&(current, event))
            .copied()
            .ok_or_else(|| {
                CoreError::StateTransition(InvalidStateTransition {
                    current_state: current.to_string(),
                    event: event.to_string(),
                })
            })
    }

    pub fn can_transition(&self, current: S, event: E) -> bool {
        self.table.contains_key(&(current, event))
    }
}

/// Idempotent-retry helper (§4.6, §9): re-issuing a transition that would
/// land the aggregate in the same terminal state it is already in is a
/// success no-op; re-issuing from a terminal state to a *different* state
/// still fails `InvalidStateTransition`. Callers pass the state the event
/// would produce if admissible; if the aggregate is already terminal and
/// already in that exact state, this short-circuits instead of consulting
/// the table (where a terminal state usually has no outgoing rows at all).
pub fn idempotent_or_transition<S, E>(
    table: &TransitionTable<S, E>,
    current: S,
    event: E,
    is_terminal: impl Fn(S) -> bool,
    event_target_if_already_there: S,
) -> CoreResult<S>
where
    S: Eq + Hash + Copy + Display,
    E: Eq + Hash + Copy + Display,
{
    if is_terminal(current) && current == event_target_if_already_there {
        return Ok(current);
    }
    table.transition(current, event)
}
