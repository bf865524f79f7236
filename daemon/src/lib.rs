// Settlement Daemon
// Wires settle-core's components behind an HTTP API and a standalone
// outbox/idempotency worker (§5).

#[macro_use]
extern crate log;

pub mod config;
pub mod error;
pub mod handlers;
pub mod idempotency_guard;
pub mod outbox_processor;
pub mod request_id;
pub mod state;
