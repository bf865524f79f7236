//! Deterministic test harness for the settlement backend.
//!
//! Provides a `Clock` abstraction (real vs. paused time) and a seeded RNG so
//! that outbox backoff, lock TTL expiry, and nonce reservation windows can be
//! driven forward in tests without real sleeps, and so failures can be
//! replayed exactly via a printed seed.
//!
//! ```rust,ignore
//! use settle_testing_framework::prelude::*;
//!
//! #[tokio::test(start_paused = true)]
//! async fn outbox_retries_with_backoff() {
//!     let env = DeterministicTestEnv::new_time_paused();
//!     env.advance_time(Duration::from_secs(4)).await;
//!     // ... exercise the worker against env.clock ...
//! }
//! ```

#![warn(clippy::all)]

/// Clock and RNG abstractions for deterministic time/randomness control.
pub mod orchestrator;

/// Shared fixture builders (test accounts, wallets, signed envelopes).
pub mod fixtures;

pub mod prelude {
    //! Convenience re-exports for test modules.
    pub use crate::fixtures::*;
    pub use crate::orchestrator::{Clock, DeterministicTestEnv, PausedClock, SystemClock, TestRng};
}

pub use orchestrator::{Clock, DeterministicTestEnv, PausedClock, SystemClock, TestRng};
