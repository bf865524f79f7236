//! Transactional integrity layer (§2): double-entry ledger, account
//! balances, wallet-signature verification, optimistic versioning,
//! distributed locking, and the transactional outbox. `settle-daemon`
//! drives this crate from HTTP handlers and a worker binary; nothing here
//! knows about actix-web.

pub mod balance;
pub mod idempotency;
pub mod kv;
pub mod ledger_poster;
pub mod lock;
pub mod nonce_store;
pub mod outbox;
pub mod signature_verifier;
pub mod state_machine;
pub mod storage;
pub mod uow;

pub use balance::BalanceEngine;
pub use idempotency::IdempotencyCache;
pub use kv::KvStore;
pub use ledger_poster::LedgerPoster;
pub use lock::DistributedLock;
pub use nonce_store::NonceStore;
pub use outbox::{EventProcessor, OutboxWorker, OutboxWorkerConfig};
pub use signature_verifier::SignatureVerifier;
pub use storage::{PgStorage, Storage};
pub use uow::UnitOfWork;
