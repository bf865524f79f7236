//! Persistence (§3, §4.1): one provider trait per aggregate, composed into
//! a single `Storage` supertrait, grounded on the teacher's
//! `daemon/src/core/storage/mod.rs` pattern of a big `Storage: FooProvider
//! + BarProvider + ...` trait backed by one concrete store. The teacher
//! backs it with `RocksStorage`; this crate backs it with `PgStorage` over
//! a `sqlx::PgPool`, per the storage decision in `DESIGN.md`.
//!
//! The Account/Balance Engine (`crate::balance`) and Ledger Poster
//! (`crate::ledger_poster`) intentionally bypass this layer and talk to
//! the `accounts`/`ledger_entries` tables directly: their CAS retry loop
//! and balanced-batch insert are tight transactional units that don't fit
//! a generic CRUD trait.

pub mod audit;
pub mod deposits;
pub mod orders;
pub mod payments;
pub mod settlements;
pub mod users;
pub mod wallets;
pub mod withdrawals;

pub use audit::AuditLogProvider;
pub use deposits::DepositProvider;
pub use orders::OrderProvider;
pub use payments::PaymentProvider;
pub use settlements::SettlementProvider;
pub use users::{UserFilter, UserProvider};
pub use wallets::WalletProvider;
pub use withdrawals::WithdrawalProvider;

use sqlx::PgPool;

pub trait Storage:
    UserProvider
    + WalletProvider
    + OrderProvider
    + PaymentProvider
    + SettlementProvider
    + DepositProvider
    + WithdrawalProvider
    + AuditLogProvider
    + Send
    + Sync
    + 'static
{
}

/// Postgres-backed implementation of every provider trait above.
#[derive(Clone)]
pub struct PgStorage {
    pub(crate) pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        PgStorage { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Storage for PgStorage {}

pub(crate) fn db_err(context: &str, e: sqlx::Error) -> settle_common::error::CoreError {
    log::error!("db error in {context}: {e}");
    settle_common::error::CoreError::DbError
}
