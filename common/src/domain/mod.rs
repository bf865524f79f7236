//! Core entities and their invariants (§3). These are plain data types;
//! the transition logic that mutates them lives in `settle-core`'s state
//! machines and balance engine, not here — matching the teacher's split
//! between `common` (types) and `daemon`/`core` (behavior).

pub mod account;
pub mod audit;
pub mod deposit;
pub mod idempotency;
pub mod ledger;
pub mod nonce;
pub mod order;
pub mod outbox;
pub mod payment;
pub mod settlement;
pub mod system_wallet;
pub mod user;
pub mod wallet;
pub mod withdrawal;

pub use account::{Account, AccountStatus, AccountType};
pub use audit::AuditLog;
pub use deposit::{Deposit, DepositStatus};
pub use idempotency::IdempotencyKey;
pub use ledger::{LedgerEntry, LedgerReference, LedgerSide};
pub use nonce::{NonceReservation, NonceState};
pub use order::{Order, OrderItem, OrderStatus};
pub use outbox::{OutboxEntry, OutboxStatus};
pub use payment::{Payment, PaymentStatus};
pub use settlement::{Settlement, SettlementStatus};
pub use system_wallet::{SystemWallet, SystemWalletRole};
pub use user::{KycStatus, User, UserRole, UserStatus};
pub use wallet::Wallet;
pub use withdrawal::{Withdrawal, WithdrawalStatus};
