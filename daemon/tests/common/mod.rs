//! Shared HTTP-level test harness (§8 S1-S6), grounded on the teacher's
//! `tck/tests/escrow_integration_test.rs` `create_test_storage()` helper:
//! one function per piece of fixture state, built directly against the
//! real storage rather than mocked. Every test in this crate drives the
//! actual `settle_daemon::handlers::configure` wiring through
//! `actix_web::test`, so what passes here is what the HTTP surface itself
//! does, not a unit-level stand-in for it.

use actix_web::{body::MessageBody, dev::Service, dev::ServiceResponse, middleware::from_fn, web, App, Error};
use rust_decimal::Decimal;
use settle_common::crypto::{wallet_verification_hash, Address, Eip712Domain};
use settle_common::ids::AccountId;
use settle_daemon::config::{ChainConfig, Config, DatabaseConfig, Eip712Config, RedisConfig, ServerConfig, WorkerConfig};
use settle_daemon::request_id::propagate;
use settle_daemon::state::AppState;
use sha3::{Digest, Keccak256};
use sqlx::PgPool;

/// A fixed, valid `Address` used as the EIP-712 verifying contract for
/// every test in this crate — tests only ever sign with this one domain.
pub const VERIFYING_CONTRACT: &str = "0x000000000000000000000000000000000000a1";
pub const CHAIN_ID: u64 = 1;

/// Builds a `Config` the way `Config::parse()` would from the default
/// environment (§6), without going through `clap` so a test doesn't need
/// a real argv or the environment variables it reads from. `database` is
/// unused once `AppState` is built directly from a `sqlx::test`-provided
/// pool, but is kept populated so `Config` stays a single real value
/// rather than a half-initialized one.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            read_timeout_secs: 15,
            write_timeout_secs: 15,
            environment: "test".to_string(),
        },
        database: DatabaseConfig {
            host: "localhost".to_string(),
            port: 5432,
            user: "settle".to_string(),
            password: String::new(),
            name: "settle".to_string(),
            max_open_conns: 5,
            max_idle_conns: 1,
            conn_max_lifetime_secs: 1800,
        },
        redis: RedisConfig {
            host: std::env::var("REDIS_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("REDIS_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(6379),
            password: String::new(),
            db: 0,
        },
        chain: ChainConfig {
            rpc_url: String::new(),
            token_address: String::new(),
            minter_private_key: String::new(),
            required_confirms: 3,
            tx_timeout_secs: 120,
            polling_interval_secs: 1,
        },
        worker: WorkerConfig {
            poll_interval_secs: 1,
            batch_size: 50,
            max_retries: 5,
            retry_base_delay_secs: 1,
            lock_ttl_secs: 30,
        },
        eip712: Eip712Config {
            chain_id: CHAIN_ID,
            verifying_contract: VERIFYING_CONTRACT.to_string(),
            timestamp_tolerance_secs: 300,
        },
    }
}

/// Wires a test `AppState` over a `sqlx::test`-provided, freshly migrated
/// pool, and runs the request through the real middleware/handler chain
/// (§5, §6) — the same `App` shape `bin/api.rs` builds, minus the
/// Prometheus exporter route, which no test here exercises.
pub async fn test_app(
    pool: PgPool,
) -> impl Service<actix_web::dev::ServiceRequest, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    let state = web::Data::new(AppState::new(pool, test_config()).await.expect("AppState::new"));
    actix_web::test::init_service(
        App::new()
            .app_data(state)
            .wrap(from_fn(propagate))
            .configure(settle_daemon::handlers::configure),
    )
    .await
}

/// Inserts a `users` row directly — payments/settlements tests only need a
/// row to satisfy `orders.buyer_user_id`'s foreign key, not the full user
/// lifecycle `tests/wallet_verification.rs` drives through the HTTP API.
pub async fn seed_user(pool: &PgPool) -> settle_common::ids::UserId {
    let id = settle_common::ids::UserId::new();
    let now = settle_common::time::get_current_time_in_seconds() as i64;
    sqlx::query(
        "INSERT INTO users (external_id, email, role, created_at, updated_at) \
         VALUES ($1, $2, 'buyer', $3, $3)",
    )
    .bind(id.0)
    .bind(format!("{}@example.com", id.0))
    .bind(now)
    .execute(pool)
    .await
    .expect("seed_user");
    id
}

/// Inserts an `orders` row directly: this surface has no order-creation
/// endpoint (payments reference an order only by id), so payment tests
/// seed the row their `order_external_id` foreign key requires the same
/// way `seed_account` does for `accounts`.
pub async fn seed_order(pool: &PgPool, buyer: settle_common::ids::UserId, total: Decimal) -> settle_common::ids::OrderId {
    let id = settle_common::ids::OrderId::new();
    let now = settle_common::time::get_current_time_in_seconds() as i64;
    sqlx::query(
        "INSERT INTO orders (external_id, buyer_user_id, total_amount, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $4)",
    )
    .bind(id.0)
    .bind(buyer.0)
    .bind(total)
    .bind(now)
    .execute(pool)
    .await
    .expect("seed_order");
    id
}

/// Inserts an `accounts` row directly (§3): no aggregate owns account
/// creation through the provider traits (see `handlers/accounts.rs`), so
/// every other storage module's integration tests seed accounts with a
/// plain insert rather than going through a nonexistent endpoint.
pub async fn seed_account(pool: &PgPool, account_type: &str, available: Decimal, held: Decimal) -> AccountId {
    let id = AccountId::new();
    sqlx::query(
        "INSERT INTO accounts (external_id, account_type, available_balance, held_balance, version, status) \
         VALUES ($1, $2, $3, $4, 0, 'active')",
    )
    .bind(id.0)
    .bind(account_type)
    .bind(available)
    .bind(held)
    .execute(pool)
    .await
    .expect("seed_account");
    id
}

/// Inserts a `pending` `outbox_entries` row directly, bypassing
/// `settle_core::outbox::enqueue`'s transaction requirement — the outbox
/// worker tests drive the row through `OutboxWorker::poll_once` rather
/// than through a business handler, so there is no unit-of-work to enqueue
/// from.
pub async fn seed_outbox_entry(pool: &PgPool, event_type: &str) -> settle_common::ids::OutboxEntryId {
    let id = settle_common::ids::OutboxEntryId::new();
    let now = settle_common::time::get_current_time_in_seconds() as i64;
    sqlx::query(
        "INSERT INTO outbox_entries \
         (external_id, event_type, aggregate_type, aggregate_id, payload, status, \
          retry_count, max_retries, next_retry_at, created_at) \
         VALUES ($1, $2, 'test-aggregate', 1, '{}'::jsonb, 'pending', 0, 5, $3, $3)",
    )
    .bind(id.0)
    .bind(event_type)
    .bind(now)
    .execute(pool)
    .await
    .expect("seed_outbox_entry");
    id
}

/// Forces a poll to pick up a row immediately by backdating its
/// `next_retry_at` and clearing any still-held lease, since the worker
/// tests control retry progression directly rather than waiting out the
/// real exponential backoff delay.
pub async fn make_outbox_entry_due_now(pool: &PgPool, id: settle_common::ids::OutboxEntryId) {
    let now = settle_common::time::get_current_time_in_seconds() as i64;
    sqlx::query(
        "UPDATE outbox_entries SET next_retry_at = $1, lease_expiry = NULL WHERE external_id = $2",
    )
    .bind(now)
    .bind(id.0)
    .execute(pool)
    .await
    .expect("make_outbox_entry_due_now");
}

pub async fn outbox_entry_snapshot(pool: &PgPool, id: settle_common::ids::OutboxEntryId) -> (String, i32) {
    sqlx::query_as::<_, (String, i32)>(
        "SELECT status, retry_count FROM outbox_entries WHERE external_id = $1",
    )
    .bind(id.0)
    .fetch_one(pool)
    .await
    .expect("outbox_entry_snapshot")
}

pub async fn account_snapshot(pool: &PgPool, account: AccountId) -> (Decimal, Decimal, i64) {
    sqlx::query_as::<_, (Decimal, Decimal, i64)>(
        "SELECT available_balance, held_balance, version FROM accounts WHERE external_id = $1",
    )
    .bind(account.0)
    .fetch_one(pool)
    .await
    .expect("account_snapshot")
}

/// A wallet-side keypair for signing verification requests, grounded on
/// `common/src/crypto/signature.rs`'s `round_trips_a_real_signature` unit
/// test: the same key-generation and 65-byte `r ∥ s ∥ v` assembly recipe,
/// lifted out so more than one integration test can sign with it.
pub struct TestWallet {
    secret: libsecp256k1::SecretKey,
    pub address: Address,
}

impl TestWallet {
    pub fn generate() -> Self {
        let secret = libsecp256k1::SecretKey::random(&mut rand::rngs::OsRng);
        let public = libsecp256k1::PublicKey::from_secret_key(&secret);
        let address = address_from_public_key(&public);
        TestWallet { secret, address }
    }

    /// Signs the EIP-712 wallet-verification hash (§4.4, §6) and returns
    /// the `0x`-prefixed 65-byte signature the `verify` endpoint expects.
    pub fn sign_verification(&self, nonce: &str, timestamp: u64) -> String {
        let domain = Eip712Domain::settlement(
            CHAIN_ID,
            Address::parse(VERIFYING_CONTRACT).expect("verifying contract address"),
        );
        let hash = wallet_verification_hash(&domain, &self.address, nonce, timestamp);

        let message = libsecp256k1::Message::parse(&hash);
        let (sig, recovery_id) = libsecp256k1::sign(&message, &self.secret);

        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&sig.serialize());
        bytes[64] = recovery_id.serialize() + 27;
        format!("0x{}", hex::encode(bytes))
    }
}

fn address_from_public_key(public_key: &libsecp256k1::PublicKey) -> Address {
    let uncompressed = public_key.serialize();
    let mut hasher = Keccak256::new();
    hasher.update(&uncompressed[1..]);
    let hash: [u8; 32] = hasher.finalize().into();
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..]);
    Address::from_bytes(addr)
}
