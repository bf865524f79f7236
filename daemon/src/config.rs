//! CLI/environment configuration, grounded on the teacher's sub-config
//! pattern (`wallet/src/config.rs`'s `RPCConfig`/`NetworkConfig`/`LogConfig`):
//! one `clap::Args` struct per concern, flattened into a top-level
//! `clap::Parser`, each field reading its default from an environment
//! variable via `#[clap(long, env = "...")]` per §6's variable list.

use serde::{Deserialize, Serialize};
use settle_common::crypto::Address;

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8080
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct ServerConfig {
    /// SERVER_HOST (§6).
    #[clap(long, env = "SERVER_HOST", default_value_t = default_server_host())]
    #[serde(default = "default_server_host")]
    pub host: String,
    /// SERVER_PORT (§6).
    #[clap(long, env = "SERVER_PORT", default_value_t = default_server_port())]
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// SERVER_READ_TIMEOUT, seconds (§6).
    #[clap(long, env = "SERVER_READ_TIMEOUT", default_value_t = 15)]
    #[serde(default)]
    pub read_timeout_secs: u64,
    /// SERVER_WRITE_TIMEOUT, seconds (§6).
    #[clap(long, env = "SERVER_WRITE_TIMEOUT", default_value_t = 15)]
    #[serde(default)]
    pub write_timeout_secs: u64,
    /// ENVIRONMENT (§6): "development" | "staging" | "production". Only
    /// used to decide whether binding to 0.0.0.0 warrants the loud log
    /// warning the teacher's `rpc/mod.rs` prints for the same reason.
    #[clap(long, env = "ENVIRONMENT", default_value_t = String::from("development"))]
    #[serde(default)]
    pub environment: String,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[clap(long, env = "DB_HOST", default_value_t = String::from("localhost"))]
    #[serde(default)]
    pub host: String,
    #[clap(long, env = "DB_PORT", default_value_t = 5432)]
    #[serde(default)]
    pub port: u16,
    #[clap(long, env = "DB_USER", default_value_t = String::from("settle"))]
    #[serde(default)]
    pub user: String,
    #[clap(long, env = "DB_PASSWORD", default_value_t = String::new())]
    #[serde(default)]
    pub password: String,
    #[clap(long, env = "DB_NAME", default_value_t = String::from("settle"))]
    #[serde(default)]
    pub name: String,
    #[clap(long, env = "DB_MAX_OPEN_CONNS", default_value_t = 20)]
    #[serde(default)]
    pub max_open_conns: u32,
    #[clap(long, env = "DB_MAX_IDLE_CONNS", default_value_t = 5)]
    #[serde(default)]
    pub max_idle_conns: u32,
    /// Seconds.
    #[clap(long, env = "DB_CONN_MAX_LIFETIME", default_value_t = 1800)]
    #[serde(default)]
    pub conn_max_lifetime_secs: u64,
}

impl DatabaseConfig {
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct RedisConfig {
    #[clap(long, env = "REDIS_HOST", default_value_t = String::from("localhost"))]
    #[serde(default)]
    pub host: String,
    #[clap(long, env = "REDIS_PORT", default_value_t = 6379)]
    #[serde(default)]
    pub port: u16,
    #[clap(long, env = "REDIS_PASSWORD", default_value_t = String::new())]
    #[serde(default)]
    pub password: String,
    #[clap(long, env = "REDIS_DB", default_value_t = 0)]
    #[serde(default)]
    pub db: u8,
}

impl RedisConfig {
    pub fn connection_url(&self) -> String {
        if self.password.is_empty() {
            format!("redis://{}:{}/{}", self.host, self.port, self.db)
        } else {
            format!("redis://:{}@{}:{}/{}", self.password, self.host, self.port, self.db)
        }
    }
}

fn default_required_confirms() -> u32 {
    3
}

fn default_chain_tx_timeout() -> u64 {
    120
}

fn default_chain_polling_interval() -> u64 {
    1
}

/// CHAIN_RPC_URL / TOKEN_ADDRESS / MINTER_PRIVATE_KEY / REQUIRED_CONFIRMS /
/// CHAIN_TX_TIMEOUT / CHAIN_POLLING_INTERVAL (§6). Parsed and threaded
/// through for completeness; no on-chain RPC call is made anywhere in this
/// crate (deposit detection and withdrawal submission are left for an
/// external collaborator — see `ChainError`/`ChainTimeout` in the error
/// taxonomy).
#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct ChainConfig {
    #[clap(long, env = "CHAIN_RPC_URL", default_value_t = String::new())]
    #[serde(default)]
    pub rpc_url: String,
    #[clap(long, env = "TOKEN_ADDRESS", default_value_t = String::new())]
    #[serde(default)]
    pub token_address: String,
    /// Held as an opaque string; `settle-daemon` never signs a chain
    /// transaction itself, so this is never parsed into a signing key.
    #[clap(long, env = "MINTER_PRIVATE_KEY", default_value_t = String::new())]
    #[serde(default, skip_serializing)]
    pub minter_private_key: String,
    #[clap(long, env = "REQUIRED_CONFIRMS", default_value_t = default_required_confirms())]
    #[serde(default = "default_required_confirms")]
    pub required_confirms: u32,
    #[clap(long, env = "CHAIN_TX_TIMEOUT", default_value_t = default_chain_tx_timeout())]
    #[serde(default = "default_chain_tx_timeout")]
    pub tx_timeout_secs: u64,
    #[clap(long, env = "CHAIN_POLLING_INTERVAL", default_value_t = default_chain_polling_interval())]
    #[serde(default = "default_chain_polling_interval")]
    pub polling_interval_secs: u64,
}

fn default_worker_poll_interval() -> u64 {
    1
}

fn default_worker_batch_size() -> i64 {
    50
}

fn default_worker_max_retries() -> i32 {
    5
}

fn default_worker_retry_base_delay() -> u64 {
    1
}

fn default_worker_lock_ttl() -> u64 {
    30
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// WORKER_POLL_INTERVAL, seconds (§6).
    #[clap(long, env = "WORKER_POLL_INTERVAL", default_value_t = default_worker_poll_interval())]
    #[serde(default = "default_worker_poll_interval")]
    pub poll_interval_secs: u64,
    /// WORKER_BATCH_SIZE (§6).
    #[clap(long, env = "WORKER_BATCH_SIZE", default_value_t = default_worker_batch_size())]
    #[serde(default = "default_worker_batch_size")]
    pub batch_size: i64,
    /// WORKER_MAX_RETRIES (§6). Note: this is the daemon-level default for
    /// newly enqueued events; `settle-core`'s per-row `max_retries` column
    /// is the one actually enforced by the worker's claim/retry loop.
    #[clap(long, env = "WORKER_MAX_RETRIES", default_value_t = default_worker_max_retries())]
    #[serde(default = "default_worker_max_retries")]
    pub max_retries: i32,
    /// WORKER_RETRY_BASE_DELAY, seconds (§6) — unused directly since §4.7
    /// fixes the backoff formula to `2^(n-1)`, but kept for parity with the
    /// documented environment surface.
    #[clap(long, env = "WORKER_RETRY_BASE_DELAY", default_value_t = default_worker_retry_base_delay())]
    #[serde(default = "default_worker_retry_base_delay")]
    pub retry_base_delay_secs: u64,
    /// WORKER_LOCK_TTL, seconds (§6): the outbox lease TTL / distributed
    /// lock default TTL used by worker-owned resources.
    #[clap(long, env = "WORKER_LOCK_TTL", default_value_t = default_worker_lock_ttl())]
    #[serde(default = "default_worker_lock_ttl")]
    pub lock_ttl_secs: u64,
    /// WORKER_WEBHOOK_URL: where the outbox worker delivers
    /// `payment.*`/`settlement.*` events (§4.7). Left empty in
    /// environments with no downstream subscriber; the worker simply
    /// registers no processors and every event dead-letters immediately,
    /// which is visible in `outbox_entries` rather than silently dropped.
    #[clap(long, env = "WORKER_WEBHOOK_URL", default_value_t = String::new())]
    #[serde(default)]
    pub webhook_url: String,
}

fn default_timestamp_tolerance() -> u64 {
    settle_common::config::SignatureConfig::DEFAULT_TOLERANCE_SECS
}

/// EIP-712 domain + timestamp tolerance (§6: "EIP712 chain id and verifying
/// contract, timestamp tolerance").
#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct Eip712Config {
    #[clap(long, env = "EIP712_CHAIN_ID", default_value_t = 1)]
    #[serde(default)]
    pub chain_id: u64,
    #[clap(long, env = "EIP712_VERIFYING_CONTRACT")]
    pub verifying_contract: String,
    #[clap(long, env = "EIP712_TIMESTAMP_TOLERANCE", default_value_t = default_timestamp_tolerance())]
    #[serde(default = "default_timestamp_tolerance")]
    pub timestamp_tolerance_secs: u64,
}

impl Eip712Config {
    pub fn to_signature_config(&self) -> anyhow::Result<settle_common::config::SignatureConfig> {
        let verifying_contract = Address::parse(&self.verifying_contract)
            .map_err(|_| anyhow::anyhow!("EIP712_VERIFYING_CONTRACT is not a valid address"))?;
        Ok(settle_common::config::SignatureConfig {
            chain_id: self.chain_id,
            verifying_contract,
            timestamp_tolerance_secs: self.timestamp_tolerance_secs,
        })
    }
}

/// Top-level config shared by both the `settle-api` and `settle-worker`
/// binaries (§6), grounded on the teacher's `wallet::Config` pattern of
/// flattening per-concern sub-configs into one `clap::Parser` struct.
#[derive(Debug, Clone, clap::Parser, Serialize, Deserialize)]
#[command(about = "Settlement backend: transactional integrity layer over HTTP")]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,
    #[command(flatten)]
    pub database: DatabaseConfig,
    #[command(flatten)]
    pub redis: RedisConfig,
    #[command(flatten)]
    pub chain: ChainConfig,
    #[command(flatten)]
    pub worker: WorkerConfig,
    #[command(flatten)]
    pub eip712: Eip712Config,
}
