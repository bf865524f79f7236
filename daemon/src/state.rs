//! Shared application state (§5), handed to every handler via
//! `web::Data<AppState>`. Grounded on the teacher's `DaemonRpcServer<S:
//! Storage>` generic-over-storage shape, specialized here to the single
//! `PgStorage` backend since §1 names Postgres + Redis as the storage
//! decision rather than leaving it pluggable.

use crate::config::Config;
use settle_common::error::{CoreError, CoreResult};
use settle_common::ids::InternalId;
use settle_core::{DistributedLock, KvStore, NonceStore, PgStorage, SignatureVerifier, UnitOfWork};
use sqlx::PgPool;
use std::time::Duration;

pub struct AppState {
    pub pool: PgPool,
    pub storage: PgStorage,
    pub uow: UnitOfWork,
    pub kv: KvStore,
    pub lock: DistributedLock,
    pub signature_verifier: SignatureVerifier,
    pub config: Config,
}

impl AppState {
    pub async fn new(pool: PgPool, config: Config) -> anyhow::Result<Self> {
        let kv = KvStore::new(&config.redis.connection_url())?;
        let lock = DistributedLock::new(kv.clone());
        let nonce_store = NonceStore::with_ttl(
            kv.clone(),
            Duration::from_secs(config.eip712.timestamp_tolerance_secs.max(
                settle_common::domain::nonce::DEFAULT_NONCE_TTL_SECONDS,
            )),
        );
        let signature_config = config.eip712.to_signature_config()?;
        let signature_verifier = SignatureVerifier::new(nonce_store, signature_config);
        let storage = PgStorage::new(pool.clone());
        let uow = UnitOfWork::new(pool.clone());

        Ok(AppState {
            pool,
            storage,
            uow,
            kv,
            lock,
            signature_verifier,
            config,
        })
    }

    /// Resolves an aggregate's internal (row) id from its external uuid.
    /// The storage providers only ever hand back external ids to keep
    /// internal keys out of the public API (§3); the Ledger Poster needs
    /// the internal id as `reference_id`, so this is the one seam where a
    /// handler reaches past the provider traits for a bare column read.
    pub async fn internal_id(&self, table: &str, external_id: uuid::Uuid) -> CoreResult<InternalId> {
        let query = format!("SELECT id FROM {table} WHERE external_id = $1");
        let row: (i64,) = sqlx::query_as(&query)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                log::error!("internal_id lookup on {table} failed: {e}");
                CoreError::DbError
            })?
            .ok_or_else(|| CoreError::NotFound(format!("{table} {external_id}")))?;
        Ok(InternalId(row.0))
    }

    /// Same lookup as `internal_id`, but against a caller-supplied
    /// transaction so it can see rows the transaction itself just inserted
    /// and hasn't committed yet.
    pub async fn internal_id_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        table: &str,
        external_id: uuid::Uuid,
    ) -> CoreResult<InternalId> {
        let query = format!("SELECT id FROM {table} WHERE external_id = $1");
        let row: (i64,) = sqlx::query_as(&query)
            .bind(external_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                log::error!("internal_id lookup on {table} failed: {e}");
                CoreError::DbError
            })?
            .ok_or_else(|| CoreError::NotFound(format!("{table} {external_id}")))?;
        Ok(InternalId(row.0))
    }
}
