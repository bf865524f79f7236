//! Idempotency Cache (§2 IC, §4.8): stores the first response for a
//! client-supplied idempotency key so retried requests replay it rather
//! than re-executing the handler. Backed by Postgres rather than Redis:
//! unlike the Nonce Store and Distributed Lock, there is no TTL-bounded
//! single-owner contention here, just a lookup-or-store keyed on a string
//! the caller already treats as durable, so it lives next to the business
//! rows it guards and survives the same backups.

use serde_json::Value;
use settle_common::domain::idempotency::{DEFAULT_TTL_SECONDS, PAYMENT_TTL_SECONDS};
use settle_common::error::{CoreError, CoreResult, IdempotencyError};
use sha3::{Digest, Sha3_256};
use sqlx::PgPool;

/// Hashes the request body so a key reused with a different payload is
/// detectable (§4.8 step 1: "If present with a different hash, fail
/// IdempotencyConflict").
pub fn hash_request_body(body: &[u8]) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(body);
    hex::encode(hasher.finalize())
}

pub enum Lookup {
    Miss,
    Replay { status: u16, body: Value },
}

pub struct IdempotencyCache<'a> {
    pool: &'a PgPool,
}

impl<'a> IdempotencyCache<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        IdempotencyCache { pool }
    }

    /// Step 1 of §4.8: look up `key`; `Replay` if the request hash
    /// matches, `IdempotencyConflict` if it doesn't, `Miss` if absent or
    /// expired.
    pub async fn lookup(&self, key: &str, request_path: &str, request_hash: &str) -> CoreResult<Lookup> {
        let now = settle_common::time::get_current_time_in_seconds() as i64;
        let row = sqlx::query_as::<_, (String, i32, Value, i64)>(
            "SELECT request_hash, response_status, response_body, expires_at \
             FROM idempotency_keys WHERE key = $1 AND request_path = $2",
        )
        .bind(key)
        .bind(request_path)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            log::error!("idempotency lookup failed: {e}");
            CoreError::DbError
        })?;

        let Some((stored_hash, status, body, expires_at)) = row else {
            return Ok(Lookup::Miss);
        };

        if expires_at <= now {
            return Ok(Lookup::Miss);
        }

        if stored_hash != request_hash {
            return Err(CoreError::Idempotency(IdempotencyError::Conflict));
        }

        Ok(Lookup::Replay { status: status as u16, body })
    }

    /// Step 2 of §4.8: persists the handler's response. `is_payment_class`
    /// selects the 7-day TTL over the 24h default.
    pub async fn store(
        &self,
        key: &str,
        request_path: &str,
        request_hash: &str,
        status: u16,
        body: &Value,
        is_payment_class: bool,
    ) -> CoreResult<()> {
        let now = settle_common::time::get_current_time_in_seconds() as i64;
        let ttl = if is_payment_class { PAYMENT_TTL_SECONDS } else { DEFAULT_TTL_SECONDS };
        sqlx::query(
            "INSERT INTO idempotency_keys (key, request_path, request_hash, response_status, response_body, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (key, request_path) DO UPDATE SET \
                request_hash = EXCLUDED.request_hash, \
                response_status = EXCLUDED.response_status, \
                response_body = EXCLUDED.response_body, \
                expires_at = EXCLUDED.expires_at",
        )
        .bind(key)
        .bind(request_path)
        .bind(request_hash)
        .bind(status as i32)
        .bind(body)
        .bind(now + ttl)
        .execute(self.pool)
        .await
        .map_err(|e| {
            log::error!("idempotency store failed: {e}");
            CoreError::DbError
        })?;
        Ok(())
    }

    /// Background cleaner (§4.8: "A background cleaner removes expired
    /// rows"); returns the number of rows deleted.
    pub async fn purge_expired(&self) -> CoreResult<u64> {
        let now = settle_common::time::get_current_time_in_seconds() as i64;
        let result = sqlx::query("DELETE FROM idempotency_keys WHERE expires_at <= $1")
            .bind(now)
            .execute(self.pool)
            .await
            .map_err(|e| {
                log::error!("idempotency purge failed: {e}");
                CoreError::DbError
            })?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashing_is_deterministic_and_sensitive_to_body() {
        let a = hash_request_body(b"{\"amount\":1}");
        let b = hash_request_body(b"{\"amount\":1}");
        let c = hash_request_body(b"{\"amount\":2}");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
