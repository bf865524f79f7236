//! Thin Redis client wrapper providing the primitives the Distributed Lock
//! (§4.5) and Nonce Store (§4.4) are built from: atomic set-if-absent with
//! TTL, and atomic check-and-delete. Grounded on the spec's own persisted
//! key-value layout (§6: `lock:<resource>`, `nonce:<address>:<nonce>`).

use redis::AsyncCommands;
use settle_common::error::{CoreError, CoreResult};
use std::time::Duration;

#[derive(Clone)]
pub struct KvStore {
    client: redis::Client,
}

impl KvStore {
    pub fn new(redis_url: &str) -> CoreResult<Self> {
        let client = redis::Client::open(redis_url).map_err(|e| {
            log::error!("failed to build redis client: {e}");
            CoreError::Internal
        })?;
        Ok(KvStore { client })
    }

    async fn connection(&self) -> CoreResult<redis::aio::MultiplexedConnection> {
        self.client.get_multiplexed_async_connection().await.map_err(|e| {
            log::error!("failed to connect to redis: {e}");
            CoreError::Internal
        })
    }

    /// `SET key value NX EX ttl` — creates `key` only if absent, with the
    /// given TTL. Returns `true` if this call created the key.
    pub async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> CoreResult<bool> {
        let mut conn = self.connection().await?;
        let result: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                log::error!("redis SET NX failed: {e}");
                CoreError::Internal
            })?;
        Ok(result.is_some())
    }

    pub async fn get(&self, key: &str) -> CoreResult<Option<String>> {
        let mut conn = self.connection().await?;
        conn.get(key).await.map_err(|e| {
            log::error!("redis GET failed: {e}");
            CoreError::Internal
        })
    }

    /// Deletes `key` only if its current value equals `expected` — a
    /// single atomic script, not a client-side read-then-delete (§9, §4.5).
    pub async fn delete_if_equals(&self, key: &str, expected: &str) -> CoreResult<bool> {
        const SCRIPT: &str = r#"
            if redis.call("GET", KEYS[1]) == ARGV[1] then
                return redis.call("DEL", KEYS[1])
            else
                return 0
            end
        "#;
        let mut conn = self.connection().await?;
        let deleted: i64 = redis::Script::new(SCRIPT)
            .key(key)
            .arg(expected)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| {
                log::error!("redis check-and-delete script failed: {e}");
                CoreError::Internal
            })?;
        Ok(deleted == 1)
    }

    /// Resets `key`'s TTL only if its current value equals `expected`
    /// (§4.5 `extend`).
    pub async fn expire_if_equals(&self, key: &str, expected: &str, ttl: Duration) -> CoreResult<bool> {
        const SCRIPT: &str = r#"
            if redis.call("GET", KEYS[1]) == ARGV[1] then
                return redis.call("EXPIRE", KEYS[1], ARGV[2])
            else
                return 0
            end
        "#;
        let mut conn = self.connection().await?;
        let extended: i64 = redis::Script::new(SCRIPT)
            .key(key)
            .arg(expected)
            .arg(ttl.as_secs().max(1))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| {
                log::error!("redis check-and-extend script failed: {e}");
                CoreError::Internal
            })?;
        Ok(extended == 1)
    }

    /// Unconditional delete, used by the Nonce Store to release a
    /// reservation on verification failure (§4.4 step 6).
    pub async fn delete(&self, key: &str) -> CoreResult<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(key).await.map_err(|e| {
            log::error!("redis DEL failed: {e}");
            CoreError::Internal
        })?;
        Ok(())
    }

    /// Unconditional set with TTL, used by the Nonce Store to mark a
    /// reservation Used (§4.4 step 7) without the set-if-absent guard.
    pub async fn set(&self, key: &str, value: &str, ttl: Duration) -> CoreResult<()> {
        let mut conn = self.connection().await?;
        let _: () = conn
            .set_ex(key, value, ttl.as_secs().max(1))
            .await
            .map_err(|e| {
                log::error!("redis SET EX failed: {e}");
                CoreError::Internal
            })?;
        Ok(())
    }
}
