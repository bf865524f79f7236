//! The Nonce Store (§2 NS, §3, §4.4): at-most-once reservation of
//! signature nonces with TTL. Grounded on the teacher's
//! `daemon/src/core/nonce_checker.rs` `use_nonce`/`undo_nonce` pair (reserve
//! optimistically, undo on downstream failure), moved from an in-process
//! `HashMap` to the shared `KvStore` so the reservation is visible across
//! the API processes and the nonce actually survives a restart.

use crate::kv::KvStore;
use settle_common::domain::nonce::DEFAULT_NONCE_TTL_SECONDS;
use settle_common::error::{CoreError, CoreResult, SignatureError};
use std::time::Duration;

const RESERVED: &str = "reserved";
const USED: &str = "used";

fn nonce_key(address_lowercase: &str, nonce: &str) -> String {
    format!("nonce:{address_lowercase}:{nonce}")
}

#[derive(Clone)]
pub struct NonceStore {
    kv: KvStore,
    ttl: Duration,
}

impl NonceStore {
    pub fn new(kv: KvStore) -> Self {
        NonceStore {
            kv,
            ttl: Duration::from_secs(DEFAULT_NONCE_TTL_SECONDS),
        }
    }

    pub fn with_ttl(kv: KvStore, ttl: Duration) -> Self {
        NonceStore { kv, ttl }
    }

    /// Atomic set-if-absent, keyed by lower-cased address + nonce.
    /// Collision → `NonceReused` (§4.4 step 3).
    pub async fn reserve(&self, address_lowercase: &str, nonce: &str) -> CoreResult<()> {
        let key = nonce_key(address_lowercase, nonce);
        let created = self.kv.set_if_absent(&key, RESERVED, self.ttl).await?;
        if !created {
            return Err(CoreError::Signature(SignatureError::NonceReused));
        }
        Ok(())
    }

    /// Marks a reservation `Used`, terminal (§4.4 step 7, §9).
    pub async fn mark_used(&self, address_lowercase: &str, nonce: &str) -> CoreResult<()> {
        let key = nonce_key(address_lowercase, nonce);
        self.kv.set(&key, USED, self.ttl).await
    }

    /// Releases a reservation to permit a legitimate retry with the same
    /// nonce from the same address, used when verification fails after the
    /// nonce was reserved (§4.4 step 6). A nonce already marked `Used` is
    /// never released by this path — callers only call it between
    /// `reserve` and `mark_used`.
    pub async fn release(&self, address_lowercase: &str, nonce: &str) -> CoreResult<()> {
        let key = nonce_key(address_lowercase, nonce);
        self.kv.delete(&key).await
    }

    pub async fn state(&self, address_lowercase: &str, nonce: &str) -> CoreResult<Option<String>> {
        self.kv.get(&nonce_key(address_lowercase, nonce)).await
    }
}
