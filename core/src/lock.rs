//! The Distributed Lock (§4.5): a per-resource named lock backed by the
//! shared key-value store, with TTL as a safety net and an atomic
//! check-and-delete release. Grounded on the teacher's ownership-token
//! idiom in `daemon/src/core/nonce_checker.rs`'s reservation handles,
//! generalized from an in-process `HashMap` to the shared `KvStore`.

use crate::kv::KvStore;
use rand::RngCore;
use settle_common::error::{CoreError, CoreResult, LockError};
use std::time::Duration;

fn lock_key(resource: &str) -> String {
    format!("lock:{resource}")
}

pub(crate) fn random_owner_token() -> String {
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// A held lock. Dropping this without calling `release` is safe (the TTL
/// is the safety net named in §4.5) but callers must still release on all
/// exit paths per the usage rules in §4.5 and §5.
pub struct LockHandle {
    resource: String,
    owner_token: String,
}

impl LockHandle {
    pub fn resource(&self) -> &str {
        &self.resource
    }
}

#[derive(Clone)]
pub struct DistributedLock {
    kv: KvStore,
}

impl DistributedLock {
    pub fn new(kv: KvStore) -> Self {
        DistributedLock { kv }
    }

    /// Atomically sets the resource key to a unique owner token if absent;
    /// `LockNotAcquired` on contention (§4.5).
    pub async fn acquire(&self, resource: &str, ttl: Duration) -> CoreResult<LockHandle> {
        let owner_token = random_owner_token();
        let acquired = self
            .kv
            .set_if_absent(&lock_key(resource), &owner_token, ttl)
            .await?;
        if !acquired {
            return Err(CoreError::Lock(LockError::LockNotAcquired));
        }
        Ok(LockHandle {
            resource: resource.to_string(),
            owner_token,
        })
    }

    /// Deletes the key only if its value still equals this holder's owner
    /// token; `LockNotHeld` (without touching the key) if not (§4.5).
    pub async fn release(&self, handle: &LockHandle) -> CoreResult<()> {
        let released = self
            .kv
            .delete_if_equals(&lock_key(&handle.resource), &handle.owner_token)
            .await?;
        if !released {
            return Err(CoreError::Lock(LockError::LockNotHeld));
        }
        Ok(())
    }

    /// Resets TTL only if still owned by this token (§4.5).
    pub async fn extend(&self, handle: &LockHandle, ttl: Duration) -> CoreResult<()> {
        let extended = self
            .kv
            .expire_if_equals(&lock_key(&handle.resource), &handle.owner_token, ttl)
            .await?;
        if !extended {
            return Err(CoreError::Lock(LockError::LockNotHeld));
        }
        Ok(())
    }

    /// Acquires multiple resources in ascending order to avoid deadlock
    /// (§4.5, §5). On partial failure, already-acquired locks are released
    /// before returning the error.
    pub async fn acquire_many(
        &self,
        resources: &[String],
        ttl: Duration,
    ) -> CoreResult<Vec<LockHandle>> {
        let mut sorted = resources.to_vec();
        sorted.sort();

        let mut held = Vec::with_capacity(sorted.len());
        for resource in sorted {
            match self.acquire(&resource, ttl).await {
                Ok(handle) => held.push(handle),
                Err(err) => {
                    for handle in held.iter().rev() {
                        if let Err(release_err) = self.release(handle).await {
                            log::warn!(
                                "failed to release {} while unwinding a partial acquire_many: {release_err}",
                                handle.resource()
                            );
                        }
                    }
                    return Err(err);
                }
            }
        }
        Ok(held)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_tokens_are_not_reused() {
        let a = random_owner_token();
        let b = random_owner_token();
        assert_ne!(a, b);
    }

    #[test]
    fn acquire_many_sorts_resources_ascending() {
        let mut resources = vec!["b".to_string(), "a".to_string(), "c".to_string()];
        resources.sort();
        assert_eq!(resources, vec!["a", "b", "c"]);
    }
}
