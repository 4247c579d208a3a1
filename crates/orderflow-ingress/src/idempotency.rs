//! Idempotency guard: at most one in-flight processor per token.
//!
//! Admission is a single atomic set-if-absent on the shared [`LockStore`].
//! Attempting to admit a token that is still locked returns `false`.
//!
//! The token, not the business key, is the unit of exclusion. Two
//! submissions with different tokens and the same `(title, supplier,
//! consumer)` are both admitted; the validator's business-key check is the
//! only thing standing between them.
//!
//! Successful submissions never release their token. The entry expires via
//! TTL, so an immediate replay of the same token is refused.

use std::sync::Arc;
use std::time::Duration;

use orderflow_store::LockStore;
use orderflow_types::{IdempotencyToken, Result, constants};

/// Admits each idempotency token at most once per TTL window.
pub struct IdempotencyGuard {
    store: Arc<dyn LockStore>,
    ttl: Duration,
}

impl IdempotencyGuard {
    #[must_use]
    pub fn new(store: Arc<dyn LockStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Lock-store key for `token`.
    #[must_use]
    pub fn lock_key(token: &IdempotencyToken) -> String {
        format!("{}{}", constants::IDEMPOTENCY_KEY_PREFIX, token.as_str())
    }

    /// Try to become the exclusive processor for `token`.
    ///
    /// # Errors
    /// Propagates the lock store's error. Callers must treat it as a failed
    /// submission, never as an admission.
    pub async fn admit(&self, token: &IdempotencyToken) -> Result<bool> {
        let key = Self::lock_key(token);
        let admitted = self
            .store
            .set_if_absent(&key, constants::LOCKED_VALUE, self.ttl)
            .await?;
        if admitted {
            tracing::debug!(%token, ttl_secs = self.ttl.as_secs(), "Idempotency token admitted");
        } else {
            tracing::debug!(%token, "Idempotency token already locked");
        }
        Ok(admitted)
    }

    /// Drop the lock for `token` immediately. Compensating cleanup only.
    pub async fn release(&self, token: &IdempotencyToken) -> Result<bool> {
        let released = self.store.delete(&Self::lock_key(token)).await?;
        tracing::info!(%token, released, "Idempotency lock released");
        Ok(released)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use orderflow_store::{ManualClock, MemoryLockStore};
    use orderflow_types::OrderflowError;

    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    fn guard() -> IdempotencyGuard {
        IdempotencyGuard::new(Arc::new(MemoryLockStore::new()), TTL)
    }

    struct UnreachableLockStore;

    #[async_trait]
    impl LockStore for UnreachableLockStore {
        async fn set_if_absent(&self, _: &str, _: &str, _: Duration) -> Result<bool> {
            Err(OrderflowError::LockStoreUnavailable {
                reason: "connection refused".into(),
            })
        }

        async fn delete(&self, _: &str) -> Result<bool> {
            Err(OrderflowError::LockStoreUnavailable {
                reason: "connection refused".into(),
            })
        }
    }

    #[tokio::test]
    async fn first_admit_ok() {
        let guard = guard();
        let token = IdempotencyToken::new("t-1");
        assert!(guard.admit(&token).await.unwrap());
    }

    #[tokio::test]
    async fn double_admit_blocked() {
        let guard = guard();
        let token = IdempotencyToken::new("t-1");
        assert!(guard.admit(&token).await.unwrap());
        assert!(!guard.admit(&token).await.unwrap());
    }

    #[tokio::test]
    async fn different_tokens_ok() {
        let guard = guard();
        assert!(guard.admit(&IdempotencyToken::new("a")).await.unwrap());
        assert!(guard.admit(&IdempotencyToken::new("b")).await.unwrap());
    }

    #[tokio::test]
    async fn release_allows_readmission() {
        let guard = guard();
        let token = IdempotencyToken::new("t-1");
        guard.admit(&token).await.unwrap();
        assert!(guard.release(&token).await.unwrap());
        assert!(guard.admit(&token).await.unwrap());
    }

    #[tokio::test]
    async fn lock_expires_after_ttl() {
        let clock = Arc::new(ManualClock::default());
        let store = MemoryLockStore::with_clock(clock.clone());
        let guard = IdempotencyGuard::new(Arc::new(store), TTL);
        let token = IdempotencyToken::new("t-1");

        assert!(guard.admit(&token).await.unwrap());
        clock.advance(Duration::from_secs(59));
        assert!(!guard.admit(&token).await.unwrap());
        clock.advance(Duration::from_secs(1));
        assert!(guard.admit(&token).await.unwrap());
    }

    #[tokio::test]
    async fn key_is_namespaced() {
        let store = Arc::new(MemoryLockStore::new());
        let guard = IdempotencyGuard::new(store.clone(), TTL);
        guard.admit(&IdempotencyToken::new("abc")).await.unwrap();
        assert_eq!(store.get("idempotency:abc").as_deref(), Some("locked"));
    }

    #[tokio::test]
    async fn unavailable_store_is_an_error_not_an_admission() {
        let guard = IdempotencyGuard::new(Arc::new(UnreachableLockStore), TTL);
        let err = guard.admit(&IdempotencyToken::new("t")).await.unwrap_err();
        assert!(matches!(err, OrderflowError::LockStoreUnavailable { .. }));
    }
}
