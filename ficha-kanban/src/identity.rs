//! Current-user lookup with a short-lived cache

use crate::backend::IdentityProvider;
use crate::error::{FichaError, Result};
use crate::types::Principal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

struct Cached {
    principal: Option<Principal>,
    fetched_at: Instant,
}

/// Wraps an [`IdentityProvider`], reusing its answer until the TTL expires.
///
/// A signed-out answer (`None`) is cached too.
pub struct CachedIdentity {
    provider: Arc<dyn IdentityProvider>,
    ttl: Duration,
    cached: Mutex<Option<Cached>>,
}

impl CachedIdentity {
    pub fn new(provider: Arc<dyn IdentityProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            cached: Mutex::new(None),
        }
    }

    /// The signed-in principal, if any
    pub async fn current_user(&self) -> Result<Option<Principal>> {
        let mut cached = self.cached.lock().await;
        if let Some(entry) = cached.as_ref() {
            if entry.fetched_at.elapsed() < self.ttl {
                return Ok(entry.principal.clone());
            }
        }

        let principal = self.provider.current_user().await?;
        tracing::debug!(signed_in = principal.is_some(), "refreshed identity");
        *cached = Some(Cached {
            principal: principal.clone(),
            fetched_at: Instant::now(),
        });
        Ok(principal)
    }

    /// The signed-in principal, or [`FichaError::NotAuthenticated`]
    pub async fn require_user(&self) -> Result<Principal> {
        self.current_user()
            .await?
            .ok_or(FichaError::NotAuthenticated)
    }

    /// Drop the cached answer, e.g. after sign-in or sign-out
    pub async fn clear(&self) {
        *self.cached.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FixedIdentity;

    fn ana() -> Principal {
        Principal::new("u1", "Ana")
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_within_ttl() {
        let provider = Arc::new(FixedIdentity::signed_in(ana()));
        let identity = CachedIdentity::new(provider.clone(), Duration::from_secs(30));

        identity.current_user().await.unwrap();
        tokio::time::advance(Duration::from_secs(10)).await;
        let user = identity.current_user().await.unwrap();

        assert_eq!(user, Some(ana()));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetch_after_ttl() {
        let provider = Arc::new(FixedIdentity::signed_in(ana()));
        let identity = CachedIdentity::new(provider.clone(), Duration::from_secs(30));

        identity.current_user().await.unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;
        identity.current_user().await.unwrap();

        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_require_user_when_signed_out() {
        let identity =
            CachedIdentity::new(Arc::new(FixedIdentity::signed_out()), Duration::from_secs(30));
        let err = identity.require_user().await.unwrap_err();
        assert!(matches!(err, FichaError::NotAuthenticated));
        assert!(err.is_validation());
    }
}
