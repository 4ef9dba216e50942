//! Read path: short code to target URL.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use tracing::{debug, warn};

use crate::domain::errors::ShortenError;
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::{CacheService, CachedLink};
use crate::utils::code_generator::is_valid_code;

/// Resolves short codes for the redirect endpoint.
///
/// Never writes to the mapping store and never retries. A cache failure falls
/// back to the store; a store failure is reported as unavailable.
pub struct Resolver {
    store: Arc<dyn LinkRepository>,
    cache: Arc<dyn CacheService>,
    cache_ttl_seconds: u64,
}

impl Resolver {
    pub fn new(
        store: Arc<dyn LinkRepository>,
        cache: Arc<dyn CacheService>,
        cache_ttl_seconds: u64,
    ) -> Self {
        Self {
            store,
            cache,
            cache_ttl_seconds,
        }
    }

    /// Returns the exact target URL stored for `code`.
    ///
    /// # Errors
    ///
    /// - [`ShortenError::NotFound`] for malformed, unknown or deleted codes
    /// - [`ShortenError::Expired`] once `expires_at` has passed
    /// - [`ShortenError::Unavailable`] if the store cannot be read
    pub async fn resolve(&self, code: &str) -> Result<String, ShortenError> {
        if !is_valid_code(code) {
            counter!("shortener_redirects_total", "outcome" => "not_found").increment(1);
            return Err(ShortenError::not_found(code));
        }

        let now = Utc::now();

        match self.cache.get_link(code).await {
            Ok(Some(cached)) => {
                return self.answer(code, cached.target_url, cached.expires_at, now, "hit");
            }
            Ok(None) => {}
            Err(e) => {
                warn!(code, error = %e, "Cache lookup failed, reading store");
            }
        }

        let link = match self.store.get(code).await {
            Ok(Some(link)) => link,
            Ok(None) => {
                counter!("shortener_redirects_total", "outcome" => "not_found").increment(1);
                return Err(ShortenError::not_found(code));
            }
            Err(e) => {
                counter!("shortener_redirects_total", "outcome" => "unavailable").increment(1);
                return Err(e.into());
            }
        };

        if !link.is_expired_at(now) {
            self.fill_cache(code, &link.target_url, link.expires_at, now);
        }

        self.answer(code, link.target_url, link.expires_at, now, "miss")
    }

    fn answer(
        &self,
        code: &str,
        target_url: String,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        cache: &'static str,
    ) -> Result<String, ShortenError> {
        if expires_at.is_some_and(|e| now >= e) {
            counter!("shortener_redirects_total", "outcome" => "expired").increment(1);
            return Err(ShortenError::Expired {
                code: code.to_string(),
            });
        }

        counter!("shortener_redirects_total", "outcome" => "found", "cache" => cache).increment(1);
        debug!(code, cache, "Resolved short code");
        Ok(target_url)
    }

    /// Caches the entry in the background; the TTL never outlives the link.
    ///
    /// The write is conditional, so a tombstone left by a concurrent delete
    /// wins. The store is read once more afterwards and the entry dropped if
    /// the link was retired meanwhile, which covers a delete whose
    /// invalidation failed.
    fn fill_cache(
        &self,
        code: &str,
        target_url: &str,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) {
        if !self.cache.is_enabled() {
            return;
        }

        let ttl = match expires_at {
            Some(e) => {
                let remaining = (e - now).num_seconds().max(1) as u64;
                remaining.min(self.cache_ttl_seconds)
            }
            None => self.cache_ttl_seconds,
        };

        let cache = self.cache.clone();
        let store = self.store.clone();
        let code = code.to_string();
        let entry = CachedLink {
            target_url: target_url.to_string(),
            expires_at,
        };

        tokio::spawn(async move {
            if let Err(e) = cache.set_link(&code, &entry, Some(ttl)).await {
                warn!(code, error = %e, "Cache fill failed");
                return;
            }

            match store.get(&code).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    debug!(code, "Link retired during cache fill, dropping entry");
                    if let Err(e) = cache.invalidate(&code).await {
                        warn!(code, error = %e, "Failed to drop stale cache fill");
                    }
                }
                Err(e) => warn!(code, error = %e, "Could not confirm cache fill"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ShortLink;
    use crate::domain::errors::StoreError;
    use crate::domain::repositories::MockLinkRepository;
    use crate::infrastructure::cache::{CacheError, MockCacheService, NullCache};
    use uuid::Uuid;

    fn link(code: &str, target: &str, expires_at: Option<DateTime<Utc>>) -> ShortLink {
        ShortLink::new(
            code.to_string(),
            Uuid::new_v4(),
            target.to_string(),
            Utc::now(),
            expires_at,
        )
    }

    fn resolver(store: MockLinkRepository) -> Resolver {
        Resolver::new(Arc::new(store), Arc::new(NullCache::new()), 3600)
    }

    #[tokio::test]
    async fn test_resolve_returns_exact_target() {
        let mut store = MockLinkRepository::new();
        store
            .expect_get()
            .withf(|code| code == "abc1234")
            .times(1)
            .returning(|code| Ok(Some(link(code, "https://Example.com/A?x=1#frag", None))));

        let target = resolver(store).resolve("abc1234").await.unwrap();

        assert_eq!(target, "https://Example.com/A?x=1#frag");
    }

    #[tokio::test]
    async fn test_resolve_unknown_code() {
        let mut store = MockLinkRepository::new();
        store.expect_get().times(1).returning(|_| Ok(None));

        let result = resolver(store).resolve("zzzzzzz").await;

        assert!(matches!(result, Err(ShortenError::NotFound { code }) if code == "zzzzzzz"));
    }

    #[tokio::test]
    async fn test_malformed_code_skips_store() {
        let mut store = MockLinkRepository::new();
        store.expect_get().times(0);
        let resolver = resolver(store);

        for code in ["abc", "abcdefghij", "abc-123", "abc 1234", ""] {
            let result = resolver.resolve(code).await;
            assert!(matches!(result, Err(ShortenError::NotFound { .. })), "{}", code);
        }
    }

    #[tokio::test]
    async fn test_resolve_expired_link() {
        let mut store = MockLinkRepository::new();
        store.expect_get().times(1).returning(|code| {
            Ok(Some(link(
                code,
                "https://example.com",
                Some(Utc::now() - chrono::Duration::seconds(5)),
            )))
        });

        let result = resolver(store).resolve("abc1234").await;

        assert!(matches!(result, Err(ShortenError::Expired { .. })));
    }

    #[tokio::test]
    async fn test_store_failure_is_unavailable() {
        let mut store = MockLinkRepository::new();
        store
            .expect_get()
            .times(1)
            .returning(|_| Err(StoreError::Unavailable("timeout".to_string())));

        let result = resolver(store).resolve("abc1234").await;

        assert!(matches!(result, Err(ShortenError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_store() {
        let mut store = MockLinkRepository::new();
        store.expect_get().times(0);

        let mut cache = MockCacheService::new();
        cache.expect_get_link().times(1).returning(|_| {
            Ok(Some(CachedLink {
                target_url: "https://cached.example.com".to_string(),
                expires_at: None,
            }))
        });

        let resolver = Resolver::new(Arc::new(store), Arc::new(cache), 3600);
        let target = resolver.resolve("abc1234").await.unwrap();

        assert_eq!(target, "https://cached.example.com");
    }

    #[tokio::test]
    async fn test_expired_cache_entry_is_gone() {
        let mut store = MockLinkRepository::new();
        store.expect_get().times(0);

        let mut cache = MockCacheService::new();
        cache.expect_get_link().times(1).returning(|_| {
            Ok(Some(CachedLink {
                target_url: "https://cached.example.com".to_string(),
                expires_at: Some(Utc::now() - chrono::Duration::seconds(1)),
            }))
        });

        let resolver = Resolver::new(Arc::new(store), Arc::new(cache), 3600);
        let result = resolver.resolve("abc1234").await;

        assert!(matches!(result, Err(ShortenError::Expired { .. })));
    }

    #[tokio::test]
    async fn test_fill_dropped_when_link_retired_meanwhile() {
        let mut seq = mockall::Sequence::new();
        let mut store = MockLinkRepository::new();
        store
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|code| Ok(Some(link(code, "https://example.com/a", None))));
        store
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));

        let mut cache = MockCacheService::new();
        cache.expect_get_link().times(1).returning(|_| Ok(None));
        cache.expect_is_enabled().return_const(true);
        cache
            .expect_set_link()
            .times(1)
            .returning(|_, _, ttl| {
                assert_eq!(ttl, Some(3600));
                Ok(())
            });
        cache
            .expect_invalidate()
            .withf(|code| code == "abc1234")
            .times(1)
            .returning(|_| Ok(()));

        let resolver = Resolver::new(Arc::new(store), Arc::new(cache), 3600);
        let target = resolver.resolve("abc1234").await.unwrap();
        assert_eq!(target, "https://example.com/a");

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_fill_kept_when_link_still_active() {
        let mut store = MockLinkRepository::new();
        store
            .expect_get()
            .times(2)
            .returning(|code| Ok(Some(link(code, "https://example.com/a", None))));

        let mut cache = MockCacheService::new();
        cache.expect_get_link().times(1).returning(|_| Ok(None));
        cache.expect_is_enabled().return_const(true);
        cache.expect_set_link().times(1).returning(|_, _, _| Ok(()));
        cache.expect_invalidate().times(0);

        let resolver = Resolver::new(Arc::new(store), Arc::new(cache), 3600);
        resolver.resolve("abc1234").await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_cache_error_falls_back_to_store() {
        let mut store = MockLinkRepository::new();
        store
            .expect_get()
            .times(1)
            .returning(|code| Ok(Some(link(code, "https://example.com/fallback", None))));

        let mut cache = MockCacheService::new();
        cache
            .expect_get_link()
            .times(1)
            .returning(|_| Err(CacheError::ConnectionError("refused".to_string())));
        cache.expect_is_enabled().return_const(false);

        let resolver = Resolver::new(Arc::new(store), Arc::new(cache), 3600);
        let target = resolver.resolve("abc1234").await.unwrap();

        assert_eq!(target, "https://example.com/fallback");
    }
}
