mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::create_test_state_with_cache;
use shortener::domain::errors::ShortenError;
use shortener::infrastructure::cache::{CacheError, CacheResult, CacheService, CachedLink};
use uuid::Uuid;

enum Slot {
    Live(CachedLink),
    Tombstone,
}

/// In-process cache with Redis-like semantics and a slow write path.
///
/// Fills only land on empty keys, invalidation leaves a tombstone, and every
/// fill sleeps first so a delete can overtake it.
struct SlowCache {
    slots: Mutex<HashMap<String, Slot>>,
    fill_delay: Duration,
    failing_invalidations: AtomicUsize,
}

impl SlowCache {
    fn new(fill_delay: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            fill_delay,
            failing_invalidations: AtomicUsize::new(0),
        }
    }

    /// Makes the next `n` invalidations fail.
    fn fail_invalidations(self, n: usize) -> Self {
        self.failing_invalidations.store(n, Ordering::SeqCst);
        self
    }

    fn holds_live_entry(&self, code: &str) -> bool {
        matches!(self.slots.lock().unwrap().get(code), Some(Slot::Live(_)))
    }
}

#[async_trait]
impl CacheService for SlowCache {
    async fn get_link(&self, code: &str) -> CacheResult<Option<CachedLink>> {
        Ok(match self.slots.lock().unwrap().get(code) {
            Some(Slot::Live(link)) => Some(link.clone()),
            _ => None,
        })
    }

    async fn set_link(
        &self,
        code: &str,
        link: &CachedLink,
        _ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        tokio::time::sleep(self.fill_delay).await;

        self.slots
            .lock()
            .unwrap()
            .entry(code.to_string())
            .or_insert_with(|| Slot::Live(link.clone()));
        Ok(())
    }

    async fn invalidate(&self, code: &str) -> CacheResult<()> {
        let failing = self
            .failing_invalidations
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(CacheError::OperationError("connection reset".to_string()));
        }

        self.slots
            .lock()
            .unwrap()
            .insert(code.to_string(), Slot::Tombstone);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[tokio::test]
async fn test_delete_during_cache_fill_is_not_undone() {
    let cache = Arc::new(SlowCache::new(Duration::from_millis(50)));
    let ctx = create_test_state_with_cache(cache.clone());
    let owner = Uuid::new_v4();

    let link = ctx
        .state
        .allocator
        .allocate(owner, "https://example.com/a")
        .await
        .unwrap();

    // Miss: the fill is still sleeping when the delete lands.
    assert_eq!(
        ctx.state.resolver.resolve(&link.code).await.unwrap(),
        "https://example.com/a"
    );
    ctx.state
        .link_service
        .delete_link(owner, &link.code)
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(!cache.holds_live_entry(&link.code));
    assert!(matches!(
        ctx.state.resolver.resolve(&link.code).await,
        Err(ShortenError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_failed_invalidation_does_not_leave_stale_fill() {
    let cache = Arc::new(SlowCache::new(Duration::from_millis(50)).fail_invalidations(1));
    let ctx = create_test_state_with_cache(cache.clone());
    let owner = Uuid::new_v4();

    let link = ctx
        .state
        .allocator
        .allocate(owner, "https://example.com/b")
        .await
        .unwrap();

    ctx.state.resolver.resolve(&link.code).await.unwrap();
    ctx.state
        .link_service
        .delete_link(owner, &link.code)
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(!cache.holds_live_entry(&link.code));
    assert!(matches!(
        ctx.state.resolver.resolve(&link.code).await,
        Err(ShortenError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_delete_after_cached_hit() {
    let cache = Arc::new(SlowCache::new(Duration::from_millis(1)));
    let ctx = create_test_state_with_cache(cache.clone());
    let owner = Uuid::new_v4();

    let link = ctx
        .state
        .allocator
        .allocate(owner, "https://example.com/c")
        .await
        .unwrap();

    ctx.state.resolver.resolve(&link.code).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(cache.holds_live_entry(&link.code));

    assert_eq!(
        ctx.state.resolver.resolve(&link.code).await.unwrap(),
        "https://example.com/c"
    );

    ctx.state
        .link_service
        .delete_link(owner, &link.code)
        .await
        .unwrap();

    assert!(matches!(
        ctx.state.resolver.resolve(&link.code).await,
        Err(ShortenError::NotFound { .. })
    ));
}
