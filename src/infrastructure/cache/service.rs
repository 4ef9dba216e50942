//! Cache service trait and error types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),
    #[error("Cache operation error: {0}")]
    OperationError(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// What the redirect path needs to answer a code without touching the store.
///
/// The expiry travels with the target so a cached entry can still be
/// answered as expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedLink {
    pub target_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Trait for caching resolved short links.
///
/// Implementations must be thread-safe and fail open: a cache failure degrades
/// to a store lookup, never to a wrong answer. Only positive lookups are
/// cached.
///
/// Retiring a code leaves a tombstone in place of the entry, and fills never
/// overwrite an existing key. A fill computed before a delete can therefore
/// not bring the deleted link back.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves the cached link for a short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(link))` on cache hit
    /// - `Ok(None)` on cache miss
    async fn get_link(&self, code: &str) -> CacheResult<Option<CachedLink>>;

    /// Stores a link with optional TTL in seconds (implementation default if `None`).
    ///
    /// Does nothing if the key already holds an entry or a tombstone.
    async fn set_link(&self, code: &str, link: &CachedLink, ttl_seconds: Option<u64>)
    -> CacheResult<()>;

    /// Replaces any cached entry with a tombstone that outlives every fill TTL.
    ///
    /// Used when a link is deleted or swept. A tombstone reads as a miss.
    async fn invalidate(&self, code: &str) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;

    /// Whether this cache is backed by a real store (used by health reporting).
    fn is_enabled(&self) -> bool {
        true
    }
}
