//! Mapping store trait: the durable short code → ShortLink table.

use crate::domain::entities::ShortLink;
use crate::domain::errors::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Outcome of a conditional insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The code is already held by another link (active or retired).
    Collision,
}

/// Durable store of short links keyed by code.
///
/// The store is the only shared mutable resource of the service. All mutation
/// goes through [`LinkRepository::insert_if_absent`] and
/// [`LinkRepository::delete`]; both are atomic per code.
///
/// Codes are never reused: a deleted or swept code stays reserved, so a later
/// `insert_if_absent` on it reports [`InsertOutcome::Collision`].
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::InMemoryLinkRepository`] - single-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Persists `link` iff no record holds `link.code`.
    ///
    /// Never mutates state on collision. Once this returns
    /// [`InsertOutcome::Inserted`], every later [`LinkRepository::get`] for
    /// the code observes the link.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the storage engine fails.
    async fn insert_if_absent(&self, link: &ShortLink) -> Result<InsertOutcome, StoreError>;

    /// Reads the active link for `code`, expired or not.
    ///
    /// Deleted links are reported as `None`.
    async fn get(&self, code: &str) -> Result<Option<ShortLink>, StoreError>;

    /// Retires the link held by `code`.
    ///
    /// Returns `Ok(true)` if an active link was removed, `Ok(false)` if there
    /// was nothing to remove.
    async fn delete(&self, code: &str) -> Result<bool, StoreError>;

    /// Returns the next value of the store-owned allocation counter.
    async fn next_sequence(&self) -> Result<u64, StoreError>;

    /// Lists every active link in creation order.
    async fn scan_active(&self) -> Result<Vec<ShortLink>, StoreError>;

    /// Lists up to `limit` active links whose expiry is at or before `now`.
    async fn list_expired(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ShortLink>, StoreError>;

    /// Checks that the storage engine answers.
    async fn ping(&self) -> Result<(), StoreError>;
}
