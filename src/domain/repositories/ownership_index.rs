//! Ownership index trait: owner → codes they created.

use crate::domain::entities::ShortLink;
use crate::domain::errors::StoreError;
use async_trait::async_trait;
use uuid::Uuid;

/// Derived, non-authoritative listing of codes per owner.
///
/// The mapping store stays the source of truth; this index only holds code
/// strings and can be rebuilt from [`super::LinkRepository::scan_active`].
/// It is never read on the redirect path.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OwnershipIndex: Send + Sync {
    /// Records `code` as created by `owner_id`. Appending a code twice is a no-op.
    async fn append(&self, owner_id: Uuid, code: &str) -> Result<(), StoreError>;

    /// Returns the owner's codes in insertion order.
    async fn list(&self, owner_id: Uuid) -> Result<Vec<String>, StoreError>;

    /// Removes `code` from the owner's listing.
    ///
    /// Returns `Ok(false)` if the owner had no such code.
    async fn remove(&self, owner_id: Uuid, code: &str) -> Result<bool, StoreError>;

    /// Replaces the whole index with the given links, preserving their order.
    async fn rebuild(&self, links: &[ShortLink]) -> Result<(), StoreError>;
}
