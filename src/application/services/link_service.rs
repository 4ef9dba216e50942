//! Owner-facing link management: listing, deletion and index maintenance.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::entities::ShortLink;
use crate::domain::errors::ShortenError;
use crate::domain::repositories::{LinkRepository, OwnershipIndex};
use crate::infrastructure::cache::CacheService;

/// Service for managing an owner's short links.
///
/// The ownership index is consulted for listing only. Every code it returns is
/// confirmed against the mapping store, so a stale index entry is skipped
/// rather than reported.
pub struct LinkService {
    store: Arc<dyn LinkRepository>,
    index: Arc<dyn OwnershipIndex>,
    cache: Arc<dyn CacheService>,
    base_url: String,
}

impl LinkService {
    /// Creates a new link service.
    ///
    /// `base_url` is the public origin used to build short URLs; a trailing
    /// slash is ignored.
    pub fn new(
        store: Arc<dyn LinkRepository>,
        index: Arc<dyn OwnershipIndex>,
        cache: Arc<dyn CacheService>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            index,
            cache,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Lists the owner's active links in the order they were created.
    ///
    /// # Errors
    ///
    /// Returns [`ShortenError::Unavailable`] if the index or the store cannot be read.
    pub async fn list_links(&self, owner_id: Uuid) -> Result<Vec<ShortLink>, ShortenError> {
        let codes = self.index.list(owner_id).await?;
        let mut links = Vec::with_capacity(codes.len());

        for code in codes {
            match self.store.get(&code).await? {
                Some(link) if link.owner_id == owner_id => links.push(link),
                Some(_) => warn!(code, %owner_id, "Index entry points at another owner's link"),
                None => debug!(code, %owner_id, "Skipping retired code in ownership index"),
            }
        }

        Ok(links)
    }

    /// Deletes one of the owner's links and retires its code.
    ///
    /// The index entry goes first so a listed code is always resolvable.
    ///
    /// # Errors
    ///
    /// - [`ShortenError::NotFound`] if the code does not exist or belongs to someone else
    /// - [`ShortenError::Unavailable`] on store or index failure
    pub async fn delete_link(&self, owner_id: Uuid, code: &str) -> Result<(), ShortenError> {
        let link = self
            .store
            .get(code)
            .await?
            .filter(|link| link.owner_id == owner_id)
            .ok_or_else(|| ShortenError::not_found(code))?;

        self.index.remove(owner_id, &link.code).await?;

        if !self.store.delete(&link.code).await? {
            return Err(ShortenError::not_found(code));
        }

        if let Err(e) = self.cache.invalidate(&link.code).await {
            warn!(code, error = %e, "Failed to invalidate cached link");
        }

        info!(code, %owner_id, "Deleted short link");
        Ok(())
    }

    /// Replaces the ownership index with one derived from a full store scan.
    ///
    /// Returns the number of links indexed.
    pub async fn rebuild_index(&self) -> Result<usize, ShortenError> {
        let links = self.store.scan_active().await?;
        self.index.rebuild(&links).await?;

        info!(links = links.len(), "Rebuilt ownership index");
        Ok(links.len())
    }

    /// Constructs the full short URL for a code.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }
}
