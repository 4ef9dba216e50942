//! Short code allocation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use rand::Rng;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::entities::ShortLink;
use crate::domain::errors::ShortenError;
use crate::domain::repositories::{InsertOutcome, LinkRepository, OwnershipIndex};
use crate::utils::code_generator::{CodeGenerator, Strategy, is_reserved};
use crate::utils::target_url::validate_target_url;

/// Default retry bound for collision handling.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Produces a fresh short code for a target URL and records it.
///
/// Uniqueness is decided by the store's conditional insert alone; the
/// allocator never checks for a free code before writing. Store failures abort
/// the loop at once and are never counted as collisions.
pub struct Allocator {
    store: Arc<dyn LinkRepository>,
    index: Arc<dyn OwnershipIndex>,
    generator: Arc<dyn CodeGenerator>,
    max_attempts: u32,
}

impl Allocator {
    /// Creates a new allocator. `max_attempts` below 1 is raised to 1.
    pub fn new(
        store: Arc<dyn LinkRepository>,
        index: Arc<dyn OwnershipIndex>,
        generator: Arc<dyn CodeGenerator>,
        max_attempts: u32,
    ) -> Self {
        Self {
            store,
            index,
            generator,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Allocates a code for `target_url` without expiry.
    ///
    /// See [`Self::allocate_with_expiry`].
    pub async fn allocate(
        &self,
        owner_id: Uuid,
        target_url: &str,
    ) -> Result<ShortLink, ShortenError> {
        self.allocate_with_expiry(owner_id, target_url, None).await
    }

    /// Allocates a code for `target_url`, optionally valid until `expires_at`.
    ///
    /// Two calls with the same owner and URL produce two distinct links.
    ///
    /// # Errors
    ///
    /// - [`ShortenError::InvalidTarget`] if the URL fails validation (no store access)
    /// - [`ShortenError::InvalidExpiry`] if `expires_at` is not in the future
    /// - [`ShortenError::AllocationExhausted`] if every attempt collided
    /// - [`ShortenError::Unavailable`] on the first store failure
    pub async fn allocate_with_expiry(
        &self,
        owner_id: Uuid,
        target_url: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ShortLink, ShortenError> {
        validate_target_url(target_url).map_err(|e| ShortenError::InvalidTarget {
            reason: e.to_string(),
        })?;

        let created_at = Utc::now();
        if let Some(expires_at) = expires_at
            && expires_at <= created_at
        {
            return Err(ShortenError::InvalidExpiry {
                reason: "expires_at must be in the future".to_string(),
            });
        }

        for attempt in 1..=self.max_attempts {
            let seed = self.next_seed().await?;
            let code = self.generator.generate(seed);

            if is_reserved(&code) {
                debug!(attempt, code, "Generated reserved code, retrying");
                continue;
            }

            let link = ShortLink::new(
                code,
                owner_id,
                target_url.to_string(),
                created_at,
                expires_at,
            );

            match self.store.insert_if_absent(&link).await? {
                InsertOutcome::Inserted => {
                    counter!("shortener_allocations_total").increment(1);

                    // Listing lags resolution here; the reverse must never happen.
                    if let Err(e) = self.index.append(owner_id, &link.code).await {
                        warn!(
                            code = %link.code,
                            %owner_id,
                            error = %e,
                            "Link stored but not indexed; rebuild the ownership index"
                        );
                    }

                    debug!(attempt, code = %link.code, %owner_id, "Allocated short code");
                    return Ok(link);
                }
                InsertOutcome::Collision => {
                    counter!("shortener_allocation_collisions_total").increment(1);
                    debug!(attempt, code = %link.code, "Short code collision");
                }
            }
        }

        counter!("shortener_allocation_exhausted_total").increment(1);
        warn!(
            attempts = self.max_attempts,
            strategy = %self.generator.strategy(),
            "Allocation exhausted its retry budget"
        );

        Err(ShortenError::AllocationExhausted {
            attempts: self.max_attempts,
        })
    }

    async fn next_seed(&self) -> Result<u64, ShortenError> {
        match self.generator.strategy() {
            Strategy::Random => Ok(rand::rng().random()),
            Strategy::Sequence => Ok(self.store.next_sequence().await?),
        }
    }
}
