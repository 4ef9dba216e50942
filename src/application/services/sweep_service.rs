//! Background retirement of expired links.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use tracing::{debug, error, info, warn};

use crate::domain::errors::ShortenError;
use crate::domain::repositories::{LinkRepository, OwnershipIndex};
use crate::infrastructure::cache::CacheService;

/// Maximum number of links retired per sweep.
pub const SWEEP_BATCH_SIZE: i64 = 500;

/// Retires expired links: index entry first, then the store row, then the cache entry.
pub struct SweepService {
    store: Arc<dyn LinkRepository>,
    index: Arc<dyn OwnershipIndex>,
    cache: Arc<dyn CacheService>,
}

impl SweepService {
    pub fn new(
        store: Arc<dyn LinkRepository>,
        index: Arc<dyn OwnershipIndex>,
        cache: Arc<dyn CacheService>,
    ) -> Self {
        Self {
            store,
            index,
            cache,
        }
    }

    /// Runs one sweep and returns the number of links retired.
    ///
    /// A link whose index entry cannot be removed is left in place for the
    /// next sweep.
    ///
    /// # Errors
    ///
    /// Returns [`ShortenError::Unavailable`] if the expired links cannot be listed.
    pub async fn sweep_once(&self) -> Result<usize, ShortenError> {
        let expired = self.store.list_expired(Utc::now(), SWEEP_BATCH_SIZE).await?;
        let mut retired = 0;

        for link in expired {
            if let Err(e) = self.index.remove(link.owner_id, &link.code).await {
                warn!(code = %link.code, error = %e, "Failed to unindex expired link");
                continue;
            }

            match self.store.delete(&link.code).await {
                Ok(true) => retired += 1,
                Ok(false) => debug!(code = %link.code, "Expired link already retired"),
                Err(e) => {
                    warn!(code = %link.code, error = %e, "Failed to retire expired link");
                    continue;
                }
            }

            if let Err(e) = self.cache.invalidate(&link.code).await {
                warn!(code = %link.code, error = %e, "Failed to invalidate expired link");
            }
        }

        counter!("shortener_links_swept_total").increment(retired as u64);
        Ok(retired)
    }
}

/// Runs [`SweepService::sweep_once`] every `interval` until the task is dropped.
pub async fn run_expiry_sweeper(service: Arc<SweepService>, interval: Duration) {
    info!(interval_secs = interval.as_secs(), "Expiry sweeper started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        match service.sweep_once().await {
            Ok(0) => debug!("Expiry sweep found nothing to retire"),
            Ok(retired) => info!(retired, "Expiry sweep retired links"),
            Err(e) => error!(error = %e, "Expiry sweep failed"),
        }
    }
}
