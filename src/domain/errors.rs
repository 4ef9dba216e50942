//! Error taxonomy of the allocation and resolution core.
//!
//! Storage failures are kept apart from "collision" and "not found" so that
//! callers never mistake an unavailable store for a taken or missing code.

use thiserror::Error;

/// Failure of the underlying storage engine.
///
/// Always transient from the point of view of the core: it is surfaced
/// immediately and never retried here.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = %err, "Storage operation failed");
        Self::Unavailable(err.to_string())
    }
}

/// Errors returned by the allocator, resolver and link management.
///
/// Collisions never appear here: they are consumed by the allocator's
/// retry loop.
#[derive(Debug, Clone, Error)]
pub enum ShortenError {
    #[error("invalid target URL: {reason}")]
    InvalidTarget { reason: String },

    #[error("invalid expiry: {reason}")]
    InvalidExpiry { reason: String },

    #[error("no free short code found after {attempts} attempts")]
    AllocationExhausted { attempts: u32 },

    #[error("short code '{code}' not found")]
    NotFound { code: String },

    #[error("short code '{code}' has expired")]
    Expired { code: String },

    #[error(transparent)]
    Unavailable(#[from] StoreError),
}

impl ShortenError {
    pub fn not_found(code: impl Into<String>) -> Self {
        Self::NotFound { code: code.into() }
    }

    /// Whether the caller may reasonably retry the same request later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_converts_to_unavailable() {
        let err: ShortenError = StoreError::Unavailable("connection refused".to_string()).into();

        assert!(matches!(err, ShortenError::Unavailable(_)));
        assert!(err.is_transient());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_exhaustion_is_not_transient() {
        let err = ShortenError::AllocationExhausted { attempts: 10 };

        assert!(!err.is_transient());
        assert!(err.to_string().contains("10 attempts"));
    }

    #[test]
    fn test_sqlx_error_maps_to_unavailable() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
