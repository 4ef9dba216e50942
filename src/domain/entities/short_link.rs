//! ShortLink entity: the canonical mapping from short code to target URL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A short code bound to a target URL on behalf of one owner.
///
/// Records are immutable once stored; they only leave the active set through
/// deletion or the expiry sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShortLink {
    pub code: String,
    pub owner_id: Uuid,
    pub target_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ShortLink {
    /// Creates a new ShortLink instance.
    pub fn new(
        code: String,
        owner_id: Uuid,
        target_url: String,
        created_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            code,
            owner_id,
            target_url,
            created_at,
            expires_at,
        }
    }

    /// Returns true if the validity window has passed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }

    /// Returns true if the link has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn link(expires_at: Option<DateTime<Utc>>) -> ShortLink {
        ShortLink::new(
            "abc1234".to_string(),
            Uuid::new_v4(),
            "https://example.com/".to_string(),
            Utc::now(),
            expires_at,
        )
    }

    #[test]
    fn test_link_without_expiry_never_expires() {
        let link = link(None);
        assert!(!link.is_expired());
        assert!(!link.is_expired_at(Utc::now() + Duration::days(3650)));
    }

    #[test]
    fn test_link_is_expired() {
        let link = link(Some(Utc::now() - Duration::seconds(1)));
        assert!(link.is_expired());
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let at = Utc::now();
        let link = link(Some(at));

        assert!(link.is_expired_at(at));
        assert!(!link.is_expired_at(at - Duration::milliseconds(1)));
    }
}
