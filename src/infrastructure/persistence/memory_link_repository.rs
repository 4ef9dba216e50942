//! In-process implementation of the mapping store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::domain::entities::ShortLink;
use crate::domain::errors::StoreError;
use crate::domain::repositories::{InsertOutcome, LinkRepository};

/// One slot per code ever inserted. `link` is `None` once the code is retired.
#[derive(Debug)]
struct Slot {
    link: Option<ShortLink>,
    position: u64,
}

/// Mapping store held in memory behind a single `RwLock`.
///
/// Suitable for single-instance deployments and tests. The write lock makes
/// the check and the insert of `insert_if_absent` one atomic step; the
/// sequence counter lives inside the store like the PostgreSQL sequence does.
#[derive(Debug, Default)]
pub struct InMemoryLinkRepository {
    slots: RwLock<HashMap<String, Slot>>,
    sequence: AtomicU64,
}

impl InMemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of codes ever inserted, retired ones included.
    pub async fn allocated_count(&self) -> usize {
        self.slots.read().await.len()
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn insert_if_absent(&self, link: &ShortLink) -> Result<InsertOutcome, StoreError> {
        let mut slots = self.slots.write().await;

        if slots.contains_key(&link.code) {
            return Ok(InsertOutcome::Collision);
        }

        let position = slots.len() as u64;
        slots.insert(
            link.code.clone(),
            Slot {
                link: Some(link.clone()),
                position,
            },
        );

        Ok(InsertOutcome::Inserted)
    }

    async fn get(&self, code: &str) -> Result<Option<ShortLink>, StoreError> {
        let slots = self.slots.read().await;
        Ok(slots.get(code).and_then(|slot| slot.link.clone()))
    }

    async fn delete(&self, code: &str) -> Result<bool, StoreError> {
        let mut slots = self.slots.write().await;
        Ok(slots
            .get_mut(code)
            .and_then(|slot| slot.link.take())
            .is_some())
    }

    async fn next_sequence(&self) -> Result<u64, StoreError> {
        Ok(self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn scan_active(&self) -> Result<Vec<ShortLink>, StoreError> {
        let slots = self.slots.read().await;

        let mut active: Vec<(u64, ShortLink)> = slots
            .values()
            .filter_map(|slot| slot.link.clone().map(|link| (slot.position, link)))
            .collect();
        active.sort_by_key(|(position, _)| *position);

        Ok(active.into_iter().map(|(_, link)| link).collect())
    }

    async fn list_expired(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ShortLink>, StoreError> {
        let slots = self.slots.read().await;

        let mut expired: Vec<ShortLink> = slots
            .values()
            .filter_map(|slot| slot.link.as_ref())
            .filter(|link| link.is_expired_at(now))
            .cloned()
            .collect();
        expired.sort_by_key(|link| link.expires_at);
        expired.truncate(limit.max(0) as usize);

        Ok(expired)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn link(code: &str, expires_at: Option<DateTime<Utc>>) -> ShortLink {
        ShortLink::new(
            code.to_string(),
            Uuid::new_v4(),
            format!("https://example.com/{}", code),
            Utc::now(),
            expires_at,
        )
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let repo = InMemoryLinkRepository::new();
        let link = link("abc123", None);

        let outcome = repo.insert_if_absent(&link).await.unwrap();

        assert_eq!(outcome, InsertOutcome::Inserted);
        assert_eq!(repo.get("abc123").await.unwrap(), Some(link));
    }

    #[tokio::test]
    async fn test_collision_does_not_overwrite() {
        let repo = InMemoryLinkRepository::new();
        let first = link("abc123", None);
        let mut second = link("abc123", None);
        second.target_url = "https://other.example.com/".to_string();

        repo.insert_if_absent(&first).await.unwrap();
        let outcome = repo.insert_if_absent(&second).await.unwrap();

        assert_eq!(outcome, InsertOutcome::Collision);
        assert_eq!(
            repo.get("abc123").await.unwrap().unwrap().target_url,
            first.target_url
        );
    }

    #[tokio::test]
    async fn test_get_unknown_code() {
        let repo = InMemoryLinkRepository::new();
        assert!(repo.get("nothing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_retires_code() {
        let repo = InMemoryLinkRepository::new();
        repo.insert_if_absent(&link("abc123", None)).await.unwrap();

        assert!(repo.delete("abc123").await.unwrap());
        assert!(!repo.delete("abc123").await.unwrap());
        assert!(repo.get("abc123").await.unwrap().is_none());

        let outcome = repo.insert_if_absent(&link("abc123", None)).await.unwrap();
        assert_eq!(outcome, InsertOutcome::Collision);
    }

    #[tokio::test]
    async fn test_sequence_is_monotonic() {
        let repo = InMemoryLinkRepository::new();
        assert_eq!(repo.next_sequence().await.unwrap(), 1);
        assert_eq!(repo.next_sequence().await.unwrap(), 2);
        assert_eq!(repo.next_sequence().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_scan_active_keeps_insertion_order_and_skips_deleted() {
        let repo = InMemoryLinkRepository::new();
        for code in ["ccc111", "aaa222", "bbb333"] {
            repo.insert_if_absent(&link(code, None)).await.unwrap();
        }
        repo.delete("aaa222").await.unwrap();

        let codes: Vec<String> = repo
            .scan_active()
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.code)
            .collect();

        assert_eq!(codes, vec!["ccc111", "bbb333"]);
    }

    #[tokio::test]
    async fn test_list_expired_respects_limit() {
        let repo = InMemoryLinkRepository::new();
        let now = Utc::now();
        repo.insert_if_absent(&link("old001", Some(now - Duration::hours(2))))
            .await
            .unwrap();
        repo.insert_if_absent(&link("old002", Some(now - Duration::hours(1))))
            .await
            .unwrap();
        repo.insert_if_absent(&link("new001", Some(now + Duration::hours(1))))
            .await
            .unwrap();
        repo.insert_if_absent(&link("none01", None)).await.unwrap();

        let expired = repo.list_expired(now, 10).await.unwrap();
        let codes: Vec<&str> = expired.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["old001", "old002"]);

        let limited = repo.list_expired(now, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].code, "old001");
    }
}
