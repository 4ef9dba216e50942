//! In-process implementation of the ownership index.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::ShortLink;
use crate::domain::errors::StoreError;
use crate::domain::repositories::OwnershipIndex;

/// Owner → codes map kept in memory, codes in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryOwnershipIndex {
    owners: RwLock<HashMap<Uuid, Vec<String>>>,
}

impl InMemoryOwnershipIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OwnershipIndex for InMemoryOwnershipIndex {
    async fn append(&self, owner_id: Uuid, code: &str) -> Result<(), StoreError> {
        let mut owners = self.owners.write().await;
        let codes = owners.entry(owner_id).or_default();

        if !codes.iter().any(|c| c == code) {
            codes.push(code.to_string());
        }

        Ok(())
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<String>, StoreError> {
        let owners = self.owners.read().await;
        Ok(owners.get(&owner_id).cloned().unwrap_or_default())
    }

    async fn remove(&self, owner_id: Uuid, code: &str) -> Result<bool, StoreError> {
        let mut owners = self.owners.write().await;

        let Some(codes) = owners.get_mut(&owner_id) else {
            return Ok(false);
        };

        let before = codes.len();
        codes.retain(|c| c != code);
        let removed = codes.len() != before;

        if codes.is_empty() {
            owners.remove(&owner_id);
        }

        Ok(removed)
    }

    async fn rebuild(&self, links: &[ShortLink]) -> Result<(), StoreError> {
        let mut rebuilt: HashMap<Uuid, Vec<String>> = HashMap::new();
        for link in links {
            rebuilt
                .entry(link.owner_id)
                .or_default()
                .push(link.code.clone());
        }

        *self.owners.write().await = rebuilt;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_append_and_list_in_order() {
        let index = InMemoryOwnershipIndex::new();
        let owner = Uuid::new_v4();

        index.append(owner, "zzz999").await.unwrap();
        index.append(owner, "aaa111").await.unwrap();
        index.append(owner, "zzz999").await.unwrap();

        assert_eq!(index.list(owner).await.unwrap(), vec!["zzz999", "aaa111"]);
    }

    #[tokio::test]
    async fn test_owners_are_isolated() {
        let index = InMemoryOwnershipIndex::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        index.append(alice, "alice1").await.unwrap();
        index.append(bob, "bob111").await.unwrap();

        assert_eq!(index.list(alice).await.unwrap(), vec!["alice1"]);
        assert_eq!(index.list(bob).await.unwrap(), vec!["bob111"]);
        assert!(!index.remove(alice, "bob111").await.unwrap());
    }

    #[tokio::test]
    async fn test_remove() {
        let index = InMemoryOwnershipIndex::new();
        let owner = Uuid::new_v4();
        index.append(owner, "abc123").await.unwrap();

        assert!(index.remove(owner, "abc123").await.unwrap());
        assert!(!index.remove(owner, "abc123").await.unwrap());
        assert!(index.list(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rebuild_replaces_contents() {
        let index = InMemoryOwnershipIndex::new();
        let owner = Uuid::new_v4();
        index.append(owner, "stale1").await.unwrap();

        let links = vec![
            ShortLink::new(
                "fresh1".to_string(),
                owner,
                "https://example.com/1".to_string(),
                Utc::now(),
                None,
            ),
            ShortLink::new(
                "fresh2".to_string(),
                owner,
                "https://example.com/2".to_string(),
                Utc::now(),
                None,
            ),
        ];
        index.rebuild(&links).await.unwrap();

        assert_eq!(index.list(owner).await.unwrap(), vec!["fresh1", "fresh2"]);
    }
}
