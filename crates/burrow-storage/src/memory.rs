use async_trait::async_trait;
use burrow_core::repository::{Repository, Result};
use burrow_core::{OriginalUrl, ShortCode, StorageError};
use burrow_kv::PartitionedMap;
use tracing::{debug, trace};

/// Non-durable repository over a [`PartitionedMap`].
///
/// Both directions of a mapping are stored as keys of the same map, so each
/// lookup touches exactly one partition. Originals always contain `://` and
/// codes never do, so the two key spaces cannot collide.
///
/// A commit reserves the code first and then binds the original. If the
/// original turns out to be bound already, the reservation is rolled back.
/// Between the two steps a lookup of the reserved code may briefly see the
/// mapping, but no caller is ever handed a code that is later rolled back.
#[derive(Debug)]
pub struct InMemoryRepository {
    map: PartitionedMap<String, String>,
}

impl InMemoryRepository {
    /// Creates a repository with two partitions per logical CPU.
    pub fn new() -> Self {
        Self {
            map: PartitionedMap::with_default_partitions(),
        }
    }

    pub fn with_partitions(partitions: usize) -> Self {
        Self {
            map: PartitionedMap::new(partitions),
        }
    }

    pub fn partition_count(&self) -> usize {
        self.map.partition_count()
    }

    /// Returns the number of committed mappings.
    pub fn len(&self) -> usize {
        self.map.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create_or_get_shortened(
        &self,
        original: &OriginalUrl,
        candidate: &ShortCode,
    ) -> Result<ShortCode> {
        let code = candidate.as_str().to_owned();
        let url = original.as_str().to_owned();

        if let Some(owner) = self.map.get_or_insert(code.clone(), url.clone()) {
            if owner != url {
                debug!(code = %candidate, "Short code already bound to another original");
                return Err(StorageError::Conflict(candidate.clone()));
            }
        }

        match self.map.get_or_insert(url.clone(), code.clone()) {
            None => {
                debug!(code = %candidate, original = %original, "Committed new mapping");
                Ok(candidate.clone())
            }
            Some(existing) => {
                if existing != code {
                    self.map.remove_if(code.as_str(), url.as_str());
                    trace!(code = %candidate, existing = %existing, "Original already bound, released reservation");
                }
                Ok(ShortCode::new_unchecked(existing))
            }
        }
    }

    async fn get_original_by_shortened(&self, code: &ShortCode) -> Result<OriginalUrl> {
        self.map
            .get(code.as_str())
            .map(OriginalUrl::new_unchecked)
            .ok_or_else(|| StorageError::OriginalNotFound(code.clone()))
    }

    async fn get_shortened_by_original(&self, original: &OriginalUrl) -> Result<ShortCode> {
        self.map
            .get(original.as_str())
            .map(ShortCode::new_unchecked)
            .ok_or_else(|| StorageError::ShortenedNotFound(original.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn url(s: &str) -> OriginalUrl {
        OriginalUrl::new_unchecked(s)
    }

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    #[tokio::test]
    async fn create_and_lookup_both_directions() {
        let repo = InMemoryRepository::with_partitions(4);
        let original = url("https://example.com/a");
        let c = code("Ab12Cd34_9");

        let stored = repo.create_or_get_shortened(&original, &c).await.unwrap();
        assert_eq!(stored, c);

        assert_eq!(repo.get_original_by_shortened(&c).await.unwrap(), original);
        assert_eq!(repo.get_shortened_by_original(&original).await.unwrap(), c);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn existing_original_keeps_first_code() {
        let repo = InMemoryRepository::with_partitions(4);
        let original = url("https://example.com/a");
        let first = code("Ab12Cd34_9");
        let second = code("Zz98Yy76_0");

        repo.create_or_get_shortened(&original, &first).await.unwrap();
        let stored = repo.create_or_get_shortened(&original, &second).await.unwrap();

        assert_eq!(stored, first);
        // The losing candidate's reservation is released.
        assert!(matches!(
            repo.get_original_by_shortened(&second).await,
            Err(StorageError::OriginalNotFound(_))
        ));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn code_bound_to_other_original_conflicts() {
        let repo = InMemoryRepository::with_partitions(4);
        let c = code("Ab12Cd34_9");

        repo.create_or_get_shortened(&url("https://one.example"), &c)
            .await
            .unwrap();
        let err = repo
            .create_or_get_shortened(&url("https://two.example"), &c)
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Conflict(conflicted) if conflicted == c));
        assert!(matches!(
            repo.get_shortened_by_original(&url("https://two.example")).await,
            Err(StorageError::ShortenedNotFound(_))
        ));
    }

    #[tokio::test]
    async fn recommitting_same_pair_is_idempotent() {
        let repo = InMemoryRepository::with_partitions(4);
        let original = url("https://example.com/a");
        let c = code("Ab12Cd34_9");

        repo.create_or_get_shortened(&original, &c).await.unwrap();
        let again = repo.create_or_get_shortened(&original, &c).await.unwrap();

        assert_eq!(again, c);
        assert_eq!(repo.get_original_by_shortened(&c).await.unwrap(), original);
    }

    #[tokio::test]
    async fn missing_entries_are_typed_not_found() {
        let repo = InMemoryRepository::new();

        assert!(matches!(
            repo.get_original_by_shortened(&code("0000000000")).await,
            Err(StorageError::OriginalNotFound(c)) if c.as_str() == "0000000000"
        ));
        assert!(matches!(
            repo.get_shortened_by_original(&url("https://example.com")).await,
            Err(StorageError::ShortenedNotFound(_))
        ));
        assert!(repo.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_commits_converge_on_one_code() {
        let repo = Arc::new(InMemoryRepository::with_partitions(8));
        let original = url("https://example.com/race");

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let repo = Arc::clone(&repo);
                let original = original.clone();
                tokio::spawn(async move {
                    let candidate = code(&format!("race{i:06}"));
                    repo.create_or_get_shortened(&original, &candidate).await
                })
            })
            .collect();

        let mut codes = HashSet::new();
        for handle in handles {
            codes.insert(handle.await.unwrap().unwrap());
        }

        assert_eq!(codes.len(), 1);
        let winner = codes.into_iter().next().unwrap();
        assert_eq!(
            repo.get_original_by_shortened(&winner).await.unwrap(),
            original
        );
        assert_eq!(repo.len(), 1);
    }
}
