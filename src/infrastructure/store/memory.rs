//! In-memory object store

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::object_store::ObjectStore;
use crate::domain::DomainError;

/// In-memory object store keeping buckets as maps of key -> bytes.
///
/// `set_should_fail(true)` makes every subsequent call fail, which is how
/// the bucket/file compensation paths are exercised in tests.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    buckets: Arc<RwLock<HashMap<String, HashMap<String, Vec<u8>>>>>,
    should_fail: Arc<RwLock<bool>>,
}

impl InMemoryObjectStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle failure of all subsequent calls
    pub async fn set_should_fail(&self, fail: bool) {
        *self.should_fail.write().await = fail;
    }

    /// Keys currently stored in a bucket
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        let buckets = self.buckets.read().await;
        buckets
            .get(bucket)
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }

    async fn check_should_fail(&self) -> Result<(), DomainError> {
        if *self.should_fail.read().await {
            return Err(DomainError::external_effect("object store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, DomainError> {
        self.check_should_fail().await?;
        let buckets = self.buckets.read().await;
        Ok(buckets.contains_key(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), DomainError> {
        self.check_should_fail().await?;
        let mut buckets = self.buckets.write().await;

        if buckets.contains_key(bucket) {
            return Err(DomainError::external_effect(format!(
                "bucket '{}' already exists",
                bucket
            )));
        }

        buckets.insert(bucket.to_string(), HashMap::new());
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), DomainError> {
        self.check_should_fail().await?;
        let mut buckets = self.buckets.write().await;

        if buckets.remove(bucket).is_none() {
            return Err(DomainError::external_effect(format!(
                "bucket '{}' does not exist",
                bucket
            )));
        }

        Ok(())
    }

    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        bytes: &[u8],
    ) -> Result<(), DomainError> {
        self.check_should_fail().await?;
        let mut buckets = self.buckets.write().await;

        let files = buckets.get_mut(bucket).ok_or_else(|| {
            DomainError::external_effect(format!("bucket '{}' does not exist", bucket))
        })?;

        files.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn rename_file(&self, bucket: &str, from: &str, to: &str) -> Result<(), DomainError> {
        self.check_should_fail().await?;
        let mut buckets = self.buckets.write().await;

        let files = buckets.get_mut(bucket).ok_or_else(|| {
            DomainError::external_effect(format!("bucket '{}' does not exist", bucket))
        })?;

        let bytes = files.remove(from).ok_or_else(|| {
            DomainError::external_effect(format!("key '{}' does not exist in '{}'", from, bucket))
        })?;

        files.insert(to.to_string(), bytes);
        Ok(())
    }

    async fn delete_file(&self, bucket: &str, key: &str) -> Result<(), DomainError> {
        self.check_should_fail().await?;
        let mut buckets = self.buckets.write().await;

        let files = buckets.get_mut(bucket).ok_or_else(|| {
            DomainError::external_effect(format!("bucket '{}' does not exist", bucket))
        })?;

        files.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bucket_lifecycle() {
        let store = InMemoryObjectStore::new();

        assert!(!store.bucket_exists("b1").await.unwrap());
        store.create_bucket("b1").await.unwrap();
        assert!(store.bucket_exists("b1").await.unwrap());

        assert!(store.create_bucket("b1").await.is_err());

        store.delete_bucket("b1").await.unwrap();
        assert!(!store.bucket_exists("b1").await.unwrap());
    }

    #[tokio::test]
    async fn test_file_lifecycle() {
        let store = InMemoryObjectStore::new();
        store.create_bucket("b1").await.unwrap();

        store.upload_file("b1", "a.svg", b"data").await.unwrap();
        assert_eq!(store.keys("b1").await, vec!["a.svg".to_string()]);

        store.rename_file("b1", "a.svg", "b.svg").await.unwrap();
        assert_eq!(store.keys("b1").await, vec!["b.svg".to_string()]);

        store.delete_file("b1", "b.svg").await.unwrap();
        assert!(store.keys("b1").await.is_empty());
    }

    #[tokio::test]
    async fn test_rename_missing_key_fails() {
        let store = InMemoryObjectStore::new();
        store.create_bucket("b1").await.unwrap();

        assert!(store.rename_file("b1", "missing", "x").await.is_err());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = InMemoryObjectStore::new();
        store.set_should_fail(true).await;

        assert!(store.bucket_exists("b1").await.is_err());
        assert!(store.create_bucket("b1").await.is_err());
    }
}
