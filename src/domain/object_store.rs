//! Object storage collaborator interface
//!
//! Buckets map one-to-one to projects, keys to file names. Calls return
//! plain results; the caller owns compensation when a call fails after a
//! local mutation.

use async_trait::async_trait;
use std::fmt::Debug;

use super::DomainError;

/// Object storage service
#[async_trait]
pub trait ObjectStore: Send + Sync + Debug {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, DomainError>;

    async fn create_bucket(&self, bucket: &str) -> Result<(), DomainError>;

    async fn delete_bucket(&self, bucket: &str) -> Result<(), DomainError>;

    async fn upload_file(&self, bucket: &str, key: &str, bytes: &[u8])
        -> Result<(), DomainError>;

    async fn rename_file(&self, bucket: &str, from: &str, to: &str) -> Result<(), DomainError>;

    async fn delete_file(&self, bucket: &str, key: &str) -> Result<(), DomainError>;
}
