//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;

/// Object store abstraction for content-addressed storage.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Check if an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Get an object's content.
    ///
    /// Returns `StorageError::NotFound` when the key is absent.
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Put an object atomically.
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()>;

    /// Put an object only if it doesn't exist.
    ///
    /// Returns true if the object was written.
    async fn put_if_not_exists(&self, key: &str, data: Bytes) -> StorageResult<bool>;

    /// Delete an object.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Get the name of this storage backend.
    ///
    /// Used for logging.
    fn backend_name(&self) -> &'static str;

    /// Verify storage backend connectivity.
    ///
    /// The default implementation returns Ok(()), suitable for backends that
    /// don't require connectivity verification.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
