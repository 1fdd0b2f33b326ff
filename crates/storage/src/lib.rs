//! Object storage abstraction and backends for Larder.
//!
//! This crate provides:
//! - The `ObjectStore` trait used by bulk transfers
//! - Content-addressed key layout for blobs
//! - A local filesystem backend with atomic writes

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::filesystem::FilesystemBackend;
pub use error::{StorageError, StorageResult};
pub use traits::ObjectStore;

use larder_core::config::StorageConfig;
use larder_core::Digest;
use std::sync::Arc;

/// Key prefix under which blobs are stored.
pub const CAS_PREFIX: &str = "cas";

/// Storage key for the blob named by `digest`.
///
/// The size is part of the key so that a truncated upload under the same
/// hash never shadows the full blob.
pub fn cas_key(digest: &Digest) -> String {
    let hex = digest.hash().to_hex();
    format!("{CAS_PREFIX}/{}/{hex}-{}", &hex[..2], digest.size_bytes())
}

/// Create an object store from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    config.validate().map_err(StorageError::Config)?;

    match config {
        StorageConfig::Filesystem { path } => {
            let backend = FilesystemBackend::new(path).await?;
            Ok(Arc::new(backend))
        }
    }
}
