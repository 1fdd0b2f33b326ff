//! Concurrent bulk transfers against an object store.

use crate::bulk_error::{BulkTransferError, collect_results};
use crate::error::{CacheNotFound, TransferError, TransferResult};
use crate::lost_inputs::LostInputs;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use larder_core::{Digest, TransferConfig};
use larder_storage::{ObjectStore, StorageError, cas_key};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Moves batches of blobs between the caller and an object store.
///
/// Up to `max_concurrency` items are in flight at once. Outcomes are consumed
/// in request order on the awaiting task, so failures appear in the
/// resulting [`BulkTransferError`] in the order the items were requested.
pub struct BulkTransfer {
    store: Arc<dyn ObjectStore>,
    config: TransferConfig,
}

impl BulkTransfer {
    pub fn new(store: Arc<dyn ObjectStore>, config: TransferConfig) -> larder_core::Result<Self> {
        config.validate().map_err(larder_core::Error::Config)?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Download every blob in `digests`.
    ///
    /// Duplicate digests are fetched once.
    pub async fn download_blobs(
        &self,
        digests: &[Digest],
    ) -> Result<HashMap<Digest, Bytes>, BulkTransferError> {
        let mut seen = HashSet::new();
        let unique: Vec<Digest> = digests.iter().copied().filter(|d| seen.insert(*d)).collect();

        tracing::debug!(
            count = unique.len(),
            backend = self.store.backend_name(),
            "starting bulk download"
        );

        let outcomes: Vec<TransferResult<(Digest, Bytes)>> = stream::iter(unique)
            .map(|digest| async move { self.fetch(&digest).await.map(|data| (digest, data)) })
            .buffered(self.config.max_concurrency)
            .collect()
            .await;

        let blobs = collect_results(outcomes).inspect_err(|e| log_failures("download", e))?;
        tracing::debug!(count = blobs.len(), "bulk download finished");
        Ok(blobs.into_iter().collect())
    }

    /// Upload blobs, skipping any the store already holds.
    ///
    /// Returns the digest of each blob in input order.
    pub async fn upload_blobs(&self, blobs: Vec<Bytes>) -> Result<Vec<Digest>, BulkTransferError> {
        tracing::debug!(
            count = blobs.len(),
            backend = self.store.backend_name(),
            "starting bulk upload"
        );

        let outcomes: Vec<TransferResult<Digest>> = stream::iter(blobs)
            .map(|data| async move {
                let digest = Digest::of(&data);
                match self.store.put_if_not_exists(&cas_key(&digest), data).await {
                    Ok(written) => {
                        tracing::trace!(%digest, written, "uploaded blob");
                        Ok(digest)
                    }
                    Err(e) => Err(TransferError::wrapping(
                        format!("failed to upload {digest}: {e}"),
                        e,
                    )),
                }
            })
            .buffered(self.config.max_concurrency)
            .collect()
            .await;

        let digests = collect_results(outcomes).inspect_err(|e| log_failures("upload", e))?;
        tracing::debug!(count = digests.len(), "bulk upload finished");
        Ok(digests)
    }

    /// Fetch the inputs of a build step, keyed by input path.
    ///
    /// An input missing from the cache is reported as a failure wrapping
    /// [`LostInputs`], so a failed batch can be turned into a single
    /// regeneration request with [`BulkTransferError::into_lost_inputs`].
    pub async fn prefetch_inputs(
        &self,
        inputs: &[(PathBuf, Digest)],
    ) -> Result<HashMap<PathBuf, Bytes>, BulkTransferError> {
        tracing::debug!(count = inputs.len(), "prefetching inputs");

        let outcomes: Vec<TransferResult<(PathBuf, Bytes)>> = stream::iter(inputs)
            .map(|(path, digest)| async move {
                match self.fetch(digest).await {
                    Ok(data) => Ok((path.clone(), data)),
                    Err(TransferError::NotFound(_)) => Err(lost_input(path, *digest)),
                    Err(other) => Err(other),
                }
            })
            .buffered(self.config.max_concurrency)
            .collect()
            .await;

        let fetched = collect_results(outcomes).inspect_err(|e| log_failures("prefetch", e))?;
        Ok(fetched.into_iter().collect())
    }

    async fn fetch(&self, digest: &Digest) -> TransferResult<Bytes> {
        match self.store.get(&cas_key(digest)).await {
            Ok(data) if self.config.verify_digests && !digest.matches(&data) => {
                Err(TransferError::io(format!(
                    "digest mismatch for {digest}: received {}",
                    Digest::of(&data)
                )))
            }
            Ok(data) => Ok(data),
            Err(StorageError::NotFound(_)) => Err(CacheNotFound::new(*digest).into()),
            Err(e) => Err(TransferError::wrapping(
                format!("failed to download {digest}: {e}"),
                e,
            )),
        }
    }
}

fn lost_input(path: &Path, digest: Digest) -> TransferError {
    TransferError::wrapping(
        format!("input {} is missing from the cache ({digest})", path.display()),
        LostInputs::single(digest, path),
    )
}

fn log_failures(operation: &'static str, failures: &BulkTransferError) {
    for failure in failures {
        tracing::debug!(operation, kind = ?failure.kind(), error = %failure, "transfer failed");
    }
    tracing::warn!(
        operation,
        failures = failures.len(),
        only_not_found = failures.only_caused_by_not_found(),
        "bulk transfer finished with failures"
    );
}
