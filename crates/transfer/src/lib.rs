//! Bulk blob transfers against a Larder object store.
//!
//! A bulk transfer moves many independent blobs at once. Every item may fail
//! on its own; the failures are collected into a [`BulkTransferError`] which
//! callers inspect to decide between a cache-miss fallback
//! ([`BulkTransferError::only_caused_by_not_found`]), regenerating lost build
//! inputs ([`BulkTransferError::into_lost_inputs`]), or reporting a hard
//! failure.

pub mod bulk;
pub mod bulk_error;
pub mod error;
pub mod lost_inputs;

pub use bulk::BulkTransfer;
pub use bulk_error::{BulkTransferError, collect_results};
pub use error::{CacheNotFound, Cause, FailureKind, TransferError, TransferResult};
pub use lost_inputs::LostInputs;
