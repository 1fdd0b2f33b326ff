//! Per-item transfer failures.

use crate::lost_inputs::LostInputs;
use larder_core::Digest;
use larder_storage::StorageError;
use thiserror::Error;

/// Classification of a single item's failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The blob is absent from the remote cache.
    NotFound,
    /// The item is a build input that no longer exists and must be regenerated.
    LostInput,
    /// Any other failure.
    Other,
}

/// A blob missing from the remote cache.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("Missing digest: {digest}")]
pub struct CacheNotFound {
    pub digest: Digest,
}

impl CacheNotFound {
    pub fn new(digest: Digest) -> Self {
        Self { digest }
    }
}

/// Underlying cause of a [`TransferError::Io`].
#[derive(Debug, Error)]
pub enum Cause {
    #[error(transparent)]
    LostInputs(#[from] LostInputs),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure of one item within a bulk transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error(transparent)]
    NotFound(#[from] CacheNotFound),

    #[error(transparent)]
    LostInputs(#[from] LostInputs),

    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: Option<Cause>,
    },
}

impl TransferError {
    /// A generic failure with no underlying cause.
    pub fn io(message: impl Into<String>) -> Self {
        TransferError::Io {
            message: message.into(),
            source: None,
        }
    }

    /// A generic failure wrapping `cause`.
    pub fn wrapping(message: impl Into<String>, cause: impl Into<Cause>) -> Self {
        TransferError::Io {
            message: message.into(),
            source: Some(cause.into()),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            TransferError::NotFound(_) => FailureKind::NotFound,
            TransferError::LostInputs(_) => FailureKind::LostInput,
            TransferError::Io {
                source: Some(Cause::LostInputs(_)),
                ..
            } => FailureKind::LostInput,
            TransferError::Io { .. } => FailureKind::Other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == FailureKind::NotFound
    }

    /// The lost inputs this error wraps as its direct cause, if any.
    ///
    /// A bare [`TransferError::LostInputs`] is not a wrapper and yields `None`.
    pub fn wrapped_lost_inputs(&self) -> Option<&LostInputs> {
        match self {
            TransferError::Io {
                source: Some(Cause::LostInputs(lost)),
                ..
            } => Some(lost),
            _ => None,
        }
    }

    pub(crate) fn into_wrapped_lost_inputs(self) -> Option<LostInputs> {
        match self {
            TransferError::Io {
                source: Some(Cause::LostInputs(lost)),
                ..
            } => Some(lost),
            _ => None,
        }
    }
}

/// Result type for single-item transfers.
pub type TransferResult<T> = std::result::Result<T, TransferError>;
