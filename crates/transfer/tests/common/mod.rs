pub mod memory;

#[allow(unused_imports)]
pub use memory::MemoryStore;

use larder_core::Digest;
use larder_transfer::{CacheNotFound, LostInputs, TransferError};
use std::path::PathBuf;

/// Install a test subscriber so `RUST_LOG=debug` shows transfer logs.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[allow(dead_code)]
pub fn not_found(name: &str) -> TransferError {
    CacheNotFound::new(Digest::of(name.as_bytes())).into()
}

#[allow(dead_code)]
pub fn other(message: &str) -> TransferError {
    TransferError::io(message)
}

/// A lost input wrapped in an I/O failure, the way a prefetch reports it.
#[allow(dead_code)]
pub fn wrapped_lost(name: &str) -> TransferError {
    TransferError::wrapping(
        format!("failed to fetch {name}"),
        LostInputs::single(Digest::of(name.as_bytes()), PathBuf::from(name)),
    )
}

#[allow(dead_code)]
pub fn direct_lost(name: &str) -> TransferError {
    LostInputs::single(Digest::of(name.as_bytes()), PathBuf::from(name)).into()
}
