//! Core domain types shared by the Larder crates.
//!
//! This crate defines:
//! - Content hashes and blob digests
//! - The core error type
//! - Transfer and storage configuration, and the layered config loader

pub mod config;
pub mod digest;
pub mod error;
pub mod hash;

pub use config::{AppConfig, StorageConfig, TransferConfig};
pub use digest::Digest;
pub use error::{Error, Result};
pub use hash::{ContentHash, ContentHasher};
