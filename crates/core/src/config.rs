//! Configuration types shared across crates.
//!
//! Configuration is layered with figment: an optional TOML file, then
//! `LARDER_`-prefixed environment variables (nested keys split on `__`, e.g.
//! `LARDER_TRANSFER__MAX_CONCURRENCY=32`).

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "LARDER_";

/// Upper bound on concurrent sub-transfers within one bulk operation.
pub const MAX_CONCURRENCY_LIMIT: usize = 1024;

/// Bulk transfer configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Maximum number of blobs in flight within one bulk transfer.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Verify that downloaded blobs hash to the requested digest.
    #[serde(default = "default_verify_digests")]
    pub verify_digests: bool,
}

fn default_max_concurrency() -> usize {
    16
}

fn default_verify_digests() -> bool {
    true
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            verify_digests: default_verify_digests(),
        }
    }
}

impl TransferConfig {
    /// Validate transfer configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrency == 0 {
            return Err("transfer.max_concurrency must be at least 1".to_string());
        }
        if self.max_concurrency > MAX_CONCURRENCY_LIMIT {
            return Err(format!(
                "transfer.max_concurrency {} exceeds maximum {}",
                self.max_concurrency, MAX_CONCURRENCY_LIMIT
            ));
        }
        Ok(())
    }
}

/// Storage backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage.
    Filesystem {
        /// Root directory for storage.
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data/cas"),
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StorageConfig::Filesystem { path } if path.as_os_str().is_empty() => {
                Err("storage.path must not be empty".to_string())
            }
            StorageConfig::Filesystem { .. } => Ok(()),
        }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
}

impl AppConfig {
    /// Load configuration from defaults, an optional TOML file, and the environment.
    ///
    /// A missing file is not an error; environment variables alone may
    /// provide everything.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        if let Some(path) = path
            && path.exists()
        {
            figment = figment.merge(Toml::file(path));
        }

        let config: AppConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| crate::Error::Config(e.to_string()))?;

        config.validate().map_err(crate::Error::Config)?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), String> {
        self.storage.validate()?;
        self.transfer.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_config_defaults() {
        let config = TransferConfig::default();
        assert_eq!(config.max_concurrency, 16);
        assert!(
            config.verify_digests,
            "verify_digests should default to true"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_transfer_config_deserialize_without_fields() {
        let config: TransferConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_concurrency, 16);
        assert!(config.verify_digests);
    }

    #[test]
    fn test_transfer_config_rejects_zero_concurrency() {
        let config = TransferConfig {
            max_concurrency: 0,
            ..TransferConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("at least 1"), "unexpected message: {err}");
    }

    #[test]
    fn test_transfer_config_rejects_excessive_concurrency() {
        let config = TransferConfig {
            max_concurrency: MAX_CONCURRENCY_LIMIT + 1,
            ..TransferConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_storage_config_tagged_roundtrip() {
        let json = r#"{"type": "filesystem", "path": "/var/cache/larder"}"#;
        let config: StorageConfig = serde_json::from_str(json).unwrap();
        match config {
            StorageConfig::Filesystem { path } => {
                assert_eq!(path, PathBuf::from("/var/cache/larder"))
            }
        }
    }

    #[test]
    fn test_storage_config_rejects_empty_path() {
        let config = StorageConfig::Filesystem {
            path: PathBuf::new(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_defaults_without_file() {
        figment::Jail::expect_with(|_jail| {
            let config = AppConfig::load(None).unwrap();
            assert_eq!(config.transfer.max_concurrency, 16);
            Ok(())
        });
    }

    #[test]
    fn test_load_merges_file_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "larder.toml",
                r#"
                [storage]
                type = "filesystem"
                path = "/srv/cas"

                [transfer]
                max_concurrency = 4
                verify_digests = false
                "#,
            )?;
            jail.set_env("LARDER_TRANSFER__MAX_CONCURRENCY", "32");

            let config = AppConfig::load(Some(Path::new("larder.toml"))).unwrap();
            assert_eq!(config.transfer.max_concurrency, 32);
            assert!(!config.transfer.verify_digests);
            match config.storage {
                StorageConfig::Filesystem { path } => assert_eq!(path, PathBuf::from("/srv/cas")),
            }
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("LARDER_TRANSFER__MAX_CONCURRENCY", "0");
            match AppConfig::load(None) {
                Err(crate::Error::Config(msg)) => assert!(msg.contains("max_concurrency")),
                other => panic!("expected config error, got {other:?}"),
            }
            Ok(())
        });
    }
}
