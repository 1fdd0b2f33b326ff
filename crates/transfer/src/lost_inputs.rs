//! Build inputs that vanished from the remote cache.

use larder_core::Digest;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Inputs of a build step that are no longer retrievable and must be
/// regenerated by re-running the steps that produced them.
///
/// Keyed by digest; one digest reports one input path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LostInputs {
    inputs: BTreeMap<Digest, PathBuf>,
}

impl LostInputs {
    pub fn new(inputs: BTreeMap<Digest, PathBuf>) -> Self {
        Self { inputs }
    }

    /// A single lost input.
    pub fn single(digest: Digest, path: impl Into<PathBuf>) -> Self {
        Self {
            inputs: BTreeMap::from([(digest, path.into())]),
        }
    }

    /// Combine several lost-input reports into their union.
    ///
    /// When a digest is reported more than once the last path wins.
    pub fn combine(all: impl IntoIterator<Item = LostInputs>) -> Self {
        let mut inputs = BTreeMap::new();
        for lost in all {
            inputs.extend(lost.inputs);
        }
        Self { inputs }
    }

    pub fn inputs(&self) -> &BTreeMap<Digest, PathBuf> {
        &self.inputs
    }

    pub fn digests(&self) -> impl Iterator<Item = &Digest> {
        self.inputs.keys()
    }

    pub fn path(&self, digest: &Digest) -> Option<&Path> {
        self.inputs.get(digest).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

impl fmt::Display for LostInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lost {} input(s):", self.inputs.len())?;
        for (i, (digest, path)) in self.inputs.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{} ({digest})", path.display())?;
        }
        Ok(())
    }
}

impl std::error::Error for LostInputs {}
