//! Release manifest loading and shape validation.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::OsTag;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("entry for '{repo}' declares no programs")]
    EmptyPrograms { repo: String },
}

/// One release repository to pull pre-built binaries from.
///
/// `assets` maps a platform tag to the zip asset published under `tag`;
/// a missing tag means the release does not ship that platform and the
/// entry is skipped for it. `programs` maps the output filename (without
/// extension) to the basename of the file inside the archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseEntry {
    pub repo: String,
    pub tag: String,
    #[serde(default)]
    pub assets: BTreeMap<String, String>,
    pub programs: BTreeMap<String, String>,
}

impl ReleaseEntry {
    /// The published asset filename for a platform, or None if this
    /// release has nothing for it.
    pub fn asset_for(&self, ostag: OsTag) -> Option<&str> {
        self.assets.get(ostag.as_str()).map(String::as_str)
    }
}

/// The full manifest: an ordered list of release entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    pub entries: Vec<ReleaseEntry>,
}

impl Manifest {
    /// Load and shape-check a manifest from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path)?;
        let manifest: Manifest = serde_json::from_str(&content)?;

        for entry in &manifest.entries {
            if entry.programs.is_empty() {
                return Err(ManifestError::EmptyPrograms {
                    repo: entry.repo.clone(),
                });
            }
        }

        Ok(manifest)
    }

    /// All output program names across all entries, sorted.
    ///
    /// Names repeated across entries are kept as-is; callers consuming the
    /// list for exclusion purposes tolerate duplicates.
    pub fn program_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .iter()
            .flat_map(|e| e.programs.keys().cloned())
            .collect();
        names.sort();
        names
    }
}
