//! Persisted version of the installed yt-dlp

use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// `{"yt-dlp_version": "<tag>"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    #[serde(rename = "yt-dlp_version")]
    pub tag: String,
}

impl VersionRecord {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

/// Reads and atomically rewrites the version file
#[derive(Debug, Clone)]
pub struct VersionStore {
    path: PathBuf,
}

impl VersionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The recorded version. A missing or unreadable record means "unknown".
    pub fn load(&self) -> Option<VersionRecord> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) => {
                debug!("No version record at {:?}: {}", self.path, e);
                return None;
            }
        };
        match serde_json::from_slice(&data) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Ignoring malformed version record {:?}: {}", self.path, e);
                None
            }
        }
    }

    /// Replace the record. Readers see either the old or the new file.
    pub fn save(&self, record: &VersionRecord) -> Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let json = serde_json::to_vec_pretty(record)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        debug!("Recorded version {} in {:?}", record.tag, self.path);
        Ok(())
    }
}
