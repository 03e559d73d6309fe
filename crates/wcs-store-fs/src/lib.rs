// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filesystem-backed `OffsetBackend`: one JSON file per key in a machine
//! configuration directory.
//!
//! Writes go to a temporary file in the same directory, are flushed to disk,
//! then renamed over the target, so a power loss leaves either the old or the
//! new document and never a torn one.

use directories::ProjectDirs;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;
use wcs_core::{OffsetBackend, StoreError};

/// Store offset documents as `<key>.json` under a base directory.
#[derive(Debug, Clone)]
pub struct FsOffsetBackend {
    base: PathBuf,
}

impl FsOffsetBackend {
    /// Create a backend rooted at `base` (created on first write).
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Create a backend in the directory holding the machine config file.
    pub fn beside_config(config_file: &Path) -> Result<Self, StoreError> {
        let absolute = if config_file.is_absolute() {
            config_file.to_path_buf()
        } else {
            std::env::current_dir()?.join(config_file)
        };
        let base = absolute.parent().ok_or_else(|| {
            StoreError::Other(format!(
                "config file {} has no parent directory",
                config_file.display()
            ))
        })?;
        Ok(Self::new(base))
    }

    /// Create a backend rooted at the user config directory (e.g., `~/.config/wcs`).
    pub fn user_default() -> Result<Self, StoreError> {
        let proj = ProjectDirs::from("dev", "flyingrobots", "wcs")
            .ok_or_else(|| StoreError::Other("could not resolve config dir".into()))?;
        Ok(Self::new(proj.config_dir()))
    }

    /// Base directory of this backend.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Full path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.base.join(format!("{key}.json"))
    }
}

impl OffsetBackend for FsOffsetBackend {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound),
            Err(err) => Err(StoreError::Io(err)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key);
        fs::create_dir_all(&self.base)?;

        let mut tmp = NamedTempFile::new_in(&self.base)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|err| StoreError::Io(err.error))?;
        sync_dir(&self.base)?;

        debug!(path = %path.display(), bytes = data.len(), "offsets written");
        Ok(())
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<(), StoreError> {
    fs::File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<(), StoreError> {
    Ok(())
}
