// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Host preferences and state-file location.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use wcs_core::WorkOffsetsMode;
use wcs_store_fs::FsOffsetBackend;

/// Preferences read from the machine config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostPrefs {
    /// Whether the work offsets feature is wired in.
    pub work_offsets: WorkOffsetsMode,
    /// Directory for the offsets state file (defaults to the config file's directory).
    pub state_dir: Option<PathBuf>,
}

impl HostPrefs {
    /// Loads preferences from `path`; a missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            debug!(path = %path.display(), "config file absent; using defaults");
            return Ok(Self::default());
        }
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let prefs = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing {}", path.display()))?;
        info!(path = %path.display(), "loaded host preferences");
        Ok(prefs)
    }

    /// Picks the state directory: explicit override, then `state_dir`, then
    /// beside the config file, then the platform config directory.
    pub fn backend(
        &self,
        state_dir_override: Option<&Path>,
        config_file: Option<&Path>,
    ) -> Result<FsOffsetBackend> {
        if let Some(dir) = state_dir_override.or(self.state_dir.as_deref()) {
            return Ok(FsOffsetBackend::new(dir));
        }
        let backend = match config_file {
            Some(cfg) => FsOffsetBackend::beside_config(cfg)?,
            None => FsOffsetBackend::user_default()?,
        };
        Ok(backend)
    }
}
