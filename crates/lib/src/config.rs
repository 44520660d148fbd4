//! Sync configuration.
//!
//! The configuration is consumed, never written back. It can be loaded from a
//! TOML file; every field is optional and falls back to its default:
//!
//! ```toml
//! origin = "http://origin.warframe.com"
//! manifest_url = "http://origin.warframe.com/index.txt.lzma"
//! base_dir = "./Downloaded/Public"
//! index_path = "local_index.txt"
//! excluded_prefix = "/Cache.Windows/"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::consts::{
  CONFIG_FILENAME, DEFAULT_BASE_DIR, DEFAULT_EXCLUDED_PREFIX, DEFAULT_ORIGIN, INDEX_FILENAME, MANIFEST_FILENAME,
};
use crate::manifest::Manifest;
use crate::platform::paths::config_dir;

/// Errors that can occur when loading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config file {path}: {source}")]
  Parse {
    path: String,
    #[source]
    source: toml::de::Error,
  },
}

/// Where to sync from, where to sync to, and what to leave alone.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
  /// Origin that content URLs are resolved against.
  pub origin: String,
  /// URL of the compressed remote manifest. Defaults to `<origin>/index.txt.lzma`.
  pub manifest_url: Option<String>,
  /// Local directory that entry paths are resolved against.
  pub base_dir: PathBuf,
  /// Local index file, the durable record of sync progress.
  pub index_path: PathBuf,
  /// Entries under this prefix are never diffed or downloaded. Empty disables exclusion.
  pub excluded_prefix: String,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      origin: DEFAULT_ORIGIN.to_string(),
      manifest_url: None,
      base_dir: PathBuf::from(DEFAULT_BASE_DIR),
      index_path: PathBuf::from(INDEX_FILENAME),
      excluded_prefix: DEFAULT_EXCLUDED_PREFIX.to_string(),
    }
  }
}

impl SyncConfig {
  /// Load a config file.
  ///
  /// Returns `Ok(None)` if the file doesn't exist.
  pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(source) => {
        return Err(ConfigError::Read {
          path: path.display().to_string(),
          source,
        });
      }
    };

    let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.display().to_string(),
      source,
    })?;
    Ok(Some(config))
  }

  /// Default config file location: `<config_dir>/config.toml`.
  ///
  /// `None` when no home or config directory can be determined.
  pub fn default_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILENAME))
  }

  /// Effective remote manifest URL.
  pub fn manifest_url(&self) -> String {
    match &self.manifest_url {
      Some(url) => url.clone(),
      None => format!("{}/{}", self.origin.trim_end_matches('/'), MANIFEST_FILENAME),
    }
  }

  /// Origin prefix for content URLs, without a trailing slash.
  pub fn remote_base(&self) -> String {
    self.origin.trim_end_matches('/').to_string()
  }

  /// Local base prefix for entry paths, without a trailing separator.
  pub fn local_base(&self) -> String {
    let base = self.base_dir.to_string_lossy();
    base.trim_end_matches(['/', '\\']).to_string()
  }

  /// Restrict a manifest to the entries outside the excluded prefix.
  pub fn scope(&self, manifest: &Manifest) -> Manifest {
    if self.excluded_prefix.is_empty() {
      manifest.clone()
    } else {
      manifest.exclude(&self.excluded_prefix)
    }
  }
}
