//! Manifest text format.
//!
//! Each entry is one line of the form `<path>.<HASH>.lzma,<size>`. The hash and
//! size are the last two fields; everything before them, dots included,
//! belongs to the path. A serialized manifest is the sorted list of lines,
//! each terminated by CRLF:
//!
//! ```text
//! /Tools/Launcher.exe.0B7E4C1A9D3F22E6A1C8F0B5D4E3A2F1.lzma,482304\r\n
//! /Tools/Lotus.dat.5F1D2C3B4A59687706152433ABCDEF01.lzma,1024\r\n
//! ```
//!
//! Loading is all-or-nothing: a single malformed line fails the whole load.

use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::string::FromUtf8Error;

use thiserror::Error;
use tracing::{debug, info};

use super::types::{Manifest, ManifestEntry};
use crate::cancel::CancelToken;
use crate::consts::{LINE_SEPARATOR, LZMA_EXT};
use crate::fetch::{DecompressError, FetchError, Fetcher, decompress};

/// A manifest line that does not match `<path>.<HASH>.lzma,<size>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed manifest line: {line:?}")]
pub struct ParseError {
  pub line: String,
}

/// Errors that can occur when loading or saving a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
  #[error(transparent)]
  Parse(#[from] ParseError),

  #[error("failed to read manifest {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: io::Error,
  },

  #[error("failed to write manifest {path}: {source}")]
  Write {
    path: String,
    #[source]
    source: io::Error,
  },

  #[error("manifest is not valid UTF-8: {0}")]
  Utf8(#[from] FromUtf8Error),

  #[error("failed to decompress manifest: {0}")]
  Decompress(#[from] DecompressError),

  #[error("failed to fetch manifest: {0}")]
  Fetch(#[from] FetchError),
}

impl ManifestError {
  /// True when the load stopped because the cancel token fired.
  pub fn is_cancelled(&self) -> bool {
    matches!(self, ManifestError::Fetch(FetchError::Cancelled))
  }
}

impl ManifestEntry {
  /// Parse one manifest line.
  ///
  /// The hash is accepted as any run of uppercase ASCII letters and digits; its
  /// length is not checked.
  pub fn parse(line: &str) -> Result<Self, ParseError> {
    let invalid = || ParseError { line: line.to_string() };

    let (head, size) = line.rsplit_once(',').ok_or_else(invalid)?;
    if size.is_empty() || !size.bytes().all(|b| b.is_ascii_digit()) {
      return Err(invalid());
    }
    let size: u64 = size.parse().map_err(|_| invalid())?;

    let head = head
      .strip_suffix(LZMA_EXT)
      .and_then(|h| h.strip_suffix('.'))
      .ok_or_else(invalid)?;
    let (path, hash) = head.rsplit_once('.').ok_or_else(invalid)?;
    if !hash.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()) {
      return Err(invalid());
    }

    Ok(ManifestEntry::new(path, hash, size))
  }
}

impl FromStr for ManifestEntry {
  type Err = ParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    ManifestEntry::parse(s)
  }
}

impl Manifest {
  /// Parse manifest text. Empty lines are skipped; LF and CRLF are both accepted.
  pub fn parse(text: &str) -> Result<Self, ParseError> {
    text
      .lines()
      .filter(|line| !line.is_empty())
      .map(ManifestEntry::parse)
      .collect()
  }

  /// Render every entry's line in lexicographic order, each followed by CRLF.
  pub fn serialize(&self) -> String {
    self.iter().fold(String::new(), |mut text, entry| {
      text.push_str(entry.line());
      text.push_str(LINE_SEPARATOR);
      text
    })
  }

  /// Load a local index file.
  ///
  /// Returns `Ok(None)` if the file doesn't exist.
  pub fn load(path: &Path) -> Result<Option<Self>, ManifestError> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(source) => {
        return Err(ManifestError::Read {
          path: path.display().to_string(),
          source,
        });
      }
    };

    let manifest = Manifest::parse(&content)?;
    info!(path = %path.display(), entries = manifest.len(), "loaded local index");
    Ok(Some(manifest))
  }

  /// Load a local index file, or an empty manifest if it doesn't exist.
  pub fn load_or_default(path: &Path) -> Result<Self, ManifestError> {
    Ok(Self::load(path)?.unwrap_or_default())
  }

  /// Write this manifest to `path`.
  ///
  /// Uses atomic write (write to temp, then rename) so the index on disk is
  /// always a complete checkpoint.
  pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
    let write_err = |source| ManifestError::Write {
      path: path.display().to_string(),
      source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent).map_err(write_err)?;
    }

    let mut temp_path = path.as_os_str().to_owned();
    temp_path.push(".tmp");

    fs::write(&temp_path, self.serialize()).map_err(write_err)?;
    fs::rename(&temp_path, path).map_err(write_err)?;

    debug!(path = %path.display(), entries = self.len(), "saved local index");
    Ok(())
  }

  /// Decompress and parse an LZMA-compressed manifest blob.
  pub fn from_lzma_bytes(data: &[u8]) -> Result<Self, ManifestError> {
    let text = String::from_utf8(decompress(data)?)?;
    Ok(Manifest::parse(&text)?)
  }

  /// Load an LZMA-compressed manifest stored on disk.
  pub fn from_lzma_file(path: &Path) -> Result<Self, ManifestError> {
    let data = fs::read(path).map_err(|source| ManifestError::Read {
      path: path.display().to_string(),
      source,
    })?;
    Self::from_lzma_bytes(&data)
  }

  /// Fetch, decompress and parse a remote manifest.
  pub fn from_url(fetcher: &Fetcher, url: &str, cancel: &CancelToken) -> Result<Self, ManifestError> {
    let data = fetcher.fetch(url, cancel, |_, _| {})?;
    let manifest = Self::from_lzma_bytes(&data)?;
    info!(url = %url, entries = manifest.len(), size = manifest.size(), "loaded remote manifest");
    Ok(manifest)
  }
}
