//! Content digests.
//!
//! Manifest hashes are uppercase hexadecimal MD5 digests. File hashing reads
//! in fixed-size chunks and polls a [`CancelToken`] at every chunk boundary.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use md5::{Digest, Md5};
use thiserror::Error;

use crate::cancel::CancelToken;
use crate::consts::CHUNK_SIZE;

/// Error while hashing a file.
#[derive(Debug, Error)]
pub enum HashError {
  #[error("failed to read file {path}: {source}")]
  ReadFile {
    path: String,
    #[source]
    source: io::Error,
  },

  #[error("hashing cancelled")]
  Cancelled,
}

impl HashError {
  /// True when the file does not exist.
  pub fn is_not_found(&self) -> bool {
    matches!(self, HashError::ReadFile { source, .. } if source.kind() == io::ErrorKind::NotFound)
  }
}

/// Hash a file's contents.
///
/// Returns the uppercase hex MD5 digest of the file.
pub fn hash_file(path: &Path, cancel: &CancelToken) -> Result<String, HashError> {
  let read_err = |source| HashError::ReadFile {
    path: path.display().to_string(),
    source,
  };

  let mut file = File::open(path).map_err(read_err)?;
  let mut hasher = Md5::new();
  let mut buffer = [0u8; CHUNK_SIZE];

  loop {
    let bytes_read = match file.read(&mut buffer) {
      Ok(0) => break,
      Ok(n) => n,
      Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
      Err(e) => return Err(read_err(e)),
    };
    if cancel.is_cancelled() {
      return Err(HashError::Cancelled);
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(hex::encode_upper(hasher.finalize()))
}

/// Hash arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> String {
  hex::encode_upper(Md5::digest(data))
}
