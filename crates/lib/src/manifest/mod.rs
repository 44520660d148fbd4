//! Manifest model and text format.
//!
//! Manifests describe the expected content of a file tree as a set of
//! `(path, hash, size)` records. The same format is used for the remote
//! manifest (LZMA-compressed) and the local index file.

mod codec;
mod types;

pub use codec::{ManifestError, ParseError};
pub use types::{Manifest, ManifestEntry};
