//! LZMA ("lzma_alone") codec for manifest and content blobs.

use std::io::Cursor;

use thiserror::Error;

/// A blob that is not a valid LZMA stream.
#[derive(Debug, Error)]
#[error("invalid lzma stream: {0}")]
pub struct DecompressError(#[source] pub lzma_rs::error::Error);

/// Decompress a complete in-memory LZMA blob.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, DecompressError> {
  let mut out = Vec::with_capacity(data.len() * 2);
  lzma_rs::lzma_decompress(&mut Cursor::new(data), &mut out).map_err(DecompressError)?;
  Ok(out)
}

/// Compress bytes into an LZMA blob readable by [`decompress`].
pub fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
  let mut out = Vec::new();
  lzma_rs::lzma_compress(&mut Cursor::new(data), &mut out)?;
  Ok(out)
}
