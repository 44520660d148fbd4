//! Content fetching.
//!
//! [`Fetcher`] streams a compressed payload over HTTP in fixed-size chunks,
//! reporting progress after each chunk and polling a [`CancelToken`] at every
//! chunk boundary. The payload is buffered in full and decompressed afterwards;
//! there is no streaming decompression.

mod lzma;

use std::io::{self, Read};
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use thiserror::Error;
use tracing::{debug, info};

use crate::cancel::CancelToken;
use crate::consts::{CHUNK_SIZE, HTTP_TIMEOUT_SECS};

pub use lzma::{DecompressError, compress, decompress};

/// Upper bound on the buffer reserved up front from `Content-Length`.
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// Errors that can occur while fetching a payload.
#[derive(Debug, Error)]
pub enum FetchError {
  /// The HTTP client could not be constructed.
  #[error("failed to build http client: {0}")]
  Client(#[source] reqwest::Error),

  /// Connection, timeout or other transport failure.
  #[error("request failed for {url}: {source}")]
  Request {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  /// The server answered with a non-success status.
  #[error("request failed for {url}: HTTP {status}")]
  Status { url: String, status: StatusCode },

  /// The body stream broke off.
  #[error("failed reading response body from {url}: {source}")]
  Read {
    url: String,
    #[source]
    source: io::Error,
  },

  #[error(transparent)]
  Decompress(#[from] DecompressError),

  /// The cancel token fired at a chunk boundary.
  #[error("fetch cancelled")]
  Cancelled,
}

impl FetchError {
  /// True for transport-level failures (as opposed to cancellation or bad payloads).
  pub fn is_network(&self) -> bool {
    matches!(
      self,
      FetchError::Request { .. } | FetchError::Status { .. } | FetchError::Read { .. }
    )
  }
}

/// Streams payloads over HTTP through an injected client.
#[derive(Debug, Clone)]
pub struct Fetcher {
  client: Client,
}

impl Fetcher {
  pub fn new(client: Client) -> Self {
    Self { client }
  }

  /// Build a fetcher whose requests time out after 30 seconds.
  pub fn with_default_client() -> Result<Self, FetchError> {
    let client = Client::builder()
      .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
      .build()
      .map_err(FetchError::Client)?;
    Ok(Self::new(client))
  }

  /// Download `url` into memory.
  ///
  /// `on_progress(total, so_far)` is called after every chunk and once more on
  /// completion. `total` is the `Content-Length` header, or 0 if absent.
  pub fn fetch<F>(&self, url: &str, cancel: &CancelToken, mut on_progress: F) -> Result<Vec<u8>, FetchError>
  where
    F: FnMut(u64, u64),
  {
    if cancel.is_cancelled() {
      return Err(FetchError::Cancelled);
    }

    info!(url = %url, "start loading");

    let mut response = self.client.get(url).send().map_err(|source| FetchError::Request {
      url: url.to_string(),
      source,
    })?;

    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::Status {
        url: url.to_string(),
        status,
      });
    }

    let total = response.content_length().unwrap_or(0);
    let reserve = usize::try_from(total.min(MAX_PREALLOC)).unwrap_or(0);
    let mut data = Vec::with_capacity(reserve);
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
      let bytes_read = match response.read(&mut buffer) {
        Ok(0) => break,
        Ok(n) => n,
        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
        Err(source) => {
          return Err(FetchError::Read {
            url: url.to_string(),
            source,
          });
        }
      };

      if cancel.is_cancelled() {
        debug!(url = %url, received = data.len(), "fetch cancelled");
        return Err(FetchError::Cancelled);
      }

      data.extend_from_slice(&buffer[..bytes_read]);
      on_progress(total, data.len() as u64);
    }

    on_progress(total, data.len() as u64);
    Ok(data)
  }

  /// Download `url` and decompress the payload.
  pub fn fetch_lzma<F>(&self, url: &str, cancel: &CancelToken, on_progress: F) -> Result<Vec<u8>, FetchError>
  where
    F: FnMut(u64, u64),
  {
    let data = self.fetch(url, cancel, on_progress)?;
    Ok(decompress(&data)?)
  }
}
