//! Cooperative cancellation.
//!
//! A [`CancelToken`] is threaded through every long-running call. Workers poll
//! it at chunk and iteration boundaries; nothing is interrupted mid-chunk.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
  flag: Arc<AtomicBool>,
}

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  /// Request cancellation. Safe to call from any thread, any number of times.
  pub fn cancel(&self) {
    self.flag.store(true, Ordering::SeqCst);
  }

  pub fn is_cancelled(&self) -> bool {
    self.flag.load(Ordering::SeqCst)
  }

  /// Clear the flag so the token can drive another run.
  pub fn reset(&self) {
    self.flag.store(false, Ordering::SeqCst);
  }
}
