//! Background worker running a sync on its own thread.

use std::io;
use std::thread::{self, JoinHandle};

use super::{SyncError, SyncEvents, SyncOutcome, Syncer};
use crate::cancel::CancelToken;

const WORKER_NAME: &str = "patchsync-worker";

/// Handle to a sync running on a background thread.
#[derive(Debug)]
pub struct SyncHandle {
  cancel: CancelToken,
  thread: JoinHandle<Result<SyncOutcome, SyncError>>,
}

impl SyncHandle {
  /// Ask the worker to stop at its next checkpoint.
  pub fn cancel(&self) {
    self.cancel.cancel();
  }

  pub fn is_finished(&self) -> bool {
    self.thread.is_finished()
  }

  /// Wait for the worker to finish.
  pub fn join(self) -> Result<SyncOutcome, SyncError> {
    self.thread.join().map_err(|_| SyncError::WorkerPanicked)?
  }
}

/// Run `syncer` on a dedicated thread. Events are delivered from that thread.
pub fn spawn<E>(mut syncer: Syncer, cancel: CancelToken, events: E) -> io::Result<SyncHandle>
where
  E: SyncEvents + 'static,
{
  let worker_cancel = cancel.clone();
  let thread = thread::Builder::new()
    .name(WORKER_NAME.to_string())
    .spawn(move || syncer.run(&worker_cancel, &events))?;

  Ok(SyncHandle { cancel, thread })
}
