//! Types for the sync state machine.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::fetch::FetchError;
use crate::manifest::{Manifest, ManifestEntry, ManifestError};

/// Orchestrator states.
///
/// A run moves `Idle → Validating → Diffing → Downloading → Completed`.
/// `Cancelled` is reachable from the three working states; `Failed` only from
/// unrecoverable conditions, after which the orchestrator returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SyncState {
  #[default]
  Idle,
  Validating,
  Diffing,
  Downloading,
  Completed,
  Cancelled,
  Failed,
}

impl SyncState {
  pub fn as_str(&self) -> &'static str {
    match self {
      SyncState::Idle => "idle",
      SyncState::Validating => "validating",
      SyncState::Diffing => "diffing",
      SyncState::Downloading => "downloading",
      SyncState::Completed => "completed",
      SyncState::Cancelled => "cancelled",
      SyncState::Failed => "failed",
    }
  }
}

impl fmt::Display for SyncState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Result of a sync run that was not aborted by a fatal error.
#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
  /// Terminal state: `Completed` or `Cancelled`.
  pub state: SyncState,
  /// Entries downloaded and recorded in the local index during this run.
  pub downloaded: Vec<ManifestEntry>,
  /// Entries whose download failed; they stay pending until a later run.
  pub failed: Vec<ManifestEntry>,
  /// Entries still needed when the run ended.
  pub remaining: Manifest,
}

impl SyncOutcome {
  /// True when the run completed with nothing left to download.
  pub fn is_synchronized(&self) -> bool {
    self.state == SyncState::Completed && self.remaining.is_empty()
  }

  pub fn remaining_bytes(&self) -> u64 {
    self.remaining.size()
  }
}

/// What a run would download, computed without touching the tree.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
  /// Remote entries missing or changed locally, outside the excluded prefix.
  pub needed: Manifest,
  /// Size of the remote manifest outside the excluded prefix.
  pub scoped_total: u64,
  /// Local entries that passed validation.
  pub valid: usize,
  /// Local entries dropped by validation.
  pub dropped: Vec<ManifestEntry>,
}

/// Fatal sync errors.
#[derive(Debug, Error)]
pub enum SyncError {
  #[error("failed to load local index: {0}")]
  LocalIndex(#[source] ManifestError),

  #[error("failed to save local index: {0}")]
  SaveIndex(#[source] ManifestError),

  #[error("failed to load remote manifest: {0}")]
  RemoteManifest(#[source] ManifestError),

  #[error("sync worker panicked")]
  WorkerPanicked,
}

/// Per-entry download failure. Logged and skipped, never fatal.
#[derive(Debug, Error)]
pub(crate) enum EntryError {
  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error("failed to write {path}: {source}")]
  Write {
    path: String,
    #[source]
    source: io::Error,
  },
}
