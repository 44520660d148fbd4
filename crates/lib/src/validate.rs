//! Local manifest validation.
//!
//! Recomputes each entry's digest from the file on disk and keeps only the
//! entries that still match. Drift (missing or modified files) is expected and
//! logged as a warning, never raised as an error.

use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::manifest::{Manifest, ManifestEntry};
use crate::sync::SyncEvents;
use crate::util::hash::{HashError, hash_file};

/// Result of a validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
  /// Entries whose file exists and matches its recorded digest.
  pub valid: Manifest,
  /// Entries dropped because the file is missing, unreadable or modified.
  pub dropped: Vec<ManifestEntry>,
  /// The scan stopped early; `valid` only covers the entries checked so far.
  pub cancelled: bool,
}

/// Validate every entry of `local` against the files under its base.
pub fn validate(local: &Manifest, cancel: &CancelToken, events: &dyn SyncEvents) -> ValidationReport {
  let mut report = ValidationReport {
    valid: Manifest::with_base(local.base()),
    ..Default::default()
  };

  for entry in local {
    if cancel.is_cancelled() {
      report.cancelled = true;
      break;
    }

    events.on_status(&format!("Check: {}", entry.path()));
    debug!(path = %entry.path(), "checking");

    match hash_file(&local.local_path(entry), cancel) {
      Ok(actual) if actual == entry.hash() => {
        report.valid.insert(entry.clone());
      }
      Ok(actual) => {
        warn!(path = %entry.path(), expected = %entry.hash(), actual = %actual, "Not valid md5");
        report.dropped.push(entry.clone());
      }
      Err(HashError::Cancelled) => {
        report.cancelled = true;
        break;
      }
      Err(e) if e.is_not_found() => {
        warn!(path = %entry.path(), "file missing");
        report.dropped.push(entry.clone());
      }
      Err(e) => {
        warn!(path = %entry.path(), error = %e, "file unreadable");
        report.dropped.push(entry.clone());
      }
    }
  }

  report
}
