//! Sync orchestration.
//!
//! [`Syncer`] drives one full cycle against a remote manifest:
//!
//! 1. Load the remote manifest and the local index (empty if absent).
//! 2. Validate the local index against the tree and persist the result.
//! 3. Diff the remote manifest against the validated index, ignoring the
//!    excluded prefix on both sides.
//! 4. Download the needed entries smallest first, recording each one in the
//!    local index as soon as it is written.
//!
//! The local index is the only durable state. A restarted run recomputes
//! validation and diff from scratch but never downloads a file that is already
//! recorded with a matching hash.

pub mod events;
mod types;
mod worker;

use std::fs;

use tracing::{debug, error, info, warn};

use crate::cancel::CancelToken;
use crate::config::SyncConfig;
use crate::diff::needed;
use crate::fetch::{FetchError, Fetcher};
use crate::manifest::{Manifest, ManifestEntry};
use crate::validate::{ValidationReport, validate};

pub use events::{NoopEvents, SyncEvents};
pub use types::{SyncError, SyncOutcome, SyncPlan, SyncState};
pub use worker::{SyncHandle, spawn};

use types::EntryError;

/// Everything computed before downloading starts.
struct Prepared {
  local: Manifest,
  needed: Manifest,
  scoped_total: u64,
  report: ValidationReport,
}

/// The manifest synchronization state machine.
#[derive(Debug)]
pub struct Syncer {
  config: SyncConfig,
  fetcher: Fetcher,
  state: SyncState,
}

impl Syncer {
  pub fn new(config: SyncConfig, fetcher: Fetcher) -> Self {
    Self {
      config,
      fetcher,
      state: SyncState::Idle,
    }
  }

  pub fn config(&self) -> &SyncConfig {
    &self.config
  }

  pub fn state(&self) -> SyncState {
    self.state
  }

  /// Run a full sync cycle.
  ///
  /// Cancellation is not an error: it ends the run in [`SyncState::Cancelled`].
  /// Fatal errors report a status message, return the syncer to
  /// [`SyncState::Idle`] and are returned to the caller. Per-file download
  /// failures are logged and listed in [`SyncOutcome::failed`].
  pub fn run(&mut self, cancel: &CancelToken, events: &dyn SyncEvents) -> Result<SyncOutcome, SyncError> {
    let result = self.run_inner(cancel, events);
    self.fail_on_error(result, events)
  }

  /// Validate and diff without downloading or writing the local index.
  ///
  /// Returns `Ok(None)` if cancelled.
  pub fn plan(&mut self, cancel: &CancelToken, events: &dyn SyncEvents) -> Result<Option<SyncPlan>, SyncError> {
    let result = self.prepare(cancel, events, false);
    let prepared = self.fail_on_error(result, events)?;
    self.transition(SyncState::Idle, events);

    Ok(prepared.map(|p| SyncPlan {
      needed: p.needed,
      scoped_total: p.scoped_total,
      valid: p.report.valid.len(),
      dropped: p.report.dropped,
    }))
  }

  /// Validate the local index against the tree and persist the result.
  ///
  /// Nothing is persisted if the scan is cancelled.
  pub fn verify(&mut self, cancel: &CancelToken, events: &dyn SyncEvents) -> Result<ValidationReport, SyncError> {
    let result = self.validate_local(cancel, events, true);
    let report = self.fail_on_error(result, events)?;
    self.transition(SyncState::Idle, events);
    Ok(report)
  }

  fn run_inner(&mut self, cancel: &CancelToken, events: &dyn SyncEvents) -> Result<SyncOutcome, SyncError> {
    let Some(Prepared {
      mut local,
      mut needed,
      scoped_total,
      ..
    }) = self.prepare(cancel, events, true)?
    else {
      return Ok(self.cancelled(Manifest::new(), Vec::new(), Vec::new(), events));
    };

    let mut downloaded = Vec::new();
    let mut failed = Vec::new();

    if !needed.is_empty() {
      if cancel.is_cancelled() {
        return Ok(self.cancelled(needed, downloaded, failed, events));
      }
      self.transition(SyncState::Downloading, events);
      events.on_overall_progress(overall_fraction(needed.size(), scoped_total));

      for entry in needed.sorted_by_size() {
        if cancel.is_cancelled() {
          return Ok(self.cancelled(needed, downloaded, failed, events));
        }

        events.on_status(&format!("Download: {}", entry.path()));
        events.on_progress(0.0);

        match self.download_entry(&entry, &local, &needed, cancel, events) {
          Ok(()) => {}
          Err(EntryError::Fetch(FetchError::Cancelled)) => {
            return Ok(self.cancelled(needed, downloaded, failed, events));
          }
          Err(e) => {
            error!(path = %entry.path(), error = %e, "download error");
            failed.push(entry);
            continue;
          }
        }

        local.replace(entry.clone());
        local.save(&self.config.index_path).map_err(SyncError::SaveIndex)?;
        needed.remove(&entry);
        events.on_overall_progress(overall_fraction(needed.size(), scoped_total));
        downloaded.push(entry);
      }
    }

    self.transition(SyncState::Completed, events);
    if needed.is_empty() {
      info!(downloaded = downloaded.len(), "download ended");
      events.on_status("Updated");
      events.on_ready();
    } else {
      warn!(failed = failed.len(), remaining = needed.len(), "download ended with failures");
      events.on_status(&format!("Incomplete: {} file(s) failed", failed.len()));
    }
    events.on_done();

    Ok(SyncOutcome {
      state: SyncState::Completed,
      downloaded,
      failed,
      remaining: needed,
    })
  }

  /// Load both manifests, validate and diff. `None` means cancelled.
  fn prepare(
    &mut self,
    cancel: &CancelToken,
    events: &dyn SyncEvents,
    persist: bool,
  ) -> Result<Option<Prepared>, SyncError> {
    self.transition(SyncState::Validating, events);

    let url = self.config.manifest_url();
    let mut remote = match Manifest::from_url(&self.fetcher, &url, cancel) {
      Ok(remote) => remote,
      Err(e) if e.is_cancelled() => return Ok(None),
      Err(e) => return Err(SyncError::RemoteManifest(e)),
    };
    remote.set_base(self.config.remote_base());

    let report = self.validate_local(cancel, events, persist)?;
    if report.cancelled || cancel.is_cancelled() {
      return Ok(None);
    }

    self.transition(SyncState::Diffing, events);
    let mut local = report.valid.clone();
    local.set_base(self.config.local_base());

    let scoped_remote = self.config.scope(&remote);
    let needed = needed(&scoped_remote, &self.config.scope(&local));
    let scoped_total = scoped_remote.size();

    for entry in needed.sorted_by_size() {
      debug!(path = %entry.path(), size = %format_size(entry.size()), "needed");
    }
    info!(
      files = needed.len(),
      size = %format_size(needed.size()),
      "download size"
    );

    Ok(Some(Prepared {
      local,
      needed,
      scoped_total,
      report,
    }))
  }

  fn validate_local(
    &mut self,
    cancel: &CancelToken,
    events: &dyn SyncEvents,
    persist: bool,
  ) -> Result<ValidationReport, SyncError> {
    if self.state != SyncState::Validating {
      self.transition(SyncState::Validating, events);
    }

    let mut local = Manifest::load_or_default(&self.config.index_path).map_err(SyncError::LocalIndex)?;
    local.set_base(self.config.local_base());

    let report = validate(&local, cancel, events);
    info!(
      valid = report.valid.len(),
      dropped = report.dropped.len(),
      cancelled = report.cancelled,
      "validated local index"
    );

    if persist && !report.cancelled {
      report.valid.save(&self.config.index_path).map_err(SyncError::SaveIndex)?;
    }
    Ok(report)
  }

  fn download_entry(
    &self,
    entry: &ManifestEntry,
    local: &Manifest,
    needed: &Manifest,
    cancel: &CancelToken,
    events: &dyn SyncEvents,
  ) -> Result<(), EntryError> {
    let dest = local.local_path(entry);
    let write_err = |source| EntryError::Write {
      path: dest.display().to_string(),
      source,
    };

    if let Some(parent) = dest.parent() {
      fs::create_dir_all(parent).map_err(write_err)?;
    }

    let url = needed.url(entry);
    let data = self.fetcher.fetch_lzma(&url, cancel, |total, so_far| {
      events.on_progress(file_fraction(so_far, total));
    })?;

    if data.len() as u64 != entry.size() {
      warn!(
        path = %entry.path(),
        declared = entry.size(),
        actual = data.len(),
        "decompressed size differs from manifest"
      );
    }

    fs::write(&dest, &data).map_err(write_err)?;
    info!(path = %entry.path(), size = data.len(), "downloaded");
    Ok(())
  }

  fn cancelled(
    &mut self,
    remaining: Manifest,
    downloaded: Vec<ManifestEntry>,
    failed: Vec<ManifestEntry>,
    events: &dyn SyncEvents,
  ) -> SyncOutcome {
    info!(downloaded = downloaded.len(), "sync cancelled");
    self.transition(SyncState::Cancelled, events);
    events.on_progress(0.0);
    events.on_overall_progress(0.0);
    events.on_status("Ready");
    events.on_cancelled();

    SyncOutcome {
      state: SyncState::Cancelled,
      downloaded,
      failed,
      remaining,
    }
  }

  fn fail_on_error<T>(&mut self, result: Result<T, SyncError>, events: &dyn SyncEvents) -> Result<T, SyncError> {
    if let Err(ref err) = result {
      error!(error = %err, "sync failed");
      self.transition(SyncState::Failed, events);
      events.on_status(&format!("Error: {}", err));
      self.transition(SyncState::Idle, events);
    }
    result
  }

  fn transition(&mut self, state: SyncState, events: &dyn SyncEvents) {
    debug!(from = %self.state, to = %state, "state transition");
    self.state = state;
    events.on_state(state);
  }
}

/// Batch progress: the share of the scoped remote size already present.
fn overall_fraction(remaining: u64, total: u64) -> f64 {
  if total == 0 {
    return 1.0;
  }
  (1.0 - remaining as f64 / total as f64).clamp(0.0, 1.0)
}

fn file_fraction(so_far: u64, total: u64) -> f64 {
  if total == 0 {
    return 0.0;
  }
  (so_far as f64 / total as f64).clamp(0.0, 1.0)
}

/// Human-readable binary size, e.g. `1.50 MB`.
pub fn format_size(bytes: u64) -> String {
  const UNITS: [&str; 5] = ["", "K", "M", "G", "T"];
  let mut size = bytes as f64;
  let mut unit = 0;
  while size > 1024.0 && unit < UNITS.len() - 1 {
    size /= 1024.0;
    unit += 1;
  }
  format!("{:.2} {}B", size, UNITS[unit])
}

#[cfg(test)]
mod tests;
