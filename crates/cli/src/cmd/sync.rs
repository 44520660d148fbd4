//! Implementation of the `patchsync sync` command.
//!
//! Runs a full sync on a background worker while the main thread waits for
//! either the worker or Ctrl-C. Ctrl-C fires the cancel token; the worker
//! stops at its next checkpoint and the local index keeps everything
//! downloaded so far.

use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::info;

use patchsync_lib::cancel::CancelToken;
use patchsync_lib::config::SyncConfig;
use patchsync_lib::fetch::Fetcher;
use patchsync_lib::sync::{SyncState, Syncer, spawn};

use crate::output::Report;
use crate::progress::TerminalEvents;

pub fn cmd_sync(config: SyncConfig) -> Result<()> {
  let start = Instant::now();
  let fetcher = Fetcher::with_default_client().context("Failed to create HTTP client")?;
  let syncer = Syncer::new(config, fetcher);

  let cancel = CancelToken::new();
  let events = TerminalEvents::new();
  let handle = spawn(syncer, cancel.clone(), events.clone()).context("Failed to start sync worker")?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let joined = rt.block_on(async move {
    let mut worker = tokio::task::spawn_blocking(move || handle.join());
    tokio::select! {
      res = &mut worker => res,
      Ok(()) = tokio::signal::ctrl_c() => {
        info!("interrupt received, cancelling sync");
        cancel.cancel();
        worker.await
      }
    }
  });
  events.finish();

  let outcome = joined.context("Sync worker did not finish")?.context("Sync failed")?;

  Report::from_outcome(&outcome, start.elapsed()).print();

  if outcome.state == SyncState::Completed && !outcome.failed.is_empty() {
    bail!("{} file(s) could not be downloaded", outcome.failed.len());
  }

  Ok(())
}
