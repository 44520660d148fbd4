//! Implementation of the `patchsync verify` command.

use anyhow::{Context, Result};

use patchsync_lib::cancel::CancelToken;
use patchsync_lib::config::SyncConfig;
use patchsync_lib::fetch::Fetcher;
use patchsync_lib::sync::Syncer;

use crate::output::Report;
use crate::progress::TerminalEvents;

/// Re-hash every indexed file and rewrite the index with the survivors.
pub fn cmd_verify(config: SyncConfig, verbose: bool) -> Result<()> {
  let index_path = config.index_path.clone();
  let fetcher = Fetcher::with_default_client().context("Failed to create HTTP client")?;
  let mut syncer = Syncer::new(config, fetcher);

  let events = TerminalEvents::new();
  let report = syncer.verify(&CancelToken::new(), &events);
  events.finish();
  let report = report.context("Verify failed")?;

  Report::from_validation(&report, &index_path, verbose).print();
  Ok(())
}
