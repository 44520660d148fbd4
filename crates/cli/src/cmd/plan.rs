//! Implementation of the `patchsync plan` command.
//!
//! Shows what a sync would download without writing anything.

use anyhow::{Context, Result};
use serde::Serialize;

use patchsync_lib::cancel::CancelToken;
use patchsync_lib::config::SyncConfig;
use patchsync_lib::fetch::Fetcher;
use patchsync_lib::manifest::ManifestEntry;
use patchsync_lib::sync::{NoopEvents, Syncer};

use crate::output::{Report, print_json, print_warning};
use crate::progress::TerminalEvents;

#[derive(Serialize)]
struct PlanOutput<'a> {
  manifest_url: String,
  needed: Vec<&'a ManifestEntry>,
  needed_bytes: u64,
  scoped_total_bytes: u64,
  valid: usize,
  dropped: &'a [ManifestEntry],
}

pub fn cmd_plan(config: SyncConfig, verbose: bool, json: bool) -> Result<()> {
  let manifest_url = config.manifest_url();
  let fetcher = Fetcher::with_default_client().context("Failed to create HTTP client")?;
  let mut syncer = Syncer::new(config, fetcher);
  let cancel = CancelToken::new();

  let plan = if json {
    syncer.plan(&cancel, &NoopEvents)
  } else {
    let events = TerminalEvents::new();
    let plan = syncer.plan(&cancel, &events);
    events.finish();
    plan
  };
  let plan = plan.context("Plan failed")?;

  let Some(plan) = plan else {
    print_warning("Plan cancelled");
    return Ok(());
  };

  if json {
    let output = PlanOutput {
      manifest_url,
      needed: plan.needed.iter().collect(),
      needed_bytes: plan.needed.size(),
      scoped_total_bytes: plan.scoped_total,
      valid: plan.valid,
      dropped: &plan.dropped,
    };
    return print_json(&output);
  }

  Report::from_plan(&plan, verbose).print();
  Ok(())
}
