//! Status command implementation.
//!
//! Summarizes the local index without touching the network or the tree.

use anyhow::{Context, Result};

use patchsync_lib::config::SyncConfig;
use patchsync_lib::manifest::Manifest;

use crate::output::{Report, print_json};

pub fn cmd_status(config: SyncConfig, verbose: bool, json: bool) -> Result<()> {
  let index = Manifest::load(&config.index_path)
    .with_context(|| format!("Failed to read index {}", config.index_path.display()))?;

  if json {
    let items: Vec<_> = index.iter().flatten().collect();
    return print_json(&serde_json::json!({
      "index": config.index_path,
      "entries": items.len(),
      "bytes": index.as_ref().map_or(0, Manifest::size),
      "items": items,
    }));
  }

  Report::from_index(index.as_ref(), &config, verbose).print();
  Ok(())
}
