mod plan;
mod status;
mod sync;
mod verify;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;

use patchsync_lib::config::SyncConfig;

pub use plan::cmd_plan;
pub use status::cmd_status;
pub use sync::cmd_sync;
pub use verify::cmd_verify;

/// Options shared by every command. Flags override the config file.
#[derive(Debug, Default, Args)]
pub struct ConfigArgs {
  /// Config file (default: <config dir>/patchsync/config.toml)
  #[arg(long, global = true, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Origin that content URLs are resolved against
  #[arg(long, global = true, value_name = "URL")]
  pub origin: Option<String>,

  /// URL of the compressed remote manifest
  #[arg(long, global = true, value_name = "URL")]
  pub manifest_url: Option<String>,

  /// Local directory the tree is synced into
  #[arg(long, global = true, value_name = "DIR")]
  pub base_dir: Option<PathBuf>,

  /// Local index file
  #[arg(long, global = true, value_name = "FILE")]
  pub index: Option<PathBuf>,

  /// Path prefix that is never synced (empty string disables exclusion)
  #[arg(long, global = true, value_name = "PREFIX")]
  pub exclude: Option<String>,
}

impl ConfigArgs {
  /// Load the config file and apply command line overrides.
  ///
  /// An explicit `--config` must exist; the default location may be absent.
  pub fn resolve(&self) -> Result<SyncConfig> {
    let mut config = match &self.config {
      Some(path) => match SyncConfig::load(path)? {
        Some(config) => config,
        None => bail!("config file not found: {}", path.display()),
      },
      None => match SyncConfig::default_path() {
        Some(path) => SyncConfig::load(&path)
          .with_context(|| format!("Failed to load {}", path.display()))?
          .unwrap_or_default(),
        None => SyncConfig::default(),
      },
    };

    if let Some(origin) = &self.origin {
      config.origin = origin.clone();
    }
    if let Some(url) = &self.manifest_url {
      config.manifest_url = Some(url.clone());
    }
    if let Some(dir) = &self.base_dir {
      config.base_dir = dir.clone();
    }
    if let Some(index) = &self.index {
      config.index_path = index.clone();
    }
    if let Some(prefix) = &self.exclude {
      config.excluded_prefix = prefix.clone();
    }

    tracing::debug!(?config, "resolved config");
    Ok(config)
  }
}
