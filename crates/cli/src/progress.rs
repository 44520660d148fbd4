//! Terminal progress reporting for sync runs.

use std::sync::Arc;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::debug;

use patchsync_lib::sync::{SyncEvents, SyncState};

const BAR_LEN: u64 = 1000;

/// Renders sync events as two progress bars: the current file and the batch.
#[derive(Clone)]
pub struct TerminalEvents {
  inner: Arc<Bars>,
}

struct Bars {
  _multi: MultiProgress,
  file: ProgressBar,
  overall: ProgressBar,
}

impl TerminalEvents {
  pub fn new() -> Self {
    Self::with_target(ProgressDrawTarget::stderr())
  }

  /// Draw nothing.
  #[cfg(test)]
  pub fn hidden() -> Self {
    Self::with_target(ProgressDrawTarget::hidden())
  }

  fn with_target(target: ProgressDrawTarget) -> Self {
    let multi = MultiProgress::with_draw_target(target);
    let style = ProgressStyle::with_template("{prefix:>8} [{bar:40.cyan/blue}] {percent:>3}% {msg}")
      .unwrap_or_else(|_| ProgressStyle::default_bar())
      .progress_chars("=> ");

    let file = multi.add(ProgressBar::new(BAR_LEN).with_style(style.clone()).with_prefix("file"));
    let overall = multi.add(ProgressBar::new(BAR_LEN).with_style(style).with_prefix("total"));

    Self {
      inner: Arc::new(Bars {
        _multi: multi,
        file,
        overall,
      }),
    }
  }

  /// Remove the bars from the terminal.
  pub fn finish(&self) {
    self.inner.file.finish_and_clear();
    self.inner.overall.finish_and_clear();
  }
}

impl Default for TerminalEvents {
  fn default() -> Self {
    Self::new()
  }
}

fn position(fraction: f64) -> u64 {
  (fraction.clamp(0.0, 1.0) * BAR_LEN as f64).round() as u64
}

impl SyncEvents for TerminalEvents {
  fn on_status(&self, text: &str) {
    self.inner.file.set_message(text.to_string());
  }

  fn on_progress(&self, fraction: f64) {
    self.inner.file.set_position(position(fraction));
  }

  fn on_overall_progress(&self, fraction: f64) {
    self.inner.overall.set_position(position(fraction));
  }

  fn on_state(&self, state: SyncState) {
    debug!(%state, "sync state");
    self.inner.overall.set_message(state.to_string());
  }

  fn on_cancelled(&self) {
    self.inner.overall.set_message("cancelled");
  }
}
