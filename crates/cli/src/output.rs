//! Terminal reports for sync, plan, verify and status.
//!
//! Commands build a [`Report`] from a library result and print it. Success and
//! info lines go to stdout; warnings and errors go to stderr.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use owo_colors::{OwoColorize, Stream};

use patchsync_lib::config::SyncConfig;
use patchsync_lib::manifest::{Manifest, ManifestEntry};
use patchsync_lib::sync::{SyncOutcome, SyncPlan, SyncState, format_size};
use patchsync_lib::validate::ValidationReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
  Success,
  Info,
  Warning,
  Error,
  /// Indented `label: value` line.
  Stat,
  /// Indented entry that would be or was added.
  Added,
  /// Indented entry that was dropped or failed.
  Removed,
  Blank,
}

impl Tone {
  fn symbol(self) -> &'static str {
    match self {
      Tone::Success => "✓",
      Tone::Info => "•",
      Tone::Warning => "⚠",
      Tone::Error => "✗",
      Tone::Added => "+",
      Tone::Removed => "-",
      Tone::Stat | Tone::Blank => "",
    }
  }

  fn to_stderr(self) -> bool {
    matches!(self, Tone::Warning | Tone::Error)
  }
}

/// Ordered lines of command output.
#[derive(Debug, Default)]
pub struct Report {
  lines: Vec<(Tone, String)>,
}

impl Report {
  pub fn push(&mut self, tone: Tone, text: impl Into<String>) -> &mut Self {
    self.lines.push((tone, text.into()));
    self
  }

  fn stat(&mut self, label: &str, value: impl std::fmt::Display) -> &mut Self {
    self.push(Tone::Stat, format!("{}: {}", label, value))
  }

  fn entries<'a>(&mut self, tone: Tone, entries: impl IntoIterator<Item = &'a ManifestEntry>) {
    let mut first = true;
    for entry in entries {
      if first {
        self.push(Tone::Blank, "");
        first = false;
      }
      self.push(tone, format!("{} ({})", entry.path(), format_size(entry.size())));
    }
  }

  /// Summary of a finished `sync` run.
  pub fn from_outcome(outcome: &SyncOutcome, elapsed: Duration) -> Self {
    let mut report = Report::default();
    let fetched: u64 = outcome.downloaded.iter().map(ManifestEntry::size).sum();

    if outcome.state == SyncState::Cancelled {
      report.push(Tone::Warning, "Sync cancelled");
      report.stat("Downloaded", outcome.downloaded.len());
      report.stat(
        "Remaining",
        format!("{} ({})", outcome.remaining.len(), format_size(outcome.remaining_bytes())),
      );
      return report;
    }

    if outcome.failed.is_empty() {
      report.push(Tone::Success, "Tree is up to date");
    } else {
      report.push(Tone::Warning, format!("Incomplete: {} file(s) failed", outcome.failed.len()));
    }
    report.stat("Downloaded", format!("{} ({})", outcome.downloaded.len(), format_size(fetched)));
    report.stat("Took", format!("{:.2}s", elapsed.as_secs_f64()));
    for entry in &outcome.failed {
      report.push(Tone::Error, format!("Failed: {}", entry.path()));
    }
    report
  }

  /// What `plan` found. `verbose` lists the entries.
  pub fn from_plan(plan: &SyncPlan, verbose: bool) -> Self {
    let mut report = Report::default();

    if plan.needed.is_empty() {
      report.push(Tone::Success, "Nothing to download");
    } else {
      report.push(
        Tone::Info,
        format!("{} file(s) to download ({})", plan.needed.len(), format_size(plan.needed.size())),
      );
    }
    report.stat("Valid local entries", plan.valid);
    report.stat("Dropped local entries", plan.dropped.len());
    report.stat("Remote size", format_size(plan.scoped_total));

    if verbose {
      report.entries(Tone::Added, &plan.needed.sorted_by_size());
      report.entries(Tone::Removed, &plan.dropped);
    }
    report
  }

  /// What `verify` kept and dropped.
  pub fn from_validation(validation: &ValidationReport, index_path: &Path, verbose: bool) -> Self {
    let mut report = Report::default();

    if validation.dropped.is_empty() {
      report.push(
        Tone::Success,
        format!("All {} indexed file(s) are intact", validation.valid.len()),
      );
    } else {
      report.push(Tone::Warning, format!("{} indexed file(s) dropped", validation.dropped.len()));
    }
    report.stat("Valid", validation.valid.len());
    report.stat("Index", index_path.display());

    if verbose {
      report.entries(Tone::Removed, &validation.dropped);
    }
    report
  }

  /// Offline view of the local index.
  pub fn from_index(index: Option<&Manifest>, config: &SyncConfig, verbose: bool) -> Self {
    let mut report = Report::default();
    let Some(index) = index else {
      report.push(Tone::Info, "No local index found. Run 'patchsync sync' to create one.");
      return report;
    };

    report.push(Tone::Success, format!("Local index: {}", config.index_path.display()));
    report.stat("Entries", index.len());
    report.stat("Size", format_size(index.size()));
    report.stat("Base", config.base_dir.display());

    if verbose && !index.is_empty() {
      report.push(Tone::Blank, "");
      for entry in index {
        report.push(
          Tone::Info,
          format!("{} {} ({})", entry.path(), entry.hash(), format_size(entry.size())),
        );
      }
    }
    report
  }

  pub fn print(&self) {
    for (tone, text) in &self.lines {
      let stream = if tone.to_stderr() { Stream::Stderr } else { Stream::Stdout };
      let symbol = tone.symbol();
      let line = match tone {
        Tone::Blank => String::new(),
        Tone::Stat => format!("  {}", text.if_supports_color(stream, |s| s.dimmed())),
        Tone::Added | Tone::Removed => format!("  {} {}", symbol, text),
        Tone::Success => format!("{} {}", symbol.if_supports_color(stream, |s| s.green()), text),
        Tone::Info => format!("{} {}", symbol.if_supports_color(stream, |s| s.blue()), text),
        Tone::Warning => format!(
          "{} {}",
          symbol.if_supports_color(stream, |s| s.yellow()),
          text.if_supports_color(stream, |s| s.yellow())
        ),
        Tone::Error => format!(
          "{} {}",
          symbol.if_supports_color(stream, |s| s.red()),
          text.if_supports_color(stream, |s| s.red())
        ),
      };

      if tone.to_stderr() {
        eprintln!("{}", line);
      } else {
        println!("{}", line);
      }
    }
  }

  #[cfg(test)]
  fn texts(&self) -> Vec<&str> {
    self.lines.iter().map(|(_, text)| text.as_str()).collect()
  }

  #[cfg(test)]
  fn tones(&self) -> Vec<Tone> {
    self.lines.iter().map(|(tone, _)| *tone).collect()
  }
}

/// Print one warning line to stderr.
pub fn print_warning(message: &str) {
  Report::default().push(Tone::Warning, message).print();
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
