use std::fs;
use std::sync::Arc;

use mockito::{Mock, Server, ServerGuard};
use tempfile::TempDir;

use super::events::recorder::{Event, Recorder};
use super::*;
use crate::fetch::compress;
use crate::util::hash::hash_bytes;

fn entry_for(path: &str, content: &[u8]) -> ManifestEntry {
  ManifestEntry::new(path, hash_bytes(content), content.len() as u64)
}

fn manifest_of(entries: impl IntoIterator<Item = ManifestEntry>) -> Manifest {
  entries.into_iter().collect()
}

struct TestEnv {
  temp: TempDir,
  server: ServerGuard,
  config: SyncConfig,
}

impl TestEnv {
  fn new() -> Self {
    let server = Server::new();
    let temp = TempDir::new().unwrap();
    let config = SyncConfig {
      origin: server.url(),
      manifest_url: None,
      base_dir: temp.path().join("tree"),
      index_path: temp.path().join("local_index.txt"),
      excluded_prefix: "/Cache.Windows/".to_string(),
    };
    Self { temp, server, config }
  }

  fn syncer(&self) -> Syncer {
    Syncer::new(self.config.clone(), Fetcher::with_default_client().unwrap())
  }

  fn serve_manifest(&mut self, entries: &[ManifestEntry], hits: usize) -> Mock {
    let manifest: Manifest = entries.iter().cloned().collect();
    self
      .server
      .mock("GET", "/index.txt.lzma")
      .with_body(compress(manifest.serialize().as_bytes()).unwrap())
      .expect(hits)
      .create()
  }

  fn serve_content(&mut self, entry: &ManifestEntry, content: &[u8], hits: usize) -> Mock {
    self
      .server
      .mock("GET", entry.url("").as_str())
      .with_body(compress(content).unwrap())
      .expect(hits)
      .create()
  }

  fn tree_path(&self, path: &str) -> std::path::PathBuf {
    self.config.base_dir.join(path.trim_start_matches('/'))
  }

  fn write_tree(&self, path: &str, content: &[u8]) {
    let full = self.tree_path(path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, content).unwrap();
  }

  fn write_index(&self, entries: &[ManifestEntry]) {
    let manifest: Manifest = entries.iter().cloned().collect();
    manifest.save(&self.config.index_path).unwrap();
  }

  fn index(&self) -> Manifest {
    Manifest::load(&self.config.index_path).unwrap().unwrap()
  }
}

#[test]
fn fresh_tree_downloads_everything_smallest_first() {
  let mut env = TestEnv::new();
  let a = entry_for("/a.bin", b"0123456789");
  let b = entry_for("/dir/b.bin", &[b'b'; 20]);
  env.serve_manifest(&[b.clone(), a.clone()], 1);
  let mock_a = env.serve_content(&a, b"0123456789", 1);
  let mock_b = env.serve_content(&b, &[b'b'; 20], 1);

  let events = Recorder::default();
  let outcome = env.syncer().run(&CancelToken::new(), &events).unwrap();

  mock_a.assert();
  mock_b.assert();
  assert!(outcome.is_synchronized());
  assert_eq!(outcome.downloaded, vec![a.clone(), b.clone()]);
  assert_eq!(fs::read(env.tree_path("/a.bin")).unwrap(), b"0123456789");
  assert_eq!(fs::read(env.tree_path("/dir/b.bin")).unwrap(), vec![b'b'; 20]);
  assert_eq!(env.index(), manifest_of([a, b]));

  assert_eq!(
    events.states(),
    vec![
      SyncState::Validating,
      SyncState::Diffing,
      SyncState::Downloading,
      SyncState::Completed
    ]
  );
  let downloads: Vec<_> = events
    .statuses()
    .into_iter()
    .filter(|s| s.starts_with("Download: "))
    .collect();
  assert_eq!(downloads, vec!["Download: /a.bin", "Download: /dir/b.bin"]);
  assert_eq!(events.statuses().last().unwrap(), "Updated");

  let overall = events.overall();
  assert_eq!(overall.first(), Some(&0.0));
  assert!((overall[1] - 10.0 / 30.0).abs() < 1e-9);
  assert_eq!(overall.last(), Some(&1.0));
  assert!(events.events().contains(&Event::Done));
  assert!(events.events().contains(&Event::Ready));
}

#[test]
fn matching_local_file_is_not_downloaded() {
  let mut env = TestEnv::new();
  let a = entry_for("/a.bin", b"aaaa");
  let b = entry_for("/b.bin", b"bbbbbbbb");
  env.write_tree("/a.bin", b"aaaa");
  env.write_index(&[a.clone()]);
  env.serve_manifest(&[a.clone(), b.clone()], 1);
  let mock_a = env.serve_content(&a, b"aaaa", 0);
  let mock_b = env.serve_content(&b, b"bbbbbbbb", 1);

  let outcome = env.syncer().run(&CancelToken::new(), &NoopEvents).unwrap();

  mock_a.assert();
  mock_b.assert();
  assert_eq!(outcome.downloaded, vec![b.clone()]);
  assert_eq!(env.index(), manifest_of([a, b]));
}

#[test]
fn modified_local_file_is_downloaded_again() {
  let mut env = TestEnv::new();
  let a = entry_for("/a.bin", b"original");
  env.write_tree("/a.bin", b"tampered!");
  env.write_index(&[a.clone()]);
  env.serve_manifest(&[a.clone()], 1);
  let mock = env.serve_content(&a, b"original", 1);

  let outcome = env.syncer().run(&CancelToken::new(), &NoopEvents).unwrap();

  mock.assert();
  assert_eq!(outcome.downloaded, vec![a.clone()]);
  assert_eq!(fs::read(env.tree_path("/a.bin")).unwrap(), b"original");
}

#[test]
fn updated_remote_entry_replaces_stale_index_line() {
  let mut env = TestEnv::new();
  let old = entry_for("/a.bin", b"version one");
  let new = entry_for("/a.bin", b"version two!");
  env.write_tree("/a.bin", b"version one");
  env.write_index(&[old]);
  env.serve_manifest(&[new.clone()], 1);
  env.serve_content(&new, b"version two!", 1);

  env.syncer().run(&CancelToken::new(), &NoopEvents).unwrap();

  assert_eq!(env.index(), manifest_of([new]));
}

#[test]
fn excluded_prefix_is_never_requested() {
  let mut env = TestEnv::new();
  let cache = entry_for("/Cache.Windows/shader.cache", b"cache");
  let a = entry_for("/a.bin", b"a");
  env.serve_manifest(&[cache.clone(), a.clone()], 1);
  let cache_mock = env.serve_content(&cache, b"cache", 0);
  env.serve_content(&a, b"a", 1);

  let events = Recorder::default();
  let outcome = env.syncer().run(&CancelToken::new(), &events).unwrap();

  cache_mock.assert();
  assert!(outcome.is_synchronized());
  assert_eq!(env.index(), manifest_of([a]));
  assert_eq!(events.overall().last(), Some(&1.0));
}

#[test]
fn failed_entry_is_skipped_and_left_pending() {
  let mut env = TestEnv::new();
  let small = entry_for("/small.bin", b"s");
  let big = entry_for("/big.bin", b"big content");
  env.serve_manifest(&[small.clone(), big.clone()], 1);
  env
    .server
    .mock("GET", small.url("").as_str())
    .with_status(500)
    .create();
  env.serve_content(&big, b"big content", 1);

  let events = Recorder::default();
  let outcome = env.syncer().run(&CancelToken::new(), &events).unwrap();

  assert_eq!(outcome.state, SyncState::Completed);
  assert!(!outcome.is_synchronized());
  assert_eq!(outcome.failed, vec![small.clone()]);
  assert_eq!(outcome.downloaded, vec![big.clone()]);
  assert_eq!(outcome.remaining_bytes(), 1);
  assert_eq!(env.index(), manifest_of([big]));
  assert!(!env.tree_path("/small.bin").exists());
  assert_eq!(events.statuses().last().unwrap(), "Incomplete: 1 file(s) failed");
}

#[test]
fn unreachable_remote_manifest_is_fatal() {
  let mut env = TestEnv::new();
  env.server.mock("GET", "/index.txt.lzma").with_status(404).create();

  let events = Recorder::default();
  let mut syncer = env.syncer();
  let err = syncer.run(&CancelToken::new(), &events).unwrap_err();

  assert!(matches!(err, SyncError::RemoteManifest(_)));
  assert_eq!(syncer.state(), SyncState::Idle);
  assert_eq!(
    events.states(),
    vec![SyncState::Validating, SyncState::Failed, SyncState::Idle]
  );
  assert!(events.statuses().last().unwrap().starts_with("Error: "));
}

#[test]
fn malformed_local_index_is_fatal() {
  let mut env = TestEnv::new();
  env.serve_manifest(&[entry_for("/a.bin", b"a")], 1);
  fs::write(&env.config.index_path, "not a manifest line\r\n").unwrap();

  let err = env.syncer().run(&CancelToken::new(), &NoopEvents).unwrap_err();

  assert!(matches!(err, SyncError::LocalIndex(_)));
}

#[test]
fn cancel_before_start_downloads_nothing() {
  let mut env = TestEnv::new();
  let a = entry_for("/a.bin", b"a");
  let manifest_mock = env.serve_manifest(&[a.clone()], 0);
  let content_mock = env.serve_content(&a, b"a", 0);

  let cancel = CancelToken::new();
  cancel.cancel();
  let events = Recorder::default();
  let outcome = env.syncer().run(&cancel, &events).unwrap();

  manifest_mock.assert();
  content_mock.assert();
  assert_eq!(outcome.state, SyncState::Cancelled);
  assert!(events.events().contains(&Event::Cancelled));
  assert_eq!(events.statuses().last().unwrap(), "Ready");
  assert!(!env.config.index_path.exists());
}

/// Cancels the run as soon as the first file has been recorded.
struct CancelAfterFirstFile {
  cancel: CancelToken,
  inner: Arc<Recorder>,
}

impl SyncEvents for CancelAfterFirstFile {
  fn on_overall_progress(&self, fraction: f64) {
    self.inner.on_overall_progress(fraction);
    if fraction > 0.0 {
      self.cancel.cancel();
    }
  }

  fn on_state(&self, state: SyncState) {
    self.inner.on_state(state);
  }
}

#[test]
fn cancel_mid_download_keeps_finished_files_in_index() {
  let mut env = TestEnv::new();
  let a = entry_for("/a.bin", b"a");
  let b = entry_for("/b.bin", b"bb");
  env.serve_manifest(&[a.clone(), b.clone()], 1);
  env.serve_content(&a, b"a", 1);
  let mock_b = env.serve_content(&b, b"bb", 0);

  let cancel = CancelToken::new();
  let recorder = Arc::new(Recorder::default());
  let events = CancelAfterFirstFile {
    cancel: cancel.clone(),
    inner: recorder.clone(),
  };
  let outcome = env.syncer().run(&cancel, &events).unwrap();

  mock_b.assert();
  assert_eq!(outcome.state, SyncState::Cancelled);
  assert_eq!(outcome.downloaded, vec![a.clone()]);
  assert_eq!(outcome.remaining, manifest_of([b]));
  assert_eq!(env.index(), manifest_of([a]));
  assert_eq!(recorder.states().last(), Some(&SyncState::Cancelled));
}

#[test]
fn second_run_downloads_nothing() {
  let mut env = TestEnv::new();
  let a = entry_for("/a.bin", b"payload");
  env.serve_manifest(&[a.clone()], 1);
  let mock = env.serve_content(&a, b"payload", 1);

  let first = env.syncer().run(&CancelToken::new(), &NoopEvents).unwrap();
  let events = Recorder::default();
  let second = env.syncer().run(&CancelToken::new(), &events).unwrap();

  mock.assert();
  assert_eq!(first.downloaded.len(), 1);
  assert!(second.downloaded.is_empty());
  assert!(second.is_synchronized());
  assert!(!events.states().contains(&SyncState::Downloading));
}

#[test]
fn plan_leaves_tree_and_index_untouched() {
  let mut env = TestEnv::new();
  let a = entry_for("/a.bin", b"a");
  let b = entry_for("/b.bin", b"bb");
  let gone = entry_for("/gone.bin", b"gone");
  env.write_tree("/a.bin", b"a");
  env.write_index(&[a.clone(), gone.clone()]);
  env.serve_manifest(&[a.clone(), b.clone()], 1);
  let mock_b = env.serve_content(&b, b"bb", 0);

  let mut syncer = env.syncer();
  let plan = syncer.plan(&CancelToken::new(), &NoopEvents).unwrap().unwrap();

  mock_b.assert();
  assert_eq!(plan.needed, manifest_of([b]));
  assert_eq!(plan.scoped_total, 3);
  assert_eq!(plan.valid, 1);
  assert_eq!(plan.dropped, vec![gone.clone()]);
  assert_eq!(env.index(), manifest_of([a, gone]));
  assert_eq!(syncer.state(), SyncState::Idle);
}

#[test]
fn verify_persists_validated_index() {
  let env = TestEnv::new();
  let a = entry_for("/a.bin", b"a");
  let gone = entry_for("/gone.bin", b"gone");
  env.write_tree("/a.bin", b"a");
  env.write_index(&[a.clone(), gone]);

  let report = env.syncer().verify(&CancelToken::new(), &NoopEvents).unwrap();

  assert_eq!(report.dropped.len(), 1);
  assert_eq!(env.index(), manifest_of([a]));
}

#[test]
fn spawned_worker_reports_outcome() {
  let mut env = TestEnv::new();
  let a = entry_for("/a.bin", b"worker");
  env.serve_manifest(&[a.clone()], 1);
  env.serve_content(&a, b"worker", 1);

  let recorder = Arc::new(Recorder::default());
  let handle = spawn(env.syncer(), CancelToken::new(), recorder.clone()).unwrap();
  let outcome = handle.join().unwrap();

  assert!(outcome.is_synchronized());
  assert!(recorder.events().contains(&Event::Done));
  assert!(env.temp.path().join("tree").join("a.bin").exists());
}

#[test]
fn format_size_uses_binary_units() {
  assert_eq!(format_size(0), "0.00 B");
  assert_eq!(format_size(1536), "1.50 KB");
  assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
}

#[test]
fn overall_fraction_handles_empty_scope() {
  assert_eq!(overall_fraction(0, 0), 1.0);
  assert_eq!(overall_fraction(5, 10), 0.5);
}
