//! Manifest data model.
//!
//! A [`Manifest`] is a set of [`ManifestEntry`] records describing the expected
//! content of a file tree, plus the base prefix used to resolve entries into a
//! local path or a download URL.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use serde::Serialize;

use crate::consts::LZMA_EXT;

/// One manifest record: a relative path, its content hash and decompressed size.
///
/// Identity is the canonical line `"{path}.{hash}.lzma,{size}"`. Two entries with
/// the same path but a different hash or size are distinct set members.
#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
  path: String,
  hash: String,
  size: u64,
  #[serde(skip)]
  line: String,
}

impl ManifestEntry {
  pub fn new(path: impl Into<String>, hash: impl Into<String>, size: u64) -> Self {
    let path = path.into();
    let hash = hash.into();
    let line = format!("{}.{}.{},{}", path, hash, LZMA_EXT, size);
    Self { path, hash, size, line }
  }

  /// Path relative to the manifest base, starting with a separator.
  pub fn path(&self) -> &str {
    &self.path
  }

  /// Uppercase hex content digest.
  pub fn hash(&self) -> &str {
    &self.hash
  }

  /// Declared size of the decompressed content.
  pub fn size(&self) -> u64 {
    self.size
  }

  /// Canonical serialized form, also the entry's identity.
  pub fn line(&self) -> &str {
    &self.line
  }

  /// Location of this entry under a local base directory.
  pub fn local_path(&self, base: &str) -> PathBuf {
    PathBuf::from(format!("{}{}", base, self.path))
  }

  /// Download URL of this entry's compressed content under a remote origin.
  pub fn url(&self, base: &str) -> String {
    format!("{}{}.{}.{}", base, self.path, self.hash, LZMA_EXT)
  }
}

impl PartialEq for ManifestEntry {
  fn eq(&self, other: &Self) -> bool {
    self.line == other.line
  }
}

impl Eq for ManifestEntry {}

impl Hash for ManifestEntry {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.line.hash(state);
  }
}

impl PartialOrd for ManifestEntry {
  fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for ManifestEntry {
  fn cmp(&self, other: &Self) -> std::cmp::Ordering {
    self.line.cmp(&other.line)
  }
}

impl fmt::Display for ManifestEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.line)
  }
}

/// A set of manifest entries with a resolvable base location.
///
/// Entries are kept ordered by their canonical line, which is also the
/// serialization order. The base is not part of entry identity: entries never
/// store it, so every entry always resolves against the manifest's current base.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
  base: String,
  entries: BTreeSet<ManifestEntry>,
}

impl Manifest {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_base(base: impl Into<String>) -> Self {
    Self {
      base: base.into(),
      entries: BTreeSet::new(),
    }
  }

  pub fn base(&self) -> &str {
    &self.base
  }

  pub fn set_base(&mut self, base: impl Into<String>) {
    self.base = base.into();
  }

  /// Insert an entry. Returns `false` if an identical entry was already present.
  pub fn insert(&mut self, entry: ManifestEntry) -> bool {
    self.entries.insert(entry)
  }

  /// Insert an entry after dropping every other entry recorded for the same path.
  ///
  /// An updated file replaces its stale identity instead of sitting next to it.
  pub fn replace(&mut self, entry: ManifestEntry) {
    self.entries.retain(|e| e.path != entry.path);
    self.entries.insert(entry);
  }

  pub fn remove(&mut self, entry: &ManifestEntry) -> bool {
    self.entries.remove(entry)
  }

  pub fn contains(&self, entry: &ManifestEntry) -> bool {
    self.entries.contains(entry)
  }

  /// First entry recorded for `path`, if any.
  pub fn get(&self, path: &str) -> Option<&ManifestEntry> {
    self.entries.iter().find(|e| e.path == path)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Entries in canonical line order.
  pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry> {
    self.entries.iter()
  }

  /// Sum of declared sizes.
  pub fn size(&self) -> u64 {
    self.entries.iter().map(|e| e.size).sum()
  }

  /// Copy of this manifest without entries whose path starts with `prefix`.
  pub fn exclude(&self, prefix: &str) -> Manifest {
    Manifest {
      base: self.base.clone(),
      entries: self.entries.iter().filter(|e| !e.path.starts_with(prefix)).cloned().collect(),
    }
  }

  /// Entries ordered by ascending size, ties broken by canonical line.
  pub fn sorted_by_size(&self) -> Vec<ManifestEntry> {
    // BTreeSet iteration is already line-ordered and the sort is stable.
    let mut entries: Vec<ManifestEntry> = self.entries.iter().cloned().collect();
    entries.sort_by_key(|e| e.size);
    entries
  }

  /// Resolve an entry against this manifest's base as a local file.
  pub fn local_path(&self, entry: &ManifestEntry) -> PathBuf {
    entry.local_path(&self.base)
  }

  /// Resolve an entry against this manifest's base as a download URL.
  pub fn url(&self, entry: &ManifestEntry) -> String {
    entry.url(&self.base)
  }
}

/// Two manifests are equal when they hold the same entries.
impl PartialEq for Manifest {
  fn eq(&self, other: &Self) -> bool {
    self.entries == other.entries
  }
}

impl Eq for Manifest {}

impl FromIterator<ManifestEntry> for Manifest {
  fn from_iter<I: IntoIterator<Item = ManifestEntry>>(iter: I) -> Self {
    Self {
      base: String::new(),
      entries: iter.into_iter().collect(),
    }
  }
}

impl Extend<ManifestEntry> for Manifest {
  fn extend<I: IntoIterator<Item = ManifestEntry>>(&mut self, iter: I) {
    self.entries.extend(iter);
  }
}

impl<'a> IntoIterator for &'a Manifest {
  type Item = &'a ManifestEntry;
  type IntoIter = std::collections::btree_set::Iter<'a, ManifestEntry>;

  fn into_iter(self) -> Self::IntoIter {
    self.entries.iter()
  }
}
