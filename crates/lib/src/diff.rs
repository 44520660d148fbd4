//! Remote/local reconciliation.
//!
//! An entry of the remote manifest is needed when the local manifest has no
//! entry for its path, or only entries with a different content hash. Sizes
//! do not take part in the comparison.

use std::collections::{HashMap, HashSet};

use crate::manifest::Manifest;

/// Compute the remote entries that must be (re)downloaded.
///
/// The result resolves against the remote base.
pub fn needed(remote: &Manifest, local: &Manifest) -> Manifest {
  let mut local_hashes: HashMap<&str, HashSet<&str>> = HashMap::new();
  for entry in local {
    local_hashes.entry(entry.path()).or_default().insert(entry.hash());
  }

  let mut needed = Manifest::with_base(remote.base());
  for entry in remote {
    let present = local_hashes
      .get(entry.path())
      .is_some_and(|hashes| hashes.contains(entry.hash()));
    if !present {
      needed.insert(entry.clone());
    }
  }
  needed
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;
  use crate::manifest::ManifestEntry;

  fn manifest(entries: &[(&str, &str, u64)]) -> Manifest {
    entries
      .iter()
      .map(|(path, hash, size)| ManifestEntry::new(*path, *hash, *size))
      .collect()
  }

  #[test]
  fn empty_local_needs_everything() {
    let remote = manifest(&[("/a.bin", "AAAA", 10), ("/b.bin", "BBBB", 20)]);
    assert_eq!(needed(&remote, &Manifest::new()), remote);
  }

  #[test]
  fn exact_match_is_not_needed() {
    let remote = manifest(&[("/a.bin", "AAAA", 10), ("/b.bin", "BBBB", 20)]);
    let local = manifest(&[("/a.bin", "AAAA", 10)]);

    let result = needed(&remote, &local);
    assert_eq!(result, manifest(&[("/b.bin", "BBBB", 20)]));
  }

  #[test]
  fn changed_hash_is_needed() {
    let remote = manifest(&[("/a.bin", "NEW1", 10)]);
    let local = manifest(&[("/a.bin", "OLD1", 10)]);
    assert_eq!(needed(&remote, &local), remote);
  }

  #[test]
  fn size_difference_alone_is_not_needed() {
    let remote = manifest(&[("/a.bin", "AAAA", 11)]);
    let local = manifest(&[("/a.bin", "AAAA", 10)]);
    assert!(needed(&remote, &local).is_empty());
  }

  #[test]
  fn result_keeps_remote_base() {
    let mut remote = manifest(&[("/a.bin", "AAAA", 10)]);
    remote.set_base("http://origin");
    assert_eq!(needed(&remote, &Manifest::with_base("/local")).base(), "http://origin");
  }

  fn arb_manifest() -> impl Strategy<Value = Manifest> {
    proptest::collection::vec(("/[a-d]", "[A-C]", 0u64..4), 0..12).prop_map(|entries| {
      entries
        .into_iter()
        .map(|(path, hash, size)| ManifestEntry::new(path, hash, size))
        .collect()
    })
  }

  proptest! {
    #[test]
    fn needed_is_exactly_the_missing_or_changed_entries(remote in arb_manifest(), local in arb_manifest()) {
      let result = needed(&remote, &local);

      for entry in &remote {
        let matched = local.iter().any(|l| l.path() == entry.path() && l.hash() == entry.hash());
        prop_assert_eq!(result.contains(entry), !matched);
      }
      prop_assert!(result.iter().all(|e| remote.contains(e)));
    }

    #[test]
    fn needed_is_idempotent(remote in arb_manifest(), local in arb_manifest()) {
      prop_assert_eq!(needed(&remote, &local), needed(&remote, &local));
    }
  }
}
