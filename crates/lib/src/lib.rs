//! patchsync-lib: manifest-driven file tree synchronization.
//!
//! This crate keeps a local file tree in step with a remote content manifest:
//! - `manifest`: the `(path, hash, size)` record set and its line format
//! - `fetch`: streamed, cancellable HTTP downloads and LZMA decompression
//! - `validate`: re-hashing local files and pruning stale records
//! - `diff`: computing what must be downloaded
//! - `sync`: the orchestrator tying the above together, with progress callbacks

pub mod cancel;
pub mod config;
pub mod consts;
pub mod diff;
pub mod fetch;
pub mod manifest;
pub mod platform;
pub mod sync;
pub mod util;
pub mod validate;
