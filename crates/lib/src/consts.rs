//! Crate-wide constants.

/// Application name, used for config directory resolution.
pub const APP_NAME: &str = "patchsync";

/// Read size for streamed downloads and file hashing.
pub const CHUNK_SIZE: usize = 4096;

/// Literal extension carried by every manifest line and content URL.
pub const LZMA_EXT: &str = "lzma";

/// Line terminator of serialized manifests.
pub const LINE_SEPARATOR: &str = "\r\n";

/// Default origin serving the remote manifest and content blobs.
pub const DEFAULT_ORIGIN: &str = "http://origin.warframe.com";

/// File name of the compressed remote manifest under the origin.
pub const MANIFEST_FILENAME: &str = "index.txt.lzma";

/// Default file name of the local index.
pub const INDEX_FILENAME: &str = "local_index.txt";

/// Default local directory that entries are resolved against.
pub const DEFAULT_BASE_DIR: &str = "./Downloaded/Public";

/// Entries under this prefix are client-generated cache and never downloaded.
pub const DEFAULT_EXCLUDED_PREFIX: &str = "/Cache.Windows/";

/// Config file name inside the config directory.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Timeout for every HTTP request, in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;
