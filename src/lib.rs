//! relfetch - pre-built release asset fetcher
//!
//! Reads a `releases.json` manifest describing independent release
//! repositories and either lists the program names it manages or downloads
//! the pre-built binaries for one platform, staging them into a local
//! directory for downstream packaging.
//!
//! # Pipeline
//!
//! For each manifest entry: resolve the platform's asset name, download the
//! zip archive to a temp file, locate the wanted members inside it, extract
//! them under their canonical output names, and mark them executable.
//! Optionally the fetched files are appended into an aggregate zip.
//!
//! Entries are processed strictly in sequence; there is no per-entry
//! parallelism and no caching across runs.

pub mod io;
pub mod manifest;
pub mod ops;
pub mod platform;

// Re-exports for convenience
pub use io::download as downloader;
pub use manifest::Manifest;
pub use platform::OsTag;

/// User Agent string
pub const USER_AGENT: &str = concat!("relfetch/", env!("CARGO_PKG_VERSION"));
