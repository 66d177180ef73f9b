//! Platform tags and their filename suffix conventions.
//!
//! Kept as a static table so the per-platform extension rules are editable
//! and testable in one place.

use std::fmt;

use clap::ValueEnum;

/// A pre-built binary variant to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OsTag {
    /// Linux x86_64
    Linux,
    /// macOS x86_64
    Mac,
    /// macOS ARM64
    Macarm,
    /// Windows x86_64
    Win64,
}

impl OsTag {
    /// Suffix carried by native executables on this platform.
    ///
    /// Empty on Unix platforms; their executables have no extension.
    pub fn exe_suffix(self) -> &'static str {
        match self {
            OsTag::Win64 => ".exe",
            OsTag::Linux | OsTag::Mac | OsTag::Macarm => "",
        }
    }

    /// Suffix carried by shared libraries on this platform.
    pub fn lib_suffix(self) -> &'static str {
        match self {
            OsTag::Linux => ".so",
            OsTag::Mac | OsTag::Macarm => ".dylib",
            OsTag::Win64 => ".dll",
        }
    }

    /// Manifest key for this platform (the `assets` mapping is keyed by
    /// these strings).
    pub fn as_str(self) -> &'static str {
        match self {
            OsTag::Linux => "linux",
            OsTag::Mac => "mac",
            OsTag::Macarm => "macarm",
            OsTag::Win64 => "win64",
        }
    }
}

impl fmt::Display for OsTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
