//! High-level operations driven by the CLI

pub mod fetch;
