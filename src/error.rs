//! Error taxonomy for the suggestion engine.
//!
//! Only dictionary loading surfaces an error to callers. Learned-store
//! failures are logged and the engine carries on with whatever data it has;
//! blank input is treated as a no-op rather than an error.

use std::path::PathBuf;

/// Failure reading a base dictionary asset.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("dictionary asset not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read dictionary asset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed dictionary asset: {0}")]
    Parse(String),
}

/// The base dictionary for a locale could not be loaded.
///
/// The store stays empty for that locale; a later `preload` retries from
/// scratch.
#[derive(Debug, thiserror::Error)]
#[error("failed to load base dictionary for locale '{locale}': {source}")]
pub struct DictionaryLoadError {
    pub locale: String,
    #[source]
    pub source: AssetError,
}

/// Failure talking to the external learned-word store.
#[derive(Debug, thiserror::Error)]
pub enum LearnedStoreError {
    #[error("learned store unavailable: {0}")]
    Unavailable(String),
    #[error("no learned entry with id {0}")]
    NotFound(i64),
    #[error("learned store was modified by another writer (read revision {expected}, found {found})")]
    Conflict { expected: u64, found: u64 },
    #[error("learned store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("learned store data is corrupt: {0}")]
    Serde(#[from] serde_json::Error),
}
