//! Error types surfaced to callers.
//!
//! Malformed input never shows up here: bad URLs fall back to the raw string,
//! and malformed stored or imported entries are skipped. What remains are
//! persistence failures and bundles that cannot be read at all.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to encode stored value: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage lock poisoned")]
    LockPoisoned,
}

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("bundle is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("bundle has no notes array")]
    MissingNotes,

    #[error(transparent)]
    Store(#[from] StoreError),
}
