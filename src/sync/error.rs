//! Error taxonomy for the sync engine.
//!
//! Every variant is fatal for a single record only; the cycle carries on
//! and reports counts. The sole run-aborting condition is catalog-file IO,
//! which travels as `anyhow::Error` at the application layer instead.

use std::path::PathBuf;

use thiserror::Error;

/// Why a single fetch/materialize attempt failed.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The archive answered with a non-200 status. The raw body is kept
    /// for logging.
    #[error("archive returned status {status} for '{id_path}': {body}")]
    Transport {
        id_path: String,
        status: u16,
        body: String,
    },

    /// The request itself failed: connect error, deadline exceeded, or a
    /// broken response stream. Handled identically to `Transport`.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The remote payload has a shape outside the fixed translation table.
    /// Logged distinctly to flag an upstream schema change.
    #[error("unexpected archive schema: {detail}")]
    SchemaMismatch { detail: String },

    /// Writing the transcript artifact failed.
    #[error("failed to write {path}: {source}")]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Whether this failure points at an upstream schema change.
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, SyncError::SchemaMismatch { .. })
    }
}
