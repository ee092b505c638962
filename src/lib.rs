//! vodsync - incremental stream-transcript archive synchronizer
//!
//! Keeps a local catalog of transcript records in step with a remote
//! archive, downloading only what is missing while respecting a strict
//! per-domain request rate limit and tolerating partial failures without
//! corrupting previously-known state.
//!
//! # Architecture
//!
//! The engine is built around three guarantees:
//! - merging fetch results is idempotent (upsert by `id_path`),
//! - at most one in-flight request per domain (the rate limiter is the
//!   only suspension point),
//! - a failed fetch never mutates known state (the catalog has a single
//!   writer and failures are only logged).
//!
//! # Modules
//!
//! - `catalog`: the record model, in-memory catalog, and CSV persistence
//! - `sync`: rate limiter, archive fetcher, schema translation,
//!   reconciliation, and the cycle orchestrator
//! - `config`: per-run configuration resolution
//! - `cli`: command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Run one sync cycle
//! vodsync sync
//!
//! # Inspect the catalog
//! vodsync status
//!
//! # Count words across a user's transcripts
//! vodsync words somestreamer --word hello
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod sync;

// Re-export main types at crate root for convenience
pub use catalog::{Catalog, CatalogStore, Record, StreamKind};
pub use config::SyncConfig;
pub use sync::{
    ArchiveClient, ArchiveFetcher, DomainRateLimiter, FetchOutcome, FetchResponse, Reconciler,
    SyncError, SyncOrchestrator, SyncReport, TranscriptStore,
};
