//! End-to-end synchronization cycle.
//!
//! One cycle: refresh the candidate list from the external index, then for
//! each category resolve the missing set, fetch metadata and transcripts,
//! and merge the outcomes. Each category's merge is persisted before the
//! next category begins, so a crash mid-cycle loses at most the
//! in-progress category's unsaved work.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::catalog::{Catalog, Record, StreamKind};

use super::error::SyncError;
use super::fetcher::ArchiveFetcher;
use super::reconcile::Reconciler;
use super::transcripts::{TranscriptDoc, TranscriptStore};
use super::translate::{parse_index, translate_metadata};
use super::FetchOutcome;

/// Merge counts for one category.
#[derive(Debug, Clone, Copy)]
pub struct CategorySummary {
    pub kind: StreamKind,
    pub merged: usize,
    pub failed: usize,
}

/// Outcome of one full sync cycle.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// New stub records absorbed from the index.
    pub discovered: usize,
    pub categories: Vec<CategorySummary>,
}

impl SyncReport {
    /// Total records merged across categories.
    pub fn merged(&self) -> usize {
        self.categories.iter().map(|c| c.merged).sum()
    }

    /// Total records that failed across categories.
    pub fn failed(&self) -> usize {
        self.categories.iter().map(|c| c.failed).sum()
    }
}

/// Drives the sync cycle against one archive.
pub struct SyncOrchestrator {
    fetcher: Box<dyn ArchiveFetcher>,
    reconciler: Reconciler,
    transcripts: TranscriptStore,
    overwrite_local: bool,
}

impl SyncOrchestrator {
    /// Assemble an orchestrator for one run.
    ///
    /// `overwrite_local` forces transcript re-download even when the
    /// artifact already exists.
    pub fn new(
        fetcher: Box<dyn ArchiveFetcher>,
        reconciler: Reconciler,
        transcripts: TranscriptStore,
        overwrite_local: bool,
    ) -> Self {
        Self {
            fetcher,
            reconciler,
            transcripts,
            overwrite_local,
        }
    }

    /// Read-only view of the catalog.
    pub fn catalog(&self) -> &Catalog {
        self.reconciler.catalog()
    }

    /// Consume the orchestrator, yielding the final catalog.
    pub fn into_catalog(self) -> Catalog {
        self.reconciler.into_catalog()
    }

    /// Run one full sync cycle.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<SyncReport> {
        let started_at = Utc::now();

        let discovered = self.refresh_index().await?;

        let mut categories = Vec::with_capacity(StreamKind::CATEGORIES.len());
        for kind in StreamKind::CATEGORIES {
            let missing = self.reconciler.catalog().missing(kind);
            if missing.is_empty() {
                debug!(%kind, "No transcripts require download");
                categories.push(CategorySummary {
                    kind,
                    merged: 0,
                    failed: 0,
                });
                continue;
            }

            info!(count = missing.len(), %kind, "Transcripts require download");
            let outcomes = self.fetch_batch(missing).await;
            let summary = self.reconciler.merge(outcomes)?;
            categories.push(CategorySummary {
                kind,
                merged: summary.merged,
                failed: summary.failed,
            });
        }

        Ok(SyncReport {
            started_at,
            finished_at: Utc::now(),
            discovered,
            categories,
        })
    }

    /// Refresh the candidate list from the external index.
    ///
    /// An unreachable index is logged and skipped; the cycle continues with
    /// already-known work.
    async fn refresh_index(&mut self) -> Result<usize> {
        let response = match self.fetcher.fetch_index().await {
            Ok(response) => response,
            Err(reason) => {
                error!(%reason, "Failed to retrieve the archive index");
                return Ok(0);
            }
        };
        if !response.is_ok() {
            error!(
                status = response.status,
                "Failed to retrieve the archive index"
            );
            return Ok(0);
        }

        let entries = parse_index(&response.body);
        info!(count = entries.len(), "Retrieved index entries");
        self.reconciler.absorb_index(entries)
    }

    /// Fetch metadata and transcript for every missing record in order.
    async fn fetch_batch(&self, missing: Vec<Record>) -> Vec<FetchOutcome> {
        let mut outcomes = Vec::with_capacity(missing.len());
        for record in missing {
            outcomes.push(self.fetch_one(record).await);
        }
        outcomes
    }

    /// Turn one missing record into a fetch outcome.
    ///
    /// On any failure the original pre-fetch record rides along in the
    /// outcome untouched; in particular a transcript failure after a
    /// successful metadata fetch drops the whole proposed update, so the
    /// next cycle re-attempts it.
    async fn fetch_one(&self, record: Record) -> FetchOutcome {
        let fetched = if record.has_metadata() {
            debug!(id_path = %record.id_path, "Metadata already present, skipping archive ping");
            record.clone()
        } else {
            match self.fetch_metadata(&record).await {
                Ok(fetched) => fetched,
                Err(reason) => return FetchOutcome::Failure { record, reason },
            }
        };

        match self.materialize(fetched).await {
            Ok(done) => FetchOutcome::Success(done),
            Err(reason) => FetchOutcome::Failure { record, reason },
        }
    }

    /// Fetch and translate metadata for a record.
    async fn fetch_metadata(&self, record: &Record) -> Result<Record, SyncError> {
        info!(id_path = %record.id_path, "Fetching stream metadata");
        let response = self.fetcher.fetch_metadata(&record.id_path).await?;
        if !response.is_ok() {
            return Err(SyncError::Transport {
                id_path: record.id_path.clone(),
                status: response.status,
                body: response.body,
            });
        }

        let payload: Value =
            serde_json::from_str(&response.body).map_err(|e| SyncError::SchemaMismatch {
                detail: format!("metadata for '{}' is not valid JSON: {}", record.id_path, e),
            })?;
        translate_metadata(&payload)
    }

    /// Download the transcript artifact and flip `downloaded`.
    ///
    /// An existing artifact is trusted without any network IO unless
    /// overwrite is forced; only a successful write (or that trust) marks
    /// the record downloaded.
    async fn materialize(&self, mut record: Record) -> Result<Record, SyncError> {
        if !self.overwrite_local && self.transcripts.exists(&record.id_path) {
            info!(
                id_path = %record.id_path,
                "Transcript artifact already exists, trusting local copy"
            );
        } else {
            let response = self.fetcher.fetch_transcript(&record.id_path).await?;
            if !response.is_ok() {
                return Err(SyncError::Transport {
                    id_path: record.id_path.clone(),
                    status: response.status,
                    body: response.body,
                });
            }

            let doc: TranscriptDoc =
                serde_json::from_str(&response.body).map_err(|e| SyncError::SchemaMismatch {
                    detail: format!(
                        "transcript for '{}' has an unexpected shape: {}",
                        record.id_path, e
                    ),
                })?;

            self.transcripts
                .write(&record.id_path, doc.transcript_lines.as_deref())
                .await?;
        }

        record.downloaded = true;
        Ok(record)
    }
}
