//! Merge and persist logic for fetch results.
//!
//! The reconciler is the catalog's single writer. Successes are upserted
//! and the catalog is persisted before the merge returns, so the file on
//! disk is never more than one batch behind memory. Failures only get
//! logged: the pre-fetch record stays untouched, which is what makes the
//! next cycle retry it.

use anyhow::Result;
use tracing::{error, info, warn};

use crate::catalog::{Catalog, CatalogStore, Record};

use super::translate::IndexEntry;
use super::FetchOutcome;

/// Counts from one merge batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeSummary {
    pub merged: usize,
    pub failed: usize,
}

/// Owns the catalog and serializes every mutation to it.
pub struct Reconciler {
    catalog: Catalog,
    store: CatalogStore,
}

impl Reconciler {
    /// Take ownership of a loaded catalog and its store.
    pub fn new(catalog: Catalog, store: CatalogStore) -> Self {
        Self { catalog, store }
    }

    /// Read-only view of the catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Consume the reconciler, yielding the catalog.
    pub fn into_catalog(self) -> Catalog {
        self.catalog
    }

    /// Merge one batch of fetch outcomes and persist the catalog.
    ///
    /// Upserting by `id_path` makes repeated merges of the same batch
    /// idempotent. A save failure aborts the run: a catalog that cannot be
    /// persisted must not keep absorbing network results.
    pub fn merge(&mut self, outcomes: Vec<FetchOutcome>) -> Result<MergeSummary> {
        let mut summary = MergeSummary::default();

        for outcome in outcomes {
            match outcome {
                FetchOutcome::Success(record) => {
                    self.catalog.upsert(record);
                    summary.merged += 1;
                }
                FetchOutcome::Failure { record, reason } => {
                    summary.failed += 1;
                    if reason.is_schema_mismatch() {
                        error!(
                            id_path = %record.id_path,
                            %reason,
                            "Archive schema mismatch, record left untouched"
                        );
                    } else {
                        warn!(
                            id_path = %record.id_path,
                            %reason,
                            "Fetch failed, record left untouched for the next cycle"
                        );
                    }
                }
            }
        }

        self.store.save(&self.catalog)?;
        info!(
            merged = summary.merged,
            failed = summary.failed,
            "Merged fetch results into catalog"
        );
        Ok(summary)
    }

    /// Upsert stub records for index entries not yet in the catalog.
    ///
    /// Known ids are left alone; new ones are appended as
    /// `downloaded=false` stubs and the catalog is persisted. Returns how
    /// many stubs were added.
    pub fn absorb_index(&mut self, entries: Vec<IndexEntry>) -> Result<usize> {
        let before = self.catalog.len();

        for entry in entries {
            if !self.catalog.contains(&entry.id_path) {
                self.catalog.upsert(Record::stub(entry.kind, entry.id_path));
            }
        }

        let added = self.catalog.len() - before;
        if added > 0 {
            self.store.save(&self.catalog)?;
        }
        info!(added, "Absorbed transcript candidates from the index");
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StreamKind;
    use crate::sync::SyncError;
    use tempfile::TempDir;

    fn reconciler(temp: &TempDir) -> Reconciler {
        let store = CatalogStore::new(temp.path().join("catalog.csv"));
        Reconciler::new(Catalog::new(), store)
    }

    fn success(id: &str) -> FetchOutcome {
        FetchOutcome::Success(Record {
            date: Some("20240101".to_string()),
            user: Some("A".to_string()),
            kind: StreamKind::Youtube,
            title: Some("T".to_string()),
            downloaded: true,
            id_path: id.to_string(),
        })
    }

    #[test]
    fn test_merge_persists_synchronously() {
        let temp = TempDir::new().unwrap();
        let mut reconciler = reconciler(&temp);

        reconciler.merge(vec![success("vid1")]).unwrap();

        let on_disk = CatalogStore::new(temp.path().join("catalog.csv"))
            .load()
            .unwrap();
        assert_eq!(on_disk.len(), 1);
        assert!(on_disk.get("vid1").unwrap().downloaded);
    }

    #[test]
    fn test_failure_does_not_touch_catalog() {
        let temp = TempDir::new().unwrap();
        let mut reconciler = reconciler(&temp);

        let stub = Record::stub(StreamKind::Youtube, "vid1");
        reconciler.catalog.upsert(stub.clone());

        let summary = reconciler
            .merge(vec![FetchOutcome::Failure {
                record: stub.clone(),
                reason: SyncError::Transport {
                    id_path: "vid1".to_string(),
                    status: 500,
                    body: "oops".to_string(),
                },
            }])
            .unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.merged, 0);
        assert_eq!(reconciler.catalog().get("vid1"), Some(&stub));
    }

    #[test]
    fn test_absorb_index_skips_known_ids() {
        let temp = TempDir::new().unwrap();
        let mut reconciler = reconciler(&temp);

        reconciler.merge(vec![success("vid1")]).unwrap();

        let added = reconciler
            .absorb_index(vec![
                IndexEntry {
                    kind: StreamKind::Youtube,
                    id_path: "vid1".to_string(),
                },
                IndexEntry {
                    kind: StreamKind::Twitch,
                    id_path: "v123".to_string(),
                },
            ])
            .unwrap();

        assert_eq!(added, 1);
        // The downloaded record was not downgraded to a stub
        assert!(reconciler.catalog().get("vid1").unwrap().downloaded);
        assert!(!reconciler.catalog().get("v123").unwrap().downloaded);
    }
}
