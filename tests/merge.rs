//! Merge invariant tests
//!
//! Exercises the reconciliation engine's contract: idempotent upserts,
//! no data loss on failure, and id uniqueness across mixed batches.

use tempfile::TempDir;

use vodsync::catalog::{Catalog, CatalogStore, Record, StreamKind};
use vodsync::sync::{FetchOutcome, Reconciler, SyncError};

fn downloaded(id: &str, user: &str) -> Record {
    Record {
        date: Some("20240101".to_string()),
        user: Some(user.to_string()),
        kind: StreamKind::Youtube,
        title: Some("T".to_string()),
        downloaded: true,
        id_path: id.to_string(),
    }
}

fn transport_failure(record: Record) -> FetchOutcome {
    let reason = SyncError::Transport {
        id_path: record.id_path.clone(),
        status: 500,
        body: "server error".to_string(),
    };
    FetchOutcome::Failure { record, reason }
}

#[test]
fn test_merging_twice_equals_merging_once() {
    let temp = TempDir::new().unwrap();
    let store = CatalogStore::new(temp.path().join("catalog.csv"));
    let mut reconciler = Reconciler::new(Catalog::new(), store);

    reconciler
        .merge(vec![FetchOutcome::Success(downloaded("vid1", "A"))])
        .unwrap();
    let once = reconciler.catalog().records().to_vec();

    reconciler
        .merge(vec![FetchOutcome::Success(downloaded("vid1", "A"))])
        .unwrap();

    assert_eq!(reconciler.catalog().records(), &once[..]);
    assert_eq!(reconciler.catalog().len(), 1);
}

#[test]
fn test_failure_preserves_pre_cycle_record() {
    let temp = TempDir::new().unwrap();
    let store = CatalogStore::new(temp.path().join("catalog.csv"));

    let known = downloaded("vid1", "A");
    let mut catalog = Catalog::new();
    catalog.upsert(known.clone());
    let mut reconciler = Reconciler::new(catalog, store);

    reconciler
        .merge(vec![transport_failure(known.clone())])
        .unwrap();

    assert_eq!(reconciler.catalog().get("vid1"), Some(&known));
}

#[test]
fn test_mixed_batches_keep_id_paths_unique() {
    let temp = TempDir::new().unwrap();
    let store = CatalogStore::new(temp.path().join("catalog.csv"));
    let mut reconciler = Reconciler::new(Catalog::new(), store);

    reconciler
        .merge(vec![
            FetchOutcome::Success(downloaded("vid1", "A")),
            FetchOutcome::Success(downloaded("vid2", "A")),
        ])
        .unwrap();
    reconciler
        .merge(vec![
            FetchOutcome::Success(downloaded("vid1", "B")),
            transport_failure(Record::stub(StreamKind::Youtube, "vid2")),
            FetchOutcome::Success(downloaded("vid3", "B")),
        ])
        .unwrap();

    let catalog = reconciler.catalog();
    assert_eq!(catalog.len(), 3);

    let mut ids: Vec<_> = catalog.records().iter().map(|r| r.id_path.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);

    // The replacement won, in place
    assert_eq!(catalog.get("vid1").unwrap().user.as_deref(), Some("B"));
    assert_eq!(catalog.records()[0].id_path, "vid1");
}

#[test]
fn test_catalog_on_disk_lags_at_most_one_batch() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("catalog.csv");
    let mut reconciler = Reconciler::new(Catalog::new(), CatalogStore::new(&path));

    reconciler
        .merge(vec![FetchOutcome::Success(downloaded("vid1", "A"))])
        .unwrap();

    // After merge returns, disk already reflects the batch
    let on_disk = CatalogStore::new(&path).load().unwrap();
    assert_eq!(on_disk.len(), 1);
    assert_eq!(on_disk.get("vid1"), reconciler.catalog().get("vid1"));
}
