use std::cell::Cell;

use serde_json::json;
use uuid::Uuid;

use super::{export_csv, import_csv};
use crate::controller::ListController;
use crate::domain::series::Document;
use crate::domain::status::WatchStatus;
use crate::listing::ListParams;
use crate::store::{DocumentStore, SqliteStore, StoreError, StoredDocument};

fn unique_db_path() -> String {
    std::env::temp_dir()
        .join(format!("watchlist-transfer-{}.sqlite", Uuid::now_v7()))
        .display()
        .to_string()
}

fn cleanup_db_files(path: &str) {
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{path}{suffix}"));
    }
}

/// Sqlite-backed store that rejects creates after a budget and counts
/// queries.
struct FlakyStore {
    inner: SqliteStore,
    creates_left: Cell<u32>,
    queries: Cell<u32>,
}

impl FlakyStore {
    fn new(path: &str, creates_allowed: u32) -> Self {
        Self {
            inner: SqliteStore::open_series(path).expect("store should open"),
            creates_left: Cell::new(creates_allowed),
            queries: Cell::new(0),
        }
    }
}

impl DocumentStore for FlakyStore {
    fn create(&self, fields: &Document) -> Result<String, StoreError> {
        if self.creates_left.get() == 0 {
            return Err(StoreError::Db(rusqlite::Error::InvalidQuery));
        }
        self.creates_left.set(self.creates_left.get() - 1);
        self.inner.create(fields)
    }

    fn query(&self, status: Option<WatchStatus>) -> Result<Vec<StoredDocument>, StoreError> {
        self.queries.set(self.queries.get() + 1);
        self.inner.query(status)
    }

    fn update(&self, id: &str, fields: &Document) -> Result<(), StoreError> {
        self.inner.update(id, fields)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.inner.delete(id)
    }
}

fn stored_bodies<S: DocumentStore>(store: &S) -> Vec<Document> {
    store
        .query(None)
        .expect("query should succeed")
        .into_iter()
        .map(|doc| doc.data)
        .collect()
}

const SAMPLE: &str = "\
title,seasons,total_episodes,watched_episodes,status,person
Dark,3,26,26,Completed,Jonas
Severance,2,19,4,Watching,
Arcane,2,18,0,Plan to watch,Vi
";

#[test]
fn import_creates_rows_in_file_order_with_numeric_cells() {
    let path = unique_db_path();
    let mut controller =
        ListController::new(SqliteStore::open_series(&path).expect("open"), ListParams::default());

    let summary = import_csv(&mut controller, SAMPLE.as_bytes());
    assert!(!summary.stopped());
    assert_eq!(summary.status, "completed");
    assert_eq!(summary.created, 3);

    let bodies = stored_bodies(controller.store());
    assert_eq!(bodies[0]["title"], json!("Dark"));
    assert_eq!(bodies[0]["total_episodes"], json!(26));
    assert_eq!(bodies[1]["title"], json!("Severance"));
    assert!(!bodies[1].contains_key("person"), "empty cells are omitted");
    assert_eq!(bodies[2]["status"], json!("Plan to watch"));

    assert_eq!(controller.visible().len(), 3, "list refreshed after import");

    drop(controller);
    cleanup_db_files(&path);
}

#[test]
fn import_stops_at_first_failing_row_and_fetches_once() {
    let path = unique_db_path();
    let mut controller = ListController::new(FlakyStore::new(&path, 1), ListParams::default());

    let summary = import_csv(&mut controller, SAMPLE.as_bytes());
    assert!(summary.stopped());
    assert_eq!(summary.status, "stopped");
    assert_eq!(summary.created, 1);
    assert_eq!(summary.failed_row, Some(3));
    assert!(summary.last_error.is_some());

    assert_eq!(controller.store().queries.get(), 1);
    assert_eq!(controller.visible().len(), 1, "earlier rows stay created");
    assert_eq!(controller.visible()[0].fields.title, "Dark");

    drop(controller);
    cleanup_db_files(&path);
}

#[test]
fn malformed_csv_stops_import() {
    let path = unique_db_path();
    let mut controller =
        ListController::new(SqliteStore::open_series(&path).expect("open"), ListParams::default());

    let input = "title,seasons\nGood,1\nBad,1,extra\nNever,2\n";
    let summary = import_csv(&mut controller, input.as_bytes());
    assert!(summary.stopped());
    assert_eq!(summary.created, 1);
    assert_eq!(summary.failed_row, Some(3));

    drop(controller);
    cleanup_db_files(&path);
}

#[test]
fn blank_rows_are_skipped_and_id_column_ignored() {
    let path = unique_db_path();
    let mut controller =
        ListController::new(SqliteStore::open_series(&path).expect("open"), ListParams::default());

    let input = " id , title ,rating\nS-old,Dark,5\n,,\n";
    let summary = import_csv(&mut controller, input.as_bytes());
    assert!(!summary.stopped());
    assert_eq!(summary.created, 1);
    assert_eq!(summary.skipped, 1);

    let bodies = stored_bodies(controller.store());
    assert_eq!(bodies.len(), 1);
    assert!(!bodies[0].contains_key("id"));
    assert_eq!(bodies[0]["rating"], json!("5"), "unknown columns stay text");
    assert_ne!(controller.visible()[0].id, "S-old");

    drop(controller);
    cleanup_db_files(&path);
}

#[test]
fn export_writes_canonical_columns_then_extras_without_ids() {
    let path = unique_db_path();
    let store = SqliteStore::open_series(&path).expect("open");
    let mut extra = Document::new();
    extra.insert("title".to_string(), json!("Dark"));
    extra.insert("rating".to_string(), json!(5));
    store.create(&extra).expect("create should succeed");

    let mut out = Vec::new();
    let summary = export_csv(&store, &mut out).expect("export should succeed");
    assert_eq!(summary.rows, 1);
    assert_eq!(
        summary.columns,
        vec![
            "title",
            "seasons",
            "total_episodes",
            "watched_episodes",
            "status",
            "person",
            "rating"
        ]
    );

    let text = String::from_utf8(out).expect("csv should be utf8");
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("title,seasons,total_episodes,watched_episodes,status,person,rating")
    );
    assert_eq!(lines.next(), Some("Dark,,,,,,5"));
    assert!(!text.contains("S-"));

    drop(store);
    cleanup_db_files(&path);
}

#[test]
fn exported_file_imports_back_to_equal_documents() {
    let source_path = unique_db_path();
    let mut source = ListController::new(
        SqliteStore::open_series(&source_path).expect("open"),
        ListParams::default(),
    );
    let summary = import_csv(&mut source, SAMPLE.as_bytes());
    assert_eq!(summary.created, 3);

    let mut exported = Vec::new();
    export_csv(source.store(), &mut exported).expect("export should succeed");

    let target_path = unique_db_path();
    let mut target = ListController::new(
        SqliteStore::open_series(&target_path).expect("open"),
        ListParams::default(),
    );
    let reimported = import_csv(&mut target, exported.as_slice());
    assert!(!reimported.stopped());

    assert_eq!(stored_bodies(source.store()), stored_bodies(target.store()));

    drop(source);
    drop(target);
    cleanup_db_files(&source_path);
    cleanup_db_files(&target_path);
}

#[test]
fn empty_collection_exports_header_only() {
    let path = unique_db_path();
    let store = SqliteStore::open_series(&path).expect("open");

    let mut out = Vec::new();
    let summary = export_csv(&store, &mut out).expect("export should succeed");
    assert_eq!(summary.rows, 0);
    let text = String::from_utf8(out).expect("csv should be utf8");
    assert_eq!(
        text.trim_end(),
        "title,seasons,total_episodes,watched_episodes,status,person"
    );

    drop(store);
    cleanup_db_files(&path);
}

#[test]
fn imported_status_spellings_are_found_by_the_status_filter() {
    let path = unique_db_path();
    let mut controller =
        ListController::new(SqliteStore::open_series(&path).expect("open"), ListParams::default());

    let input = "title,status\nDark,watching\nArcane,on_hold\nOdd,binging\n";
    let summary = import_csv(&mut controller, input.as_bytes());
    assert!(!summary.stopped());

    let bodies = stored_bodies(controller.store());
    assert_eq!(bodies[0]["status"], json!("Watching"));
    assert_eq!(bodies[1]["status"], json!("On Hold"));
    assert_eq!(bodies[2]["status"], json!("Plan to watch"));

    for (status, title) in [
        (WatchStatus::Watching, "Dark"),
        (WatchStatus::OnHold, "Arcane"),
        (WatchStatus::PlanToWatch, "Odd"),
    ] {
        let visible = controller
            .set_status_filter(Some(status))
            .expect("filter should apply");
        assert_eq!(visible.len(), 1, "filter {status}");
        assert_eq!(visible[0].fields.title, title);
        assert_eq!(visible[0].fields.status, status);
    }

    drop(controller);
    cleanup_db_files(&path);
}

#[test]
fn non_string_extra_values_come_back_as_text() {
    let source_path = unique_db_path();
    let source = SqliteStore::open_series(&source_path).expect("open");
    let mut doc = Document::new();
    doc.insert("title".to_string(), json!("Dark"));
    doc.insert("rating".to_string(), json!(5));
    source.create(&doc).expect("create should succeed");

    let mut exported = Vec::new();
    export_csv(&source, &mut exported).expect("export should succeed");

    let target_path = unique_db_path();
    let mut target = ListController::new(
        SqliteStore::open_series(&target_path).expect("open"),
        ListParams::default(),
    );
    import_csv(&mut target, exported.as_slice());
    let bodies = stored_bodies(target.store());
    assert_eq!(bodies[0]["title"], json!("Dark"));
    assert_eq!(bodies[0]["rating"], json!("5"));

    drop(source);
    drop(target);
    cleanup_db_files(&source_path);
    cleanup_db_files(&target_path);
}
