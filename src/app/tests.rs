use super::{App, AppError, ExportTarget};
use crate::card::EditField;
use crate::config::Config;
use crate::domain::series::{Document, SeriesFields};
use crate::domain::status::WatchStatus;
use crate::listing::{ListParams, SortOrder};
use crate::store::{DocumentStore, SqliteStore, StoreError, StoredDocument};
use std::cell::Cell;
use std::path::PathBuf;
use uuid::Uuid;

struct CountingStore {
    inner: SqliteStore,
    queries: Cell<u32>,
}

impl DocumentStore for CountingStore {
    fn create(&self, fields: &Document) -> Result<String, StoreError> {
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

fn unique_workspace() -> PathBuf {
    let root = std::env::temp_dir().join(format!("watchlist-app-test-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&root).expect("temp workspace should be creatable");
    root
}

fn open_app(root: &std::path::Path, config: &Config) -> App {
    let db_path = root.join(".watchlist/watchlist.sqlite");
    App::open(db_path.to_str().expect("utf8 path"), config).expect("app should open")
}

fn series(title: &str, total: u32, watched: u32, status: WatchStatus) -> SeriesFields {
    SeriesFields {
        total_episodes: total,
        watched_episodes: watched,
        status,
        ..SeriesFields::new(title)
    }
}

#[test]
fn open_creates_parent_directory_and_starts_empty() {
    let root = unique_workspace();
    let app = open_app(&root, &Config::default());
    assert!(root.join(".watchlist").is_dir());
    assert!(app.controller().visible().is_empty());
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn add_list_filter_and_reverse() {
    let root = unique_workspace();
    let mut app = open_app(&root, &Config::default());

    app.add(series("Beta", 10, 2, WatchStatus::Completed))
        .expect("add beta");
    let alpha = app
        .add(series("Alpha", 10, 5, WatchStatus::Watching))
        .expect("add alpha");
    assert!(alpha.id.starts_with("S-"));

    let all = app
        .list(ListParams::default(), false)
        .expect("list should succeed");
    let titles: Vec<&str> = all.iter().map(|r| r.fields.title.as_str()).collect();
    assert_eq!(titles, vec!["Alpha", "Beta"]);

    let reversed = app
        .list(ListParams::default(), true)
        .expect("list should succeed");
    assert_eq!(reversed[0].fields.title, "Beta");

    let watching = app
        .list(
            ListParams {
                status: Some(WatchStatus::Watching),
                ..ListParams::default()
            },
            false,
        )
        .expect("filtered list should succeed");
    assert_eq!(watching.len(), 1);
    assert_eq!(watching[0].id, alpha.id);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn configured_sort_applies_to_initial_fetch() {
    let root = unique_workspace();
    let config = Config::parse("[list]\nsort = \"desc\"\n").expect("config should parse");
    {
        let mut app = open_app(&root, &config);
        app.add(SeriesFields::new("Alpha")).expect("add alpha");
        app.add(SeriesFields::new("Zeta")).expect("add zeta");
    }
    let app = open_app(&root, &config);
    assert_eq!(app.controller().params().sort, SortOrder::Desc);
    assert_eq!(app.controller().visible()[0].fields.title, "Zeta");
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn add_rejects_blank_titles() {
    let root = unique_workspace();
    let mut app = open_app(&root, &Config::default());
    let result = app.add(SeriesFields::new("   "));
    assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn edit_saves_staged_changes_together() {
    let root = unique_workspace();
    let mut app = open_app(&root, &Config::default());
    let created = app
        .add(series("Dark", 26, 3, WatchStatus::Watching))
        .expect("add should succeed");

    let outcome = app
        .edit(
            &created.id,
            &[
                (EditField::WatchedEpisodes, "10".to_string()),
                (EditField::Status, "on hold".to_string()),
                (EditField::Person, "Jonas".to_string()),
            ],
            false,
        )
        .expect("edit should succeed");
    assert!(outcome.saved);

    let shown = app.show(&created.id).expect("show should succeed");
    assert_eq!(shown.fields.watched_episodes, 10);
    assert_eq!(shown.fields.status, WatchStatus::OnHold);
    assert_eq!(shown.fields.person.as_deref(), Some("Jonas"));
    assert!(app.controller().editing().is_none());

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn dry_run_edit_does_not_write() {
    let root = unique_workspace();
    let mut app = open_app(&root, &Config::default());
    let created = app
        .add(series("Dark", 26, 3, WatchStatus::Watching))
        .expect("add should succeed");

    let outcome = app
        .edit(
            &created.id,
            &[(EditField::Title, "Renamed".to_string())],
            true,
        )
        .expect("dry run should succeed");
    assert!(!outcome.saved);
    assert_eq!(outcome.record.fields.title, "Renamed");
    assert_eq!(
        app.show(&created.id).expect("show").fields.title,
        "Dark"
    );

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn invalid_edit_input_cancels_without_writing() {
    let root = unique_workspace();
    let mut app = open_app(&root, &Config::default());
    let created = app
        .add(series("Dark", 26, 3, WatchStatus::Watching))
        .expect("add should succeed");

    let result = app.edit(
        &created.id,
        &[
            (EditField::Title, "Renamed".to_string()),
            (EditField::Seasons, "three".to_string()),
        ],
        false,
    );
    assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    assert!(app.controller().editing().is_none());
    assert_eq!(app.show(&created.id).expect("show").fields.title, "Dark");

    let empty = app.edit(&created.id, &[], false);
    assert!(matches!(empty, Err(AppError::InvalidArgument(_))));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn increment_status_and_remove() {
    let root = unique_workspace();
    let mut app = open_app(&root, &Config::default());
    let created = app
        .add(series("Arcane", 12, 11, WatchStatus::Watching))
        .expect("add should succeed");

    let bumped = app.increment(&created.id).expect("increment");
    assert_eq!(bumped.fields.watched_episodes, 12);
    assert_eq!(bumped.progress(), 100.0);
    let unchanged = app.increment(&created.id).expect("increment at total");
    assert_eq!(unchanged.fields.watched_episodes, 12);

    let done = app
        .set_status(&created.id, WatchStatus::Completed)
        .expect("status change");
    assert_eq!(done.fields.status, WatchStatus::Completed);

    app.remove(&created.id).expect("remove should succeed");
    assert!(matches!(app.show(&created.id), Err(AppError::NotFound(_))));
    assert!(app.remove(&created.id).is_err());

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn export_then_import_through_files() {
    let root = unique_workspace();
    let config = Config::parse(&format!(
        "[export]\nfile_name = \"{}\"\n",
        root.join("out/series.csv").display()
    ))
    .expect("config should parse");
    let mut app = open_app(&root, &config);
    app.add(series("Dark", 26, 26, WatchStatus::Completed))
        .expect("add should succeed");

    let target = ExportTarget::File(app.default_export_path());
    let summary = app.export_csv(&target).expect("export should succeed");
    assert_eq!(summary.rows, 1);
    assert!(root.join("out/series.csv").exists());

    let second_root = unique_workspace();
    let mut second = open_app(&second_root, &Config::default());
    let imported = second
        .import_csv(&root.join("out/series.csv"))
        .expect("import should open the file");
    assert_eq!(imported.created, 1);
    assert_eq!(second.controller().visible()[0].fields.title, "Dark");

    let missing = second.import_csv(&root.join("missing.csv"));
    assert!(matches!(missing, Err(AppError::Io(_))));

    let _ = std::fs::remove_dir_all(root);
    let _ = std::fs::remove_dir_all(second_root);
}

#[test]
fn list_applies_all_parameters_with_one_query() {
    let root = unique_workspace();
    let db_path = root.join("watchlist.sqlite");
    let store = CountingStore {
        inner: SqliteStore::open_series(db_path.to_str().expect("utf8 path"))
            .expect("store should open"),
        queries: Cell::new(0),
    };
    let mut app = App::with_store(store, &Config::default()).expect("app should open");
    app.add(series("Dark", 26, 3, WatchStatus::Watching))
        .expect("add dark");
    app.add(series("Dune", 9, 0, WatchStatus::Watching))
        .expect("add dune");
    app.add(series("Arcane", 18, 18, WatchStatus::Completed))
        .expect("add arcane");
    let before = app.controller().store().queries.get();

    let params = ListParams {
        status: Some(WatchStatus::Watching),
        search: Some("d".to_string()),
        sort: SortOrder::Asc,
    };
    let titles: Vec<String> = app
        .list(params, true)
        .expect("list should succeed")
        .iter()
        .map(|record| record.fields.title.clone())
        .collect();
    assert_eq!(titles, vec!["Dune", "Dark"]);
    assert_eq!(app.controller().store().queries.get(), before + 1);
    assert_eq!(app.controller().params().sort, SortOrder::Desc);

    let _ = std::fs::remove_dir_all(root);
}
