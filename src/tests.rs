use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::Connection;

use crate::infra::import::csv::CsvSource;
use crate::infra::memory::MemorySource;
use crate::infra::sqlite::queries::{
    list_snapshots, load_latest_snapshot, purge_snapshots, save_snapshot,
};
use crate::infra::sqlite::repo::{CachingSource, SnapshotSource};
use crate::infra::sqlite::schema::init_db;
use crate::ui::state::view_state::ViewState;
use crate::usecase::services::view_service::ViewService;
use crate::*;

fn unique_test_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("vetpanel-{prefix}-{nanos}"))
}

fn books() -> Vec<Record> {
    [
        ("Anatomy A", "anatomy"),
        ("Surgery B", "surgery"),
        ("Anatomy C", "anatomy"),
        ("Pharmacology D", "pharma"),
        ("Anatomy E", "anatomy"),
    ]
    .into_iter()
    .map(|(title, category)| {
        Record::new()
            .with("title", title)
            .with("category", category)
    })
    .collect()
}

fn titles(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            RecordFields
                .field_text(record, "title")
                .unwrap_or_default()
                .into_owned()
        })
        .collect()
}

fn pipeline() -> DataViewPipeline<RecordFields> {
    DataViewPipeline::new(RecordFields)
}

fn catalogue() -> Vec<Record> {
    let species = ["canine", "feline", "equine"];
    (0..23_i64)
        .map(|idx| {
            Record::new()
                .with("title", format!("Entry {}", 23 - idx))
                .with("species", species[(idx % 3) as usize])
                .with("published", idx % 2 == 0)
                .with("pages", idx * 7 % 11)
        })
        .collect()
}

#[test]
fn five_book_scenario_returns_last_anatomy_page() {
    let records = books();
    let spec = ViewSpec::new(2)
        .search("anatomy", ["title"])
        .filter("category", "anatomy")
        .sort(SortSpec::asc("title"))
        .page(2);

    let view = pipeline()
        .compute_view(&records, &spec)
        .expect("view should compute");

    assert_eq!(titles(&view.items), vec!["Anatomy E"]);
    assert_eq!(view.total_items, 3);
    assert_eq!(view.total_pages, 2);
}

#[test]
fn page_zero_and_ninety_nine_clamp_to_bounds() {
    let records = books();
    let base = ViewSpec::new(2).search("anatomy", ["title"]);

    let low = pipeline()
        .compute_view(&records, &base.clone().page(0))
        .expect("view should compute");
    let high = pipeline()
        .compute_view(&records, &base.page(99))
        .expect("view should compute");

    assert_eq!(low.page, 1);
    assert_eq!(titles(&low.items), vec!["Anatomy A", "Anatomy C"]);
    assert_eq!(high.page, 2);
    assert_eq!(titles(&high.items), vec!["Anatomy E"]);
}

#[test]
fn unknown_sort_key_leaves_input_order() {
    let records = books();
    let spec = ViewSpec::new(10).sort(SortSpec::asc("nonexistent"));

    let view = pipeline()
        .compute_view(&records, &spec)
        .expect("view should compute");

    assert_eq!(titles(&view.items), titles(&records));
}

#[test]
fn compute_view_is_repeatable_and_leaves_input_untouched() {
    let records = catalogue();
    let before = records.clone();
    let spec = ViewSpec::new(4)
        .search("entry 1", ["title"])
        .filter("published", "true")
        .sort(SortSpec::desc("pages"))
        .page(2);

    let first = pipeline().compute_view(&records, &spec).expect("view should compute");
    let second = pipeline().compute_view(&records, &spec).expect("view should compute");

    assert_eq!(first, second, "identical inputs give identical views");
    assert_eq!(records, before, "input must not be mutated");
}

#[test]
fn removing_a_filter_never_shrinks_the_result() {
    let records = catalogue();
    let both = ViewSpec::new(50)
        .filter("species", "feline")
        .filter("published", "true");
    let species_only = ViewSpec::new(50)
        .filter("species", "feline")
        .filter("published", "");

    let narrow = pipeline().compute_view(&records, &both).expect("view should compute");
    let wide = pipeline()
        .compute_view(&records, &species_only)
        .expect("view should compute");

    assert!(wide.total_items >= narrow.total_items);
    assert!(narrow.items.iter().all(|record| {
        record.get("species") == Some(&FieldValue::from("feline"))
            && record.get("published") == Some(&FieldValue::Bool(true))
    }));
}

#[test]
fn filter_key_known_before_search_still_applies() {
    let records = vec![
        Record::new().with("title", "Rabies"),
        Record::new().with("title", "Distemper").with("zoonotic", false),
    ];
    let spec = ViewSpec::new(10)
        .search("rabies", ["title"])
        .filter("zoonotic", "true");

    let view = pipeline().compute_view(&records, &spec).expect("view should compute");

    assert_eq!(view.total_items, 0, "Rabies lacks the field so it fails the filter");
}

#[test]
fn chained_stages_match_compute_view() {
    let records = vec![
        Record::new().with("title", "Rabies"),
        Record::new().with("title", "Distemper").with("zoonotic", false),
        Record::new().with("title", "Rabies vaccine").with("zoonotic", true),
    ];
    let spec = ViewSpec::new(10)
        .search("rabies", ["title"])
        .filter("zoonotic", "true")
        .sort(SortSpec::desc("title"));
    let pipeline = pipeline();

    let searched = pipeline.apply_search(&records, &spec.search_term, &spec.search_fields);
    let filtered = pipeline.apply_filters_within(searched, &spec.filters, &records);
    let sorted = pipeline.apply_sort(filtered, "title", SortDirection::Desc);
    let page = paginate(&sorted, spec.page, spec.page_size).expect("page size is valid");
    let chained: Vec<Record> = page.items.into_iter().map(|record| (*record).clone()).collect();

    let view = pipeline.compute_view(&records, &spec).expect("view should compute");

    assert_eq!(chained, view.items);
    assert_eq!(titles(&view.items), vec!["Rabies vaccine"]);
}

#[test]
fn search_removing_every_carrier_keeps_filter_active() {
    let records = vec![
        Record::new().with("title", "Rabies"),
        Record::new().with("title", "Distemper").with("zoonotic", false),
    ];
    let spec = ViewSpec::new(10)
        .search("rabies", ["title"])
        .filter("zoonotic", "true");
    let pipeline = pipeline();

    let searched = pipeline.apply_search(&records, &spec.search_term, &spec.search_fields);
    let chained = pipeline.apply_filters_within(searched, &spec.filters, &records);
    let view = pipeline.compute_view(&records, &spec).expect("view should compute");

    assert!(chained.is_empty());
    assert_eq!(view.total_items, chained.len());
}

#[test]
fn accented_titles_sort_beside_their_base_letter() {
    let records: Vec<Record> = ["Zoonosis", "Éclampsia", "Abscess"]
        .into_iter()
        .map(|title| Record::new().with("title", title))
        .collect();

    let view = pipeline()
        .compute_view(&records, &ViewSpec::new(10).sort(SortSpec::asc("title")))
        .expect("view should compute");

    assert_eq!(titles(&view.items), vec!["Abscess", "Éclampsia", "Zoonosis"]);
}

#[test]
fn pages_partition_the_filtered_collection() {
    let records = catalogue();
    let spec = ViewSpec::new(4)
        .filter("species", "canine")
        .sort(SortSpec::asc("title"));

    let first = pipeline().compute_view(&records, &spec).expect("view should compute");
    let mut seen = Vec::new();
    for page in 1..=first.total_pages {
        let view = pipeline()
            .compute_view(&records, &spec.clone().page(page as i64))
            .expect("view should compute");
        assert!(view.items.len() <= 4, "page never exceeds page size");
        seen.extend(view.items);
    }

    assert_eq!(seen.len(), first.total_items, "pages add up to total_items");
    assert_eq!(first.total_items, 8);
}

#[test]
fn titles_sort_with_numeric_awareness() {
    let records = catalogue();
    let spec = ViewSpec::new(3).sort(SortSpec::asc("title"));

    let view = pipeline().compute_view(&records, &spec).expect("view should compute");

    assert_eq!(titles(&view.items), vec!["Entry 1", "Entry 2", "Entry 3"]);
}

#[test]
fn view_state_drives_the_pipeline() {
    let records = books();
    let mut state = ViewState::new(vec!["title".to_string()], 2);
    state.begin_search();
    state.set_search("anatomy");
    state.toggle_sort("title");
    state.toggle_sort("title");
    state.go_to_page(7);

    let view = pipeline()
        .compute_view(&records, &state.to_spec())
        .expect("view should compute");
    state.sync_page(view.page);

    assert_eq!(titles(&view.items), vec!["Anatomy A"]);
    assert_eq!(state.page, 2);
}

#[test]
fn typed_records_work_through_fn_accessor() {
    #[derive(Clone, Debug, PartialEq)]
    struct Staff {
        name: String,
        role: String,
    }
    let staff = vec![
        Staff {
            name: "Dr. Okafor".to_string(),
            role: "lecturer".to_string(),
        },
        Staff {
            name: "Dr. Alvarez".to_string(),
            role: "admin".to_string(),
        },
    ];
    let accessor = FnAccessor(|member: &Staff, field: &str| match field {
        "name" => Some(member.name.clone()),
        "role" => Some(member.role.clone()),
        _ => None,
    });

    let view = DataViewPipeline::new(accessor)
        .compute_view(&staff, &ViewSpec::new(10).sort(SortSpec::asc("name")))
        .expect("view should compute");

    assert_eq!(view.items[0].name, "Dr. Alvarez");
}

#[test]
fn init_db_creates_snapshot_tables() {
    let temp_dir = unique_test_dir("init-db");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("snapshots.sqlite");

    let result = init_db(&db_path);

    assert!(result.is_ok(), "init_db should succeed: {result:?}");

    let conn = Connection::open(&db_path).expect("should open sqlite db");
    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('snapshot','field_name','cell')",
            [],
            |row| row.get(0),
        )
        .expect("table count query should succeed");

    assert_eq!(table_count, 3, "required tables should exist");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn snapshot_round_trip_keeps_types_and_missing_fields() {
    let temp_dir = unique_test_dir("snapshot-round-trip");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("snapshots.sqlite");

    let records = vec![
        Record::new()
            .with("term", "Bloat")
            .with("id", 9_007_199_254_740_993_i64)
            .with("approved", true)
            .with("views", 12.5),
        Record::new().with("term", "Colic").with("notes", FieldValue::Null),
        Record::new(),
    ];
    let batch = RecordBatch::bounded("dictionary", records.clone(), Some(3));

    save_snapshot(&db_path, &batch).expect("snapshot should save");
    let loaded = load_latest_snapshot(&db_path, "dictionary")
        .expect("snapshot should load")
        .expect("snapshot should exist");

    assert_eq!(loaded.records, records);
    assert_eq!(loaded.fetched_at.timestamp(), batch.fetched_at.timestamp());
    assert!(!loaded.truncated);

    let snapshots = list_snapshots(&db_path).expect("list should succeed");
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].row_count, 3);

    assert_eq!(purge_snapshots(&db_path, "dictionary").expect("purge should succeed"), 1);
    assert!(load_latest_snapshot(&db_path, "dictionary")
        .expect("query should succeed")
        .is_none());

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn caching_source_falls_back_to_last_snapshot() {
    let temp_dir = unique_test_dir("caching-source");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("snapshots.sqlite");
    let csv_path = temp_dir.join("drugs.csv");
    fs::write(&csv_path, "name,otc\nMeloxicam,false\nChlorhexidine,true\n")
        .expect("should write csv fixture");

    let cached = CachingSource::new(CsvSource::new(&csv_path), &db_path);
    let fresh = cached.fetch(None).expect("first fetch reads the file");
    assert_eq!(fresh.records.len(), 2);

    fs::remove_file(&csv_path).expect("should remove csv fixture");
    let fallback = cached.fetch(Some(1)).expect("fetch falls back to snapshot");

    assert_eq!(fallback.records.len(), 1);
    assert!(fallback.truncated, "limit applied to the stored batch");
    assert_eq!(fallback.fetched_at.timestamp(), fresh.fetched_at.timestamp());

    let direct = SnapshotSource {
        db_path: db_path.clone(),
        source_name: "drugs".to_string(),
    };
    assert_eq!(direct.fetch(None).expect("snapshot exists").records, fresh.records);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn caching_source_without_snapshot_reports_original_error() {
    let temp_dir = unique_test_dir("caching-miss");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("snapshots.sqlite");

    let cached = CachingSource::new(CsvSource::new(temp_dir.join("missing.csv")), &db_path);

    assert!(matches!(cached.fetch(None), Err(SourceError::NotFound(_))));

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn csv_source_feeds_the_view_service() {
    let temp_dir = unique_test_dir("csv-view");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let csv_path = temp_dir.join("books.csv");
    fs::write(
        &csv_path,
        "title,category\nAnatomy A,anatomy\nSurgery B,surgery\nAnatomy C,anatomy\nPharmacology D,pharma\nAnatomy E,anatomy\n",
    )
    .expect("should write csv fixture");

    let service = ViewService::new(Arc::new(CsvSource::new(&csv_path)), None);
    let spec = ViewSpec::new(2)
        .search("ANATOMY", ["title"])
        .sort(SortSpec::desc("title"));

    let view = service.fetch_view(&spec).expect("view should compute");

    assert_eq!(titles(&view.result.items), vec!["Anatomy E", "Anatomy C"]);
    assert_eq!(view.result.total_items, 3);
    assert!(!view.truncated);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn memory_source_respects_fetch_limit() {
    let service = ViewService::new(Arc::new(MemorySource::new("books", books())), Some(2));

    let batch = service.load().expect("memory source never fails");

    assert_eq!(titles(&batch.records), vec!["Anatomy A", "Surgery B"]);
    assert!(batch.truncated);
}
