//! End-to-end pipeline runs against file-backed reference data and an
//! in-memory staging backend

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use dof_loader::app::adapters::database::TableName;
use dof_loader::app::adapters::reference_store::{FileReferenceStore, SettingsRecord};
use dof_loader::app::services::dof_reader::ReaderOptions;
use dof_loader::app::services::staging_loader::StagingBackend;
use dof_loader::pipeline::PipelineOptions;
use dof_loader::{Error, IngestionPipeline, ObstacleRecord, QuarantineReason, Result};

/// Staging backend keeping tables in memory
///
/// The target enforces the (oas_code, obst_number) key the way the
/// obstacle table does, failing the whole copy on a duplicate.
#[derive(Default)]
struct MemoryBackend {
    tables: Mutex<HashMap<String, Vec<ObstacleRecord>>>,
    valid_from: Mutex<Vec<NaiveDate>>,
}

impl MemoryBackend {
    fn rows_in(&self, table: &TableName) -> usize {
        self.tables
            .lock()
            .unwrap()
            .get(&table.to_string())
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn has_table(&self, table: &TableName) -> bool {
        self.tables.lock().unwrap().contains_key(&table.to_string())
    }

    fn truncate(&self, table: &TableName) {
        self.tables.lock().unwrap().remove(&table.to_string());
    }
}

#[async_trait]
impl StagingBackend for MemoryBackend {
    async fn drop_table_if_exists(&self, table: &TableName) -> Result<()> {
        self.tables.lock().unwrap().remove(&table.to_string());
        Ok(())
    }

    async fn create_staging_table(&self, staging: &TableName) -> Result<()> {
        self.tables.lock().unwrap().insert(staging.to_string(), Vec::new());
        Ok(())
    }

    async fn write_staging(&self, staging: &TableName, records: &[ObstacleRecord]) -> Result<u64> {
        let mut tables = self.tables.lock().unwrap();
        let rows = tables
            .get_mut(&staging.to_string())
            .ok_or_else(|| Error::configuration(format!("relation {} does not exist", staging)))?;
        rows.extend_from_slice(records);
        Ok(records.len() as u64)
    }

    async fn copy_to_target(
        &self,
        staging: &TableName,
        target: &TableName,
        valid_from: NaiveDate,
    ) -> Result<u64> {
        let mut tables = self.tables.lock().unwrap();
        let staged = tables.get(&staging.to_string()).cloned().unwrap_or_default();
        let existing = tables.entry(target.to_string()).or_default();

        let mut keys: HashSet<(String, String)> = existing
            .iter()
            .map(|r| (r.oas_code.clone(), r.obst_number.clone()))
            .collect();
        for record in &staged {
            if !keys.insert((record.oas_code.clone(), record.obst_number.clone())) {
                return Err(Error::configuration(format!(
                    "duplicate key value violates unique constraint: ({}, {})",
                    record.oas_code, record.obst_number
                )));
            }
        }

        existing.extend(staged.iter().cloned());
        self.valid_from.lock().unwrap().push(valid_from);
        Ok(staged.len() as u64)
    }
}

// =============================================================================
// Fixtures
// =============================================================================

const CSV_HEADER: &str = "OAS,VERIFIED STATUS,COUNTRY,STATE,CITY,LATDEC,LONDEC,TYPE,QUANTITY,AGL,AMSL,LIGHTING,ACCURACY,MARKING,FAA STUDY,ACTION,JDATE";

fn csv_settings() -> Value {
    json!({
        "csv_table_map": {
            "VERIFIED STATUS": "verif_status_code",
            "CITY": "city",
            "QUANTITY": "quantity",
            "AGL": "agl",
            "AMSL": "amsl",
            "LIGHTING": "lighting_code",
            "MARKING": "marking_code",
            "FAA STUDY": "faa_study_number",
            "ACTION": "action",
            "JDATE": "julian_date"
        },
        "coordinates_map": { "LATDEC": "lat", "LONDEC": "lon" },
        "parsed_map": { "oas_ident": "OAS", "accuracy": "ACCURACY", "obstacle_type": "TYPE" }
    })
}

/// 1-based inclusive extents of the fixed-width layout used below
const DAT_EXTENTS: &[(&str, usize, usize)] = &[
    ("oas_code", 1, 2),
    ("obst_number", 4, 9),
    ("verif_status_code", 11, 11),
    ("city", 13, 28),
    ("lat_src", 30, 41),
    ("lon_src", 43, 55),
    ("obst_type", 57, 74),
    ("quantity", 76, 76),
    ("agl", 78, 82),
    ("amsl", 84, 88),
    ("lighting_code", 90, 90),
    ("hor_acc_code", 92, 92),
    ("vert_acc_code", 94, 94),
    ("marking_code", 96, 96),
    ("faa_study_number", 98, 111),
    ("action", 113, 113),
    ("julian_date", 115, 121),
];

fn dat_settings() -> Value {
    let fields: serde_json::Map<String, Value> = DAT_EXTENTS
        .iter()
        .map(|(name, start, end)| (name.to_string(), json!([start, end])))
        .collect();
    json!({ "fields": fields })
}

fn dat_line(values: &[(&str, &str)]) -> String {
    let mut line = vec![' '; 121];
    for (name, value) in values {
        let (_, start, _) = DAT_EXTENTS.iter().find(|(field, _, _)| field == name).unwrap();
        for (offset, ch) in value.chars().enumerate() {
            line[start - 1 + offset] = ch;
        }
    }
    line.into_iter().collect::<String>().trim_end().to_string()
}

fn dat_values<'a>(number: &'a str, lat: &'a str, obstacle_type: &'a str) -> Vec<(&'static str, &'a str)> {
    vec![
        ("oas_code", "01"),
        ("obst_number", number),
        ("verif_status_code", "O"),
        ("city", "MOBILE"),
        ("lat_src", lat),
        ("lon_src", "088-02-36.00W"),
        ("obst_type", obstacle_type),
        ("quantity", "1"),
        ("agl", "00254"),
        ("amsl", "00280"),
        ("lighting_code", "R"),
        ("hor_acc_code", "4"),
        ("vert_acc_code", "D"),
        ("marking_code", "N"),
        ("faa_study_number", "2009ASO01234OE"),
        ("action", "A"),
        ("julian_date", "2009123"),
    ]
}

fn store() -> Arc<FileReferenceStore> {
    Arc::new(FileReferenceStore::new(
        vec![
            SettingsRecord {
                file_type: "csv".to_string(),
                revision_date: NaiveDate::from_ymd_opt(2024, 1, 1),
                settings: csv_settings(),
            },
            SettingsRecord {
                file_type: "dat".to_string(),
                revision_date: None,
                settings: dat_settings(),
            },
        ],
        vec![
            ("TOWER".to_string(), 1),
            ("BLDG".to_string(), 2),
            ("STACK".to_string(), 3),
        ],
    ))
}

fn target() -> TableName {
    TableName::new("dof", "obstacle").unwrap()
}

fn valid_from() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 10, 6).unwrap()
}

fn options(quarantine_dir: &Path) -> PipelineOptions {
    PipelineOptions {
        reader: ReaderOptions::default(),
        quarantine_dir: Some(quarantine_dir.to_path_buf()),
        valid_from: Some(valid_from()),
    }
}

fn write_source(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Five rows, the third with a latitude of 91 degrees
fn five_row_csv() -> String {
    [
        CSV_HEADER,
        "01-000001, O, US, AL, MOBILE , 30.6916667,-88.0433333, TOWER,1,254,280,R,4D,N,2009ASO01234OE,A,2009123",
        "01-000002, O, US, AL, MOBILE , 30.7000000,-88.0500000, BLDG,1,120,140,N,2C,N,,A,2010001",
        "01-000003, O, US, AL, MOBILE , 91-30-00.00N,088-02-36.00W, TOWER,1,300,320,R,4D,N,,A,2010002",
        "01-000004, U, US, AL, DAPHNE , 30.6000000,-87.9000000, STACK,2,180,200,L,1A,M,,C,2011100",
        "01-000005, O, US, AL, FAIRHOPE , 30.5200000,-87.9000000, TOWER,1,90,105,R,5E,N,,A,2012200",
    ]
    .join("\n")
        + "\n"
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_csv_run_loads_valid_rows_and_quarantines_bad_latitude() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), "DOF.CSV", &five_row_csv());
    let backend = Arc::new(MemoryBackend::default());
    let pipeline = IngestionPipeline::new(store(), options(dir.path()))
        .with_loader(backend.clone(), target());

    let summary = pipeline.run(&source).await.unwrap();

    assert_eq!(summary.rows_read(), 5);
    assert_eq!(summary.accepted(), 4);
    assert_eq!(summary.quarantined(), 1);
    assert_eq!(summary.rows_loaded(), Some(4));
    assert_eq!(summary.by_reason().get(&QuarantineReason::CoordinateError), Some(&1));
    assert_eq!(summary.revision_date, NaiveDate::from_ymd_opt(2024, 1, 1));
    assert_eq!(summary.valid_from, Some(valid_from()));

    assert_eq!(backend.rows_in(&target()), 4);
    assert!(!backend.has_table(&target().staging()));
    assert_eq!(*backend.valid_from.lock().unwrap(), vec![valid_from()]);

    let quarantine_file = summary.quarantine_file.expect("quarantine file written");
    let content = std::fs::read_to_string(&quarantine_file).unwrap();
    let mut lines = content.lines();
    assert!(lines.next().unwrap().starts_with("source_line,"));
    let row = lines.next().unwrap();
    assert!(row.starts_with("4,"));
    assert!(row.contains("91-30-00.00N"));
    assert!(row.contains("coordinate error"));
    assert!(lines.next().is_none());
}

#[tokio::test]
async fn test_loaded_records_are_normalized() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), "DOF.CSV", &five_row_csv());
    let backend = Arc::new(MemoryBackend::default());
    let pipeline = IngestionPipeline::new(store(), options(dir.path()))
        .with_loader(backend.clone(), target());

    pipeline.run(&source).await.unwrap();

    let tables = backend.tables.lock().unwrap();
    let rows = &tables["dof.obstacle"];
    let first = rows.iter().find(|r| r.obst_number == "000001").unwrap();
    assert_eq!(first.key(), ("01", "000001"));
    assert_eq!(first.type_id, 1);
    assert_eq!(first.hor_acc_code, 4);
    assert_eq!(first.vert_acc_code, 'D');
    assert_eq!(first.city, "MOBILE");
    assert_eq!(first.faa_study_number.as_deref(), Some("2009ASO01234OE"));
    assert!((first.latitude - 30.6916667).abs() < 1e-9);

    let second = rows.iter().find(|r| r.obst_number == "000002").unwrap();
    assert_eq!(second.faa_study_number, None);
    assert_eq!(second.type_id, 2);
}

#[tokio::test]
async fn test_rerun_into_cleared_target_loads_same_count() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), "DOF.CSV", &five_row_csv());
    let backend = Arc::new(MemoryBackend::default());
    let pipeline = IngestionPipeline::new(store(), PipelineOptions {
        quarantine_dir: None,
        ..options(dir.path())
    })
    .with_loader(backend.clone(), target());

    let first = pipeline.run(&source).await.unwrap();
    backend.truncate(&target());
    let second = pipeline.run(&source).await.unwrap();

    assert_eq!(first.rows_loaded(), second.rows_loaded());
    assert_eq!(backend.rows_in(&target()), 4);
}

#[tokio::test]
async fn test_rerun_into_loaded_target_fails_on_key_conflict() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), "DOF.CSV", &five_row_csv());
    let backend = Arc::new(MemoryBackend::default());
    let pipeline = IngestionPipeline::new(store(), PipelineOptions {
        quarantine_dir: None,
        ..options(dir.path())
    })
    .with_loader(backend.clone(), target());

    pipeline.run(&source).await.unwrap();
    let error = pipeline.run(&source).await.unwrap_err();

    match error {
        Error::Load { stage, message } => {
            assert_eq!(stage, "copy");
            assert!(message.contains("duplicate key"));
        }
        other => panic!("unexpected error: {other}"),
    }
    // Nothing from the failed run reached the target
    assert_eq!(backend.rows_in(&target()), 4);
    assert!(!backend.has_table(&target().staging()));
}

#[tokio::test]
async fn test_stale_staging_table_is_tolerated() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), "DOF.CSV", &five_row_csv());
    let backend = Arc::new(MemoryBackend::default());
    backend
        .tables
        .lock()
        .unwrap()
        .insert(target().staging().to_string(), Vec::new());
    let pipeline = IngestionPipeline::new(store(), options(dir.path()))
        .with_loader(backend.clone(), target());

    let summary = pipeline.run(&source).await.unwrap();

    assert_eq!(summary.rows_loaded(), Some(4));
    assert!(!backend.has_table(&target().staging()));
}

#[tokio::test]
async fn test_unknown_obstacle_types_abort_before_load() {
    let dir = TempDir::new().unwrap();
    let content = [
        CSV_HEADER,
        "01-000001, O, US, AL, MOBILE , 30.69,-88.04, WINDMILL,1,254,280,R,4D,N,,A,2009123",
        "01-000002, O, US, AL, MOBILE , 30.70,-88.05, TOWER,1,254,280,R,4D,N,,A,2009123",
        "01-000003, O, US, AL, MOBILE , 30.71,-88.06, SILO,1,254,280,R,4D,N,,A,2009123",
        "01-000004, O, US, AL, MOBILE , 30.72,-88.07, WINDMILL,1,254,280,R,4D,N,,A,2009123",
    ]
    .join("\n");
    let source = write_source(dir.path(), "DOF.CSV", &content);
    let backend = Arc::new(MemoryBackend::default());
    let pipeline = IngestionPipeline::new(store(), options(dir.path()))
        .with_loader(backend.clone(), target());

    let error = pipeline.run(&source).await.unwrap_err();

    match error {
        Error::UnknownObstacleTypes { names } => {
            assert_eq!(names, vec!["SILO".to_string(), "WINDMILL".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(backend.rows_in(&target()), 0);
    assert!(!backend.has_table(&target().staging()));
}

#[tokio::test]
async fn test_dat_run_with_defaulted_settings() {
    let dir = TempDir::new().unwrap();
    let header = [
        "  CURRENCY DATE = 10/06/24",
        "",
        "OAS            CITY             LATITUDE     LONGITUDE     OBSTACLE",
        "------------------------------------------------------------------",
    ];
    let mut bad_number = dat_values("000002", "30-41-30.00N", "BLDG");
    bad_number.retain(|(name, _)| *name != "agl");
    bad_number.push(("agl", "12X45"));

    let lines = vec![
        dat_line(&dat_values("000001", "30-41-30.00N", "TOWER")),
        dat_line(&bad_number),
        dat_line(&dat_values("000003", "30-41-75.00N", "STACK")),
        dat_line(&dat_values("000004", "30-42-00.00N", "BLDG")),
    ];
    let content = header.iter().map(|s| s.to_string()).chain(lines).collect::<Vec<_>>().join("\n") + "\n";
    let source = write_source(dir.path(), "DOF.DAT", &content);
    let backend = Arc::new(MemoryBackend::default());
    let pipeline = IngestionPipeline::new(store(), options(dir.path()))
        .with_loader(backend.clone(), target());

    let summary = pipeline.run(&source).await.unwrap();

    assert_eq!(summary.rows_read(), 4);
    assert_eq!(summary.accepted(), 2);
    assert_eq!(summary.by_reason().get(&QuarantineReason::NonNumericValue), Some(&1));
    assert_eq!(summary.by_reason().get(&QuarantineReason::CoordinateError), Some(&1));
    assert_eq!(backend.rows_in(&target()), 2);

    let tables = backend.tables.lock().unwrap();
    let first = tables["dof.obstacle"].iter().find(|r| r.obst_number == "000001").unwrap();
    assert!((first.latitude - (30.0 + 41.0 / 60.0 + 30.0 / 3600.0)).abs() < 1e-9);
    assert!((first.longitude + (88.0 + 2.0 / 60.0 + 36.0 / 3600.0)).abs() < 1e-9);
    assert_eq!(first.hor_acc_code, 4);
    assert_eq!(first.agl, 254.0);
}

#[tokio::test]
async fn test_validate_only_run_never_loads() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), "DOF.CSV", &five_row_csv());
    let pipeline = IngestionPipeline::new(store(), options(dir.path()));

    let summary = pipeline.run(&source).await.unwrap();

    assert!(!pipeline.is_loading());
    assert_eq!(summary.rows_loaded(), None);
    assert_eq!(summary.valid_from, None);
    assert_eq!(summary.accepted(), 4);
    assert!(summary.quarantine_file.is_some());
}

#[tokio::test]
async fn test_unsupported_extension_is_fatal() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), "DOF.zip", "not a dof file");
    let pipeline = IngestionPipeline::new(store(), options(dir.path()));

    let error = pipeline.run(&source).await.unwrap_err();

    assert!(matches!(error, Error::UnsupportedFileType { .. }));
    assert_eq!(error.stage(), "read source");
}

#[tokio::test]
async fn test_missing_format_configuration_is_fatal() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), "DOF.CSV", &five_row_csv());
    let empty = Arc::new(FileReferenceStore::new(Vec::new(), vec![("TOWER".to_string(), 1)]));
    let pipeline = IngestionPipeline::new(empty, options(dir.path()));

    let error = pipeline.run(&source).await.unwrap_err();

    assert!(matches!(error, Error::FormatNotFound { ref file_type } if file_type == "csv"));
}

#[tokio::test]
async fn test_survey_lists_types_of_source() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), "DOF.CSV", &five_row_csv());
    let pipeline = IngestionPipeline::new(store(), options(dir.path()));

    let survey = pipeline.survey_obstacle_types(&source).await.unwrap();

    assert_eq!(survey.counts.get("TOWER"), Some(&3));
    assert_eq!(survey.counts.get("BLDG"), Some(&1));
    assert_eq!(survey.counts.get("STACK"), Some(&1));
    let index = pipeline.obstacle_types().await.unwrap();
    assert!(survey.unknown(&index).is_empty());
}
