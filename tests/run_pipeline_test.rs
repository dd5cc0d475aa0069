// ==========================================
// 运行目录全流程测试
// ==========================================
// 测试目标: 运行目录 → 运行库元数据 → 导入 → 比对 → summary.json
// ==========================================

mod test_helpers;

use inventory_compliance::config::ConfigManager;
use inventory_compliance::db::{
    compute_input_fingerprint, initialize_run_database, open_sqlite_connection, read_run_id,
    read_schema_version, RunMetadata, CURRENT_SCHEMA_VERSION,
};
use inventory_compliance::engine::{ComplianceRunner, RunSummary};
use inventory_compliance::importer::ingest_excel_files;
use inventory_compliance::repository::{IngestionRepositoryImpl, InventoryQueryRepository};
use inventory_compliance::RuntimePaths;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use test_helpers::*;

#[test]
fn test_pipeline_writes_summary_into_run_dir() {
    let base = TempDir::new().unwrap();
    let inputs = TempDir::new().unwrap();
    let files = write_valid_sources(inputs.path());

    let paths = RuntimePaths::create_in(base.path(), Some("pipeline"), None).unwrap();
    let fingerprint = compute_input_fingerprint(&[
        files.ic_inventory.as_path(),
        files.vessels_index.as_path(),
        files.vessels_inventory.as_path(),
    ])
    .unwrap();
    assert!(fingerprint.starts_with("sha256:"));

    let db_path = paths.db_path();
    initialize_run_database(&db_path, &RunMetadata::new(&paths.run_id, fingerprint.clone()))
        .unwrap();
    let conn = Arc::new(Mutex::new(open_sqlite_connection(&db_path).unwrap()));

    let ingestion = ingest_excel_files(
        &files,
        Arc::new(IngestionRepositoryImpl::from_connection(conn.clone())),
        Arc::new(paths.clone()),
    )
    .unwrap();
    let results = ComplianceRunner::new(
        Arc::new(InventoryQueryRepository::from_connection(conn.clone())),
        ConfigManager::from_connection(conn.clone()),
    )
    .run(None)
    .unwrap();

    let summary = RunSummary::build(&paths.run_id, &ingestion, &results);
    summary.write_to(&paths.summary_path()).unwrap();

    assert!(paths.summary_path().starts_with(&paths.run_dir));
    assert!(paths.summary_path().is_file());
    let loaded: RunSummary =
        serde_json::from_str(&std::fs::read_to_string(paths.summary_path()).unwrap()).unwrap();
    assert_eq!(loaded.run_id, "pipeline");
    assert_eq!(loaded.total_issues(), 3);

    let guard = conn.lock().unwrap();
    assert_eq!(read_run_id(&guard).unwrap().as_deref(), Some("pipeline"));
    assert_eq!(
        read_schema_version(&guard).unwrap(),
        Some(CURRENT_SCHEMA_VERSION)
    );
    let stored: String = guard
        .query_row("SELECT input_fingerprint FROM metadata", [], |row| row.get(0))
        .unwrap();
    assert_eq!(stored, fingerprint);
}

#[test]
fn test_run_database_cannot_be_reinitialized() {
    let base = TempDir::new().unwrap();
    let paths = RuntimePaths::create_in(base.path(), Some("once"), None).unwrap();
    let metadata = RunMetadata::new(&paths.run_id, "sha256:test");

    initialize_run_database(paths.db_path(), &metadata).unwrap();
    assert!(initialize_run_database(paths.db_path(), &metadata).is_err());
}

#[test]
fn test_repeated_run_id_gets_unique_dir() {
    let base = TempDir::new().unwrap();

    let first = RuntimePaths::create_in(base.path(), Some("daily"), None).unwrap();
    let second = RuntimePaths::create_in(base.path(), Some("daily"), None).unwrap();

    assert_eq!(first.run_id, "daily");
    assert_eq!(second.run_id, "daily_02");
    assert_ne!(first.run_dir, second.run_dir);
    assert!(second.logs_dir.is_dir());
    assert!(second.output_dir.is_dir());
}
