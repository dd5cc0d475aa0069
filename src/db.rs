// ==========================================
// 船舶库存合规系统 - SQLite 连接与运行库初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 每次运行一个独立数据库: 先建 schema, 再写元数据, 启用 WAL
// - raw_excel_rows / validation_errors 通过触发器保证只追加
// ==========================================

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 运行库 schema
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE metadata (
    run_id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    app_version TEXT NOT NULL,
    git_commit TEXT NOT NULL,
    build_date TEXT NOT NULL,
    input_fingerprint TEXT NOT NULL
);

CREATE TABLE schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE raw_excel_rows (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    row_number INTEGER NOT NULL,
    row_json TEXT NOT NULL
);

CREATE TABLE validation_errors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    row_number INTEGER,
    column_name TEXT,
    error_type TEXT NOT NULL,
    message TEXT NOT NULL,
    severity TEXT NOT NULL
);

CREATE TRIGGER raw_excel_rows_no_update
BEFORE UPDATE ON raw_excel_rows
BEGIN
    SELECT RAISE(ABORT, 'raw_excel_rows is append-only');
END;

CREATE TRIGGER raw_excel_rows_no_delete
BEFORE DELETE ON raw_excel_rows
BEGIN
    SELECT RAISE(ABORT, 'raw_excel_rows is append-only');
END;

CREATE TRIGGER validation_errors_no_update
BEFORE UPDATE ON validation_errors
BEGIN
    SELECT RAISE(ABORT, 'validation_errors is append-only');
END;

CREATE TRIGGER validation_errors_no_delete
BEFORE DELETE ON validation_errors
BEGIN
    SELECT RAISE(ABORT, 'validation_errors is append-only');
END;

CREATE TABLE ic_inventory_row (
    item TEXT,
    current_edition TEXT,
    description TEXT,
    "current_date" TEXT
);

CREATE TABLE vessel (
    ship_id TEXT,
    ship_name TEXT,
    customer_no TEXT,
    imo_no TEXT,
    ship_status TEXT,
    ship_email TEXT,
    office_email TEXT,
    ams INTEGER
);

CREATE TABLE vessel_inventory_row (
    ship_id TEXT,
    item TEXT,
    onboard_edition TEXT,
    store_edition TEXT,
    description TEXT
);

CREATE TABLE compliance_issue (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ship_id TEXT NOT NULL,
    item TEXT NOT NULL,
    onboard_edition TEXT,
    current_edition TEXT,
    issue_type TEXT NOT NULL
);

CREATE TABLE config_kv (
    scope_id TEXT NOT NULL DEFAULT 'global',
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);
"#;

// ==========================================
// DbInitError - 运行库初始化错误
// ==========================================
#[derive(Error, Debug)]
pub enum DbInitError {
    #[error("运行库已存在: {0}")]
    AlreadyExists(String),

    #[error("WAL 模式启用失败 (journal_mode={0})")]
    WalNotEnabled(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

// ==========================================
// RunMetadata - 运行元数据
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMetadata {
    pub run_id: String,
    pub app_version: String,
    pub git_commit: String,
    pub build_date: String,
    pub input_fingerprint: String,
    pub created_at: Option<String>, // None 时取当前 UTC 时间
}

impl RunMetadata {
    pub fn new(run_id: impl Into<String>, input_fingerprint: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            app_version: crate::VERSION.to_string(),
            git_commit: option_env!("GIT_COMMIT").unwrap_or("unknown").to_string(),
            build_date: option_env!("BUILD_DATE").unwrap_or("unknown").to_string(),
            input_fingerprint: input_fingerprint.into(),
            created_at: None,
        }
    }
}

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection<P: AsRef<Path>>(db_path: P) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化运行库: 启用 WAL, 原子地创建 schema 并写入元数据
///
/// 数据库文件不得已存在（每次运行一个新库）。
pub fn initialize_run_database<P: AsRef<Path>>(
    db_path: P,
    metadata: &RunMetadata,
) -> Result<(), DbInitError> {
    let path = db_path.as_ref();
    if path.exists() {
        return Err(DbInitError::AlreadyExists(path.display().to_string()));
    }

    let mut conn = open_sqlite_connection(path)?;
    enable_wal(&conn)?;

    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    tx.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        params![CURRENT_SCHEMA_VERSION],
    )?;
    let created_at = metadata.created_at.clone().unwrap_or_else(utc_now_iso);
    tx.execute(
        r#"
        INSERT INTO metadata (
            run_id, created_at, app_version, git_commit, build_date, input_fingerprint
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            metadata.run_id,
            created_at,
            metadata.app_version,
            metadata.git_commit,
            metadata.build_date,
            metadata.input_fingerprint,
        ],
    )?;
    tx.commit()?;

    tracing::info!(run_id = %metadata.run_id, db_path = %path.display(), "运行库初始化完成");
    Ok(())
}

/// 启用 WAL 模式, 返回值必须为 wal
pub fn enable_wal(conn: &Connection) -> Result<(), DbInitError> {
    let mode: String = conn.query_row("PRAGMA journal_mode=WAL;", [], |row| row.get(0))?;
    if mode.to_lowercase() != "wal" {
        return Err(DbInitError::WalNotEnabled(mode));
    }
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 读取运行元数据中的 run_id
pub fn read_run_id(conn: &Connection) -> rusqlite::Result<Option<String>> {
    conn.query_row("SELECT run_id FROM metadata LIMIT 1", [], |row| row.get(0))
        .optional()
}

/// 输入文件指纹: 按顺序对文件名与内容做 SHA-256 → "sha256:<64 hex>"
pub fn compute_input_fingerprint(files: &[&Path]) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        hasher.update(name.as_bytes());
        hasher.update(b"\0");

        let mut file = File::open(path)?;
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        hasher.update(b"\0");
    }

    Ok(format!("sha256:{:x}", hasher.finalize()))
}

/// ISO-8601 UTC 时间戳, 以 Z 结尾, 精确到秒
pub fn utc_now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn metadata(run_id: &str) -> RunMetadata {
        RunMetadata {
            run_id: run_id.to_string(),
            app_version: "1.2.3".to_string(),
            git_commit: "deadbeef".to_string(),
            build_date: "2024-01-01".to_string(),
            input_fingerprint: "abc123".to_string(),
            created_at: None,
        }
    }

    #[test]
    fn test_initialize_creates_schema_and_metadata() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("run.sqlite");

        initialize_run_database(&db_path, &metadata("run-1")).unwrap();

        let conn = open_sqlite_connection(&db_path).unwrap();
        assert_eq!(read_run_id(&conn).unwrap(), Some("run-1".to_string()));
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));

        let mode: String = conn
            .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");

        let created_at: String = conn
            .query_row("SELECT created_at FROM metadata", [], |row| row.get(0))
            .unwrap();
        assert!(created_at.ends_with('Z'));
    }

    #[test]
    fn test_initialize_refuses_existing_database() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("run.sqlite");
        initialize_run_database(&db_path, &metadata("run-1")).unwrap();

        let err = initialize_run_database(&db_path, &metadata("run-1")).unwrap_err();
        assert!(matches!(err, DbInitError::AlreadyExists(_)));
    }

    #[test]
    fn test_input_fingerprint_depends_on_content() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.xlsx");
        let b = dir.path().join("b.xlsx");
        std::fs::write(&a, b"one").unwrap();
        std::fs::write(&b, b"two").unwrap();

        let first = compute_input_fingerprint(&[&a, &b]).unwrap();
        assert!(first.starts_with("sha256:"));
        assert_eq!(first.len(), "sha256:".len() + 64);
        assert_eq!(first, compute_input_fingerprint(&[&a, &b]).unwrap());

        std::fs::write(&b, b"three").unwrap();
        assert_ne!(first, compute_input_fingerprint(&[&a, &b]).unwrap());
        assert!(compute_input_fingerprint(&[&dir.path().join("missing.xlsx")]).is_err());
    }

    #[test]
    fn test_audit_tables_are_append_only() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("run.sqlite");
        initialize_run_database(&db_path, &metadata("run-1")).unwrap();

        let conn = open_sqlite_connection(&db_path).unwrap();
        conn.execute(
            "INSERT INTO raw_excel_rows (row_number, row_json) VALUES (2, '{}')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO validation_errors (row_number, error_type, message, severity) \
             VALUES (2, 'empty_row', 'm', 'warning')",
            [],
        )
        .unwrap();

        assert!(conn.execute("UPDATE raw_excel_rows SET row_json = 'x'", []).is_err());
        assert!(conn.execute("DELETE FROM raw_excel_rows", []).is_err());
        assert!(conn.execute("UPDATE validation_errors SET message = 'x'", []).is_err());
        assert!(conn.execute("DELETE FROM validation_errors", []).is_err());
    }
}
