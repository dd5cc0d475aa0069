// ==========================================
// 船舶库存合规系统 - 导入 Repository 实现
// ==========================================
// 职责: 实现导入相关数据写入（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据写入
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::validation::ValidationIssue;
use crate::importer::cell::CellValue;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::ingestion_repo::{IngestionRepository, SourceBatch};
use rusqlite::{params, params_from_iter, Connection, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// IngestionRepositoryImpl
// ==========================================
pub struct IngestionRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl IngestionRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 在事务中批量写入原始审计行
    fn insert_raw_rows_tx(tx: &Transaction, rows: &[(usize, String)]) -> RepositoryResult<usize> {
        let mut stmt =
            tx.prepare("INSERT INTO raw_excel_rows (row_number, row_json) VALUES (?1, ?2)")?;

        let mut count = 0;
        for (row_number, row_json) in rows {
            stmt.execute(params![*row_number as i64, row_json])?;
            count += 1;
        }
        Ok(count)
    }

    /// 在事务中批量写入目标表
    ///
    /// 表名与列名来自静态数据源规格, 不接受外部输入
    fn insert_table_rows_tx(
        tx: &Transaction,
        table_name: &str,
        columns: &[&str],
        rows: &[Vec<CellValue>],
    ) -> RepositoryResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let column_list = columns
            .iter()
            .map(|c| format!("\"{}\"", c))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table_name, column_list, placeholders
        );

        let mut stmt = tx.prepare(&sql)?;
        let mut count = 0;
        for row in rows {
            if row.len() != columns.len() {
                return Err(RepositoryError::InternalError(format!(
                    "{}: 行宽 {} 与列数 {} 不一致",
                    table_name,
                    row.len(),
                    columns.len()
                )));
            }
            stmt.execute(params_from_iter(row.iter()))?;
            count += 1;
        }
        Ok(count)
    }

    /// 在事务中批量写入校验问题
    fn insert_validation_issues_tx(
        tx: &Transaction,
        issues: &[ValidationIssue],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO validation_errors (
                row_number, column_name, error_type, message, severity
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )?;

        let mut count = 0;
        for issue in issues {
            stmt.execute(params![
                issue.row_number.map(|n| n as i64),
                issue.column_name,
                issue.error_type.as_str(),
                issue.message,
                issue.severity.as_str(),
            ])?;
            count += 1;
        }
        Ok(count)
    }
}

impl IngestionRepository for IngestionRepositoryImpl {
    fn insert_validation_issues(&self, issues: &[ValidationIssue]) -> RepositoryResult<usize> {
        if issues.is_empty() {
            return Ok(0);
        }

        let mut conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = conn.transaction()?;
        let count = Self::insert_validation_issues_tx(&tx, issues)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }

    fn commit_source_batch(&self, batch: &SourceBatch<'_>) -> RepositoryResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = conn.transaction()?;

        if !batch.raw_rows.is_empty() {
            Self::insert_raw_rows_tx(&tx, batch.raw_rows)?;
        }
        if !batch.mapped_rows.is_empty() {
            Self::insert_table_rows_tx(&tx, batch.table_name, batch.columns, batch.mapped_rows)?;
        }
        if !batch.issues.is_empty() {
            Self::insert_validation_issues_tx(&tx, batch.issues)?;
        }

        // tx 未提交即 drop 时自动回滚
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::IssueKind;
    use crate::importer::sheet_spec::VESSEL_INVENTORY_SPEC;

    fn setup() -> (Arc<Mutex<Connection>>, IngestionRepositoryImpl) {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(crate::db::SCHEMA_SQL).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let repo = IngestionRepositoryImpl::from_connection(conn.clone());
        (conn, repo)
    }

    fn count(conn: &Arc<Mutex<Connection>>, table: &str) -> i64 {
        conn.lock()
            .unwrap()
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_commit_source_batch_writes_all_parts() {
        let (conn, repo) = setup();
        let raw = vec![(2usize, "{\"source\":\"x\"}".to_string())];
        let mapped = vec![vec![
            CellValue::text("S1"),
            CellValue::text("PUB-1"),
            CellValue::text("1.0"),
            CellValue::Null,
            CellValue::text("Chart"),
        ]];
        let issues = vec![ValidationIssue::warning(
            Some(3),
            None,
            IssueKind::EmptyRow,
            "safe_vessels_inventory: empty row 3",
        )];

        repo.commit_source_batch(&SourceBatch {
            raw_rows: &raw,
            table_name: VESSEL_INVENTORY_SPEC.table_name,
            columns: VESSEL_INVENTORY_SPEC.table_columns,
            mapped_rows: &mapped,
            issues: &issues,
        })
        .unwrap();

        assert_eq!(count(&conn, "raw_excel_rows"), 1);
        assert_eq!(count(&conn, "vessel_inventory_row"), 1);
        assert_eq!(count(&conn, "validation_errors"), 1);

        let severity: String = conn
            .lock()
            .unwrap()
            .query_row("SELECT severity FROM validation_errors", [], |r| r.get(0))
            .unwrap();
        assert_eq!(severity, "warning");
    }

    #[test]
    fn test_commit_source_batch_rolls_back_on_failure() {
        let (conn, repo) = setup();
        let raw = vec![(2usize, "{}".to_string())];
        // 行宽与列数不一致, 触发失败
        let mapped = vec![vec![CellValue::text("only-one")]];

        let result = repo.commit_source_batch(&SourceBatch {
            raw_rows: &raw,
            table_name: VESSEL_INVENTORY_SPEC.table_name,
            columns: VESSEL_INVENTORY_SPEC.table_columns,
            mapped_rows: &mapped,
            issues: &[],
        });

        assert!(result.is_err());
        assert_eq!(count(&conn, "raw_excel_rows"), 0);
        assert_eq!(count(&conn, "vessel_inventory_row"), 0);
    }

    #[test]
    fn test_insert_validation_issues_in_own_transaction() {
        let (conn, repo) = setup();
        let issues = vec![ValidationIssue::fatal(
            None,
            None,
            IssueKind::UnreadableFile,
            "safe_ic_inventory: failed to read x.xlsx",
        )];

        assert_eq!(repo.insert_validation_issues(&issues).unwrap(), 1);
        assert_eq!(repo.insert_validation_issues(&[]).unwrap(), 0);
        assert_eq!(count(&conn, "validation_errors"), 1);
    }
}
