// ==========================================
// 船舶库存合规系统 - 库存查询仓储
// ==========================================
// 职责: 为比对器提供船舶 / 船上库存 / 参考目录读取, 并写入比对结果
// 红线: Repository 不含业务逻辑, 比对在 engine::comparator 中完成
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::inventory::{InventoryRecord, IssueRow, VesselRecord};
use crate::domain::types::IssueType;
use crate::importer::cell::format_float;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// InventoryQueryRepository
// ==========================================
pub struct InventoryQueryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryQueryRepository {
    /// 创建新的仓储实例
    ///
    /// # 参数
    /// - db_path: 运行库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 全部船舶, 按 ship_id 排序; ship_id 为空的行不返回
    pub fn list_vessels(&self) -> RepositoryResult<Vec<VesselRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT ship_id, ship_name, ship_email, office_email
            FROM vessel
            WHERE ship_id IS NOT NULL
            ORDER BY ship_id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(VesselRecord {
                ship_id: column_text(row, 0)?.unwrap_or_default(),
                ship_name: column_text(row, 1)?,
                ship_email: column_text(row, 2)?,
                office_email: column_text(row, 3)?,
            })
        })?;

        let mut vessels = Vec::new();
        for vessel in rows {
            vessels.push(vessel?);
        }
        Ok(vessels)
    }

    /// 指定船舶的船上库存, 按 item 排序
    pub fn list_onboard_inventory(&self, ship_id: &str) -> RepositoryResult<Vec<InventoryRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT ship_id, item, onboard_edition
            FROM vessel_inventory_row
            WHERE ship_id = ?1
            ORDER BY item
            "#,
        )?;

        let rows = stmt.query_map(params![ship_id], |row| {
            let mut record = InventoryRecord::onboard(column_text(row, 1)?, column_text(row, 2)?);
            record.set("ship_id", column_text(row, 0)?);
            Ok(record)
        })?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    /// 参考目录, 按写入顺序（重复 item 以先出现者为准）
    pub fn list_reference_inventory(&self) -> RepositoryResult<Vec<InventoryRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT item, current_edition
            FROM ic_inventory_row
            ORDER BY rowid
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(InventoryRecord::reference(
                column_text(row, 0)?,
                column_text(row, 1)?,
            ))
        })?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    /// 批量写入比对结果（单事务）
    ///
    /// # 返回
    /// - Ok(usize): 写入条数
    pub fn insert_compliance_issues(&self, issues: &[IssueRow]) -> RepositoryResult<usize> {
        if issues.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO compliance_issue (
                    ship_id, item, onboard_edition, current_edition, issue_type
                ) VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )?;
            for issue in issues {
                stmt.execute(params![
                    issue.ship_id,
                    issue.item,
                    issue.onboard_edition,
                    issue.current_edition,
                    issue.issue_type.as_str(),
                ])?;
                count += 1;
            }
        }
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }

    /// 指定船舶已落库的比对结果, 按写入顺序
    pub fn list_compliance_issues(&self, ship_id: &str) -> RepositoryResult<Vec<IssueRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT ship_id, item, onboard_edition, current_edition, issue_type
            FROM compliance_issue
            WHERE ship_id = ?1
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map(params![ship_id], |row| {
            let issue_type: String = row.get(4)?;
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                issue_type,
            ))
        })?;

        let mut issues = Vec::new();
        for row in rows {
            let (ship_id, item, onboard_edition, current_edition, issue_type) = row?;
            let issue_type = IssueType::from_str(&issue_type).ok_or_else(|| {
                RepositoryError::InternalError(format!("未知问题类型: {}", issue_type))
            })?;
            issues.push(IssueRow {
                ship_id,
                item,
                onboard_edition,
                current_edition,
                issue_type,
            });
        }
        Ok(issues)
    }
}

/// 读取任意类型列并转为文本; NULL → None
///
/// 整数不带小数, 整数值浮点保留一位小数 (2.0), 与表格显示一致
fn column_text(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Integer(n) => Some(n.to_string()),
        ValueRef::Real(f) => Some(format_float(f)),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> InventoryQueryRepository {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(crate::db::SCHEMA_SQL).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO vessel (ship_id, ship_name, ship_email) VALUES ('S2', 'Beta', NULL);
            INSERT INTO vessel (ship_id, ship_name, ship_email) VALUES ('S1', 'Alpha', 'a@x.io');
            INSERT INTO vessel_inventory_row (ship_id, item, onboard_edition) VALUES ('S1', 'PUB-2', '1.0');
            INSERT INTO vessel_inventory_row (ship_id, item, onboard_edition) VALUES ('S1', 'PUB-1', NULL);
            INSERT INTO vessel_inventory_row (ship_id, item, onboard_edition) VALUES ('S2', 'PUB-9', '3');
            INSERT INTO ic_inventory_row (item, current_edition) VALUES ('PUB-2', '2.0');
            INSERT INTO ic_inventory_row (item, current_edition) VALUES ('PUB-1', '1.0');
            INSERT INTO ic_inventory_row (item, current_edition) VALUES ('PUB-2', '9.9');
            "#,
        )
        .unwrap();
        InventoryQueryRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_list_vessels_ordered_by_ship_id() {
        let repo = setup();
        let vessels = repo.list_vessels().unwrap();

        let ids: Vec<&str> = vessels.iter().map(|v| v.ship_id.as_str()).collect();
        assert_eq!(ids, vec!["S1", "S2"]);
        assert_eq!(vessels[0].ship_email.as_deref(), Some("a@x.io"));
        assert_eq!(vessels[1].ship_email, None);
    }

    #[test]
    fn test_list_onboard_inventory_filters_and_sorts() {
        let repo = setup();
        let records = repo.list_onboard_inventory("S1").unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("item"), Some("PUB-1"));
        assert!(records[0].contains("onboard_edition"));
        assert_eq!(records[0].get("onboard_edition"), None);
        assert_eq!(records[1].get("onboard_edition"), Some("1.0"));
    }

    #[test]
    fn test_list_reference_inventory_keeps_insertion_order() {
        let repo = setup();
        let records = repo.list_reference_inventory().unwrap();

        let editions: Vec<Option<&str>> =
            records.iter().map(|r| r.get("current_edition")).collect();
        assert_eq!(editions, vec![Some("2.0"), Some("1.0"), Some("9.9")]);
    }

    #[test]
    fn test_insert_and_list_compliance_issues() {
        let repo = setup();
        let issues = vec![IssueRow {
            ship_id: "S1".to_string(),
            item: "PUB-2".to_string(),
            onboard_edition: Some("1.0".to_string()),
            current_edition: Some("2.0".to_string()),
            issue_type: IssueType::Outdated,
        }];

        assert_eq!(repo.insert_compliance_issues(&issues).unwrap(), 1);
        assert_eq!(repo.list_compliance_issues("S1").unwrap(), issues);
        assert!(repo.list_compliance_issues("S2").unwrap().is_empty());
    }

    #[test]
    fn test_column_text_coerces_numbers() {
        let conn = Connection::open_in_memory().unwrap();
        let (i, r): (Option<String>, Option<String>) = conn
            .query_row("SELECT 7, 2.0", [], |row| {
                Ok((column_text(row, 0)?, column_text(row, 1)?))
            })
            .unwrap();
        assert_eq!(i.as_deref(), Some("7"));
        assert_eq!(r.as_deref(), Some("2.0"));
    }
}
