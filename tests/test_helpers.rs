// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 生成测试工作簿、初始化运行库、统计表行数
// ==========================================

#![allow(dead_code)]

use inventory_compliance::db::{initialize_run_database, open_sqlite_connection, RunMetadata};
use inventory_compliance::importer::SourceFiles;
use rusqlite::Connection;
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const IC_HEADERS: [&str; 7] = [
    "item", "itmdesc", "plinid", "itmclss", "upccode", "edition", "currdate",
];
pub const INDEX_HEADERS: [&str; 9] = [
    "shipid", "shipname", "custno", "imono", "shipstat", "email", "note1", "note2", "note3",
];
pub const INVENTORY_HEADERS: [&str; 7] = [
    "shipid", "shipname", "custno", "item", "edition", "storeedt", "descrip",
];

/// 测试单元格
#[derive(Debug, Clone)]
pub enum Cell {
    Text(String),
    Number(f64),
    /// Excel 日期序列号（按 yyyy-mm-dd 格式写入）
    Date(f64),
    Blank,
    /// 只有格式、没有值的单元格
    FormattedBlank,
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Blank
        } else {
            Cell::Text(value.to_string())
        }
    }
}

/// 字符串行 → 单元格行（空串视为空白单元格）
pub fn text_rows(rows: &[&[&str]]) -> Vec<Vec<Cell>> {
    rows.iter()
        .map(|row| row.iter().map(|v| Cell::from(*v)).collect())
        .collect()
}

/// 写入单工作表工作簿, 第一行为表头
pub fn write_workbook(path: &Path, rows: &[Vec<Cell>]) {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let worksheet = workbook.add_worksheet();

    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let (r, c) = (r as u32, c as u16);
            match cell {
                Cell::Text(s) => {
                    worksheet.write_string(r, c, s.as_str()).unwrap();
                }
                Cell::Number(n) => {
                    worksheet.write_number(r, c, *n).unwrap();
                }
                Cell::Date(serial) => {
                    worksheet
                        .write_number_with_format(r, c, *serial, &date_format)
                        .unwrap();
                }
                Cell::FormattedBlank => {
                    worksheet.write_blank(r, c, &date_format).unwrap();
                }
                Cell::Blank => {}
            }
        }
    }

    workbook.save(path).unwrap();
}

/// 写入只含字符串的工作簿
pub fn write_text_workbook(path: &Path, rows: &[&[&str]]) {
    write_workbook(path, &text_rows(rows));
}

/// 参考目录: PUB-1=2, PUB-2=B, PUB-3=1.0
pub fn write_valid_ic(path: &Path) {
    let mut rows = text_rows(&[
        &IC_HEADERS,
        &["PUB-1", "Chart 1", "L1", "C", "001", "2", ""],
        &["PUB-2", "Guide", "L1", "C", "002", "B", ""],
        &["PUB-3", "Manual", "L2", "M", "003", "1.0", ""],
    ]);
    // 2024-01-01
    for row in rows.iter_mut().skip(1) {
        row[6] = Cell::Date(45292.0);
    }
    write_workbook(path, &rows);
}

/// 船舶索引: S1 Alpha, S2 Beta
pub fn write_valid_index(path: &Path) {
    write_text_workbook(
        path,
        &[
            &INDEX_HEADERS,
            &["S1", "Alpha", "C1", "9000001", "ACTIVE", "alpha@ship.io", "", "", ""],
            &["S2", "Beta", "C2", "9000002", "ACTIVE", "beta@ship.io", "", "", ""],
        ],
    );
}

/// 船上库存:
/// - S1: PUB-1 一致, PUB-2 过期 (A vs B), PUB-9 参考目录中不存在
/// - S2: PUB-3 船上版本缺失
pub fn write_valid_inventory(path: &Path) {
    write_text_workbook(
        path,
        &[
            &INVENTORY_HEADERS,
            &["S1", "Alpha", "C1", "PUB-1", "2", "2", "Chart 1"],
            &["S1", "Alpha", "C1", "PUB-2", "A", "A", "Guide"],
            &["S1", "Alpha", "C1", "PUB-9", "1", "", "Unknown"],
            &["S2", "Beta", "C2", "PUB-3", "", "", "Manual"],
        ],
    );
}

/// 在目录中生成三个有效输入文件
pub fn write_valid_sources(dir: &Path) -> SourceFiles {
    let files = SourceFiles::new(
        dir.join("ic_inventory.xlsx"),
        dir.join("vessels_index.xlsx"),
        dir.join("vessels_inventory.xlsx"),
    );
    write_valid_ic(&files.ic_inventory);
    write_valid_index(&files.vessels_index);
    write_valid_inventory(&files.vessels_inventory);
    files
}

/// 创建并初始化临时运行库
///
/// # 返回
/// - TempDir: 临时目录（需要保持存活）
/// - PathBuf: 数据库文件路径
/// - Arc<Mutex<Connection>>: 共享连接
pub fn create_run_db(run_id: &str) -> (TempDir, PathBuf, Arc<Mutex<Connection>>) {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("run.sqlite");
    initialize_run_database(&db_path, &RunMetadata::new(run_id, "sha256:test")).unwrap();
    let conn = open_sqlite_connection(&db_path).unwrap();
    (dir, db_path, Arc::new(Mutex::new(conn)))
}

/// 统计表行数
pub fn count_rows(conn: &Arc<Mutex<Connection>>, table: &str) -> i64 {
    conn.lock()
        .unwrap()
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}

/// 查询单列文本
pub fn query_strings(conn: &Arc<Mutex<Connection>>, sql: &str) -> Vec<Option<String>> {
    let conn = conn.lock().unwrap();
    let mut stmt = conn.prepare(sql).unwrap();
    let rows = stmt
        .query_map([], |row| row.get::<_, Option<String>>(0))
        .unwrap();
    rows.map(|r| r.unwrap()).collect()
}
