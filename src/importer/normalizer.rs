// ==========================================
// 船舶库存合规系统 - 规范化函数
// ==========================================
// 职责: 表头/单元格/版本号规范化 (TRIM / 大小写折叠 / 空白合并)
// 红线: 纯函数; 表头规范化只用于匹配, 不用于显示
// ==========================================

use crate::importer::cell::{CellValue, NormalizedRow};

/// 大小写折叠
pub fn case_fold(value: &str) -> String {
    value.to_lowercase()
}

/// 表头规范化: Null → ""; 其他 → 字符串化 + TRIM + 大小写折叠
pub fn normalize_header(value: &CellValue) -> String {
    match value.to_text() {
        Some(text) => case_fold(text.trim()),
        None => String::new(),
    }
}

/// 单元格规范化: 字符串去首尾空白, 非字符串原样返回
pub fn normalize_cell(value: CellValue) -> CellValue {
    match value {
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.len() == s.len() {
                CellValue::Text(s)
            } else {
                CellValue::Text(trimmed.to_string())
            }
        }
        other => other,
    }
}

/// 版本号规范化
///
/// - None → None（“无版本”与“空串版本”区分）
/// - 内部连续空白合并为单个空格, 首尾去空白
/// - 仅在 `case_fold` 为真时折叠大小写
pub fn normalize_edition(edition: Option<&str>, case_fold_enabled: bool) -> Option<String> {
    let text = edition?;
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if case_fold_enabled {
        Some(case_fold(&collapsed))
    } else {
        Some(collapsed)
    }
}

/// 空值判定: Null 或全空白字符串; 非字符串值（数值/日期）永不为空
pub fn is_blank(value: &CellValue) -> bool {
    match value {
        CellValue::Null => true,
        CellValue::Text(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// 整行所有值均为空
pub fn is_empty_row(row: &NormalizedRow) -> bool {
    row.values().all(is_blank)
}
