// ==========================================
// 船舶库存合规系统 - 库存记录与比对结果
// ==========================================
// 职责: 比对器的输入记录、输出问题行、比对选项
// 红线: 字段缺失 / 值为 NULL / 值为空串 三种状态必须区分
// ==========================================

use crate::domain::types::IssueType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// InventoryRecord - 比对输入记录
// ==========================================
// 字段名 → 值; 键不存在 = 字段缺失, Some(None) = NULL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    fields: BTreeMap<String, Option<String>>,
}

impl InventoryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// 船上库存记录（item + onboard_edition）
    pub fn onboard(item: Option<String>, onboard_edition: Option<String>) -> Self {
        let mut record = Self::new();
        record.set("item", item);
        record.set("onboard_edition", onboard_edition);
        record
    }

    /// 参考目录记录（item + current_edition）
    pub fn reference(item: Option<String>, current_edition: Option<String>) -> Self {
        let mut record = Self::new();
        record.set("item", item);
        record.set("current_edition", current_edition);
        record
    }

    pub fn with(mut self, field: &str, value: Option<&str>) -> Self {
        self.set(field, value.map(str::to_string));
        self
    }

    pub fn set(&mut self, field: &str, value: Option<String>) {
        self.fields.insert(field.to_string(), value);
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// 读取字段值; 字段缺失与 NULL 均返回 None
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|v| v.as_deref())
    }

    /// 按优先顺序取第一个“存在”的字段（即使其值为 NULL）
    pub fn first_present(&self, fields: &[&str]) -> Option<&str> {
        fields
            .iter()
            .find(|f| self.contains(f))
            .and_then(|f| self.get(f))
    }
}

// ==========================================
// IssueRow - 比对问题行
// ==========================================
// item 为原始大小写去空格后的文本, 与匹配时的大小写折叠无关
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueRow {
    pub ship_id: String,
    pub item: String,
    pub onboard_edition: Option<String>,
    pub current_edition: Option<String>,
    pub issue_type: IssueType,
}

// ==========================================
// CompareOptions - 比对选项
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareOptions {
    pub case_fold_items: bool,    // 条目匹配是否忽略大小写
    pub case_fold_editions: bool, // 版本比较是否忽略大小写
    pub deduplicate: bool,        // 是否去重
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            case_fold_items: true,
            case_fold_editions: false,
            deduplicate: true,
        }
    }
}

// ==========================================
// VesselRecord - 船舶索引记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VesselRecord {
    pub ship_id: String,
    pub ship_name: Option<String>,
    pub ship_email: Option<String>,
    pub office_email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_present_distinguishes_null_from_absent() {
        let record = InventoryRecord::new()
            .with("item", Some("PUB-1"))
            .with("onboard_edition", None)
            .with("edition", Some("3.0"));

        // onboard_edition 存在但为 NULL, 不回退到 edition
        assert_eq!(record.first_present(&["onboard_edition", "edition"]), None);

        let record = InventoryRecord::new()
            .with("item", Some("PUB-1"))
            .with("edition", Some("3.0"));
        assert_eq!(
            record.first_present(&["onboard_edition", "edition"]),
            Some("3.0")
        );
    }

    #[test]
    fn test_onboard_and_reference_keep_null_fields_present() {
        let onboard = InventoryRecord::onboard(Some("PUB-1".to_string()), None);
        assert!(onboard.contains("onboard_edition"));
        assert_eq!(onboard.get("onboard_edition"), None);
        assert!(!onboard.contains("edition"));

        let reference = InventoryRecord::reference(None, Some("2.0".to_string()));
        assert!(reference.contains("item"));
        assert_eq!(reference.get("current_edition"), Some("2.0"));
    }

    #[test]
    fn test_default_compare_options() {
        let opts = CompareOptions::default();
        assert!(opts.case_fold_items);
        assert!(!opts.case_fold_editions);
        assert!(opts.deduplicate);
    }
}
