// ==========================================
// 船舶库存合规系统 - 领域类型定义
// ==========================================
// 职责: 校验问题级别/类型标签、比对问题分类
// 序列化格式: 与数据库存储值一致
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 校验问题级别 (Severity)
// ==========================================
// fatal: 终止当前数据源; warning: 记录后继续
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Fatal,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Fatal => "fatal",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 校验问题类型 (error_type 标签)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    UnreadableFile,        // 文件无法读取
    EmptyWorksheet,        // 无工作表/工作表为空
    MissingHeader,         // 表头行全空
    MissingRequiredColumn, // 缺少必需列
    DuplicateHeader,       // 表头重复
    EmptyRow,              // 空行
    MissingKeyField,       // 主键字段为空
    MissingOptionalField,  // 可选字段为空
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::UnreadableFile => "unreadable_file",
            IssueKind::EmptyWorksheet => "empty_worksheet",
            IssueKind::MissingHeader => "missing_header",
            IssueKind::MissingRequiredColumn => "missing_required_column",
            IssueKind::DuplicateHeader => "duplicate_header",
            IssueKind::EmptyRow => "empty_row",
            IssueKind::MissingKeyField => "missing_key_field",
            IssueKind::MissingOptionalField => "missing_optional_field",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 比对问题分类 (Issue Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    Outdated,         // 船上版本与参考版本不一致
    MissingOnboard,   // 船上版本缺失
    MissingReference, // 参考目录中不存在
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Outdated => "OUTDATED",
            IssueType::MissingOnboard => "MISSING_ONBOARD",
            IssueType::MissingReference => "MISSING_REFERENCE",
        }
    }

    /// 从存储标签解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "OUTDATED" => Some(IssueType::Outdated),
            "MISSING_ONBOARD" => Some(IssueType::MissingOnboard),
            "MISSING_REFERENCE" => Some(IssueType::MissingReference),
            _ => None,
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_kind_tags_match_storage() {
        assert_eq!(IssueKind::MissingRequiredColumn.as_str(), "missing_required_column");
        assert_eq!(
            serde_json::to_string(&IssueKind::DuplicateHeader).unwrap(),
            "\"duplicate_header\""
        );
    }

    #[test]
    fn test_issue_type_serde() {
        assert_eq!(
            serde_json::to_string(&IssueType::MissingOnboard).unwrap(),
            "\"MISSING_ONBOARD\""
        );
        assert_eq!(IssueType::Outdated.to_string(), "OUTDATED");
        assert_eq!(
            IssueType::from_str("MISSING_REFERENCE"),
            Some(IssueType::MissingReference)
        );
        assert_eq!(IssueType::from_str("outdated"), None);
        assert_eq!(Severity::Warning.to_string(), "warning");
    }
}
