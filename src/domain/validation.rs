// ==========================================
// 船舶库存合规系统 - 校验问题
// ==========================================
// 红线: 创建后不可变, 只追加写入 validation_errors
// ==========================================

use crate::domain::types::{IssueKind, Severity};
use serde::{Deserialize, Serialize};

/// 导入过程中产生的结构化校验问题
///
/// `row_number` 为 1 起始的工作表行号（表头为 1, 数据从 2 开始）,
/// 文件级问题为 `None`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub row_number: Option<usize>,
    pub column_name: Option<String>,
    pub error_type: IssueKind,
    pub message: String,
    pub severity: Severity,
}

impl ValidationIssue {
    pub fn fatal(
        row_number: Option<usize>,
        column_name: Option<&str>,
        error_type: IssueKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            row_number,
            column_name: column_name.map(str::to_string),
            error_type,
            message: message.into(),
            severity: Severity::Fatal,
        }
    }

    pub fn warning(
        row_number: Option<usize>,
        column_name: Option<&str>,
        error_type: IssueKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            row_number,
            column_name: column_name.map(str::to_string),
            error_type,
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}
