// ==========================================
// 船舶库存合规系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::validation::ValidationIssue;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 致命校验错误（终止当前数据源）=====
    #[error("{message}")]
    IngestionFatal {
        message: String,
        issues: Vec<ValidationIssue>,
    },

    // ===== 数据库错误 =====
    #[error("导入落库失败: {0}")]
    Repository(#[from] RepositoryError),

    #[error("原始行序列化失败 (行 {row}): {message}")]
    RowSerialization { row: usize, message: String },
}

impl ImportError {
    pub fn fatal(message: impl Into<String>, issues: Vec<ValidationIssue>) -> Self {
        ImportError::IngestionFatal {
            message: message.into(),
            issues,
        }
    }

    /// 致命错误携带的触发问题; 其他错误返回空切片
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            ImportError::IngestionFatal { issues, .. } => issues,
            _ => &[],
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, ImportError::IngestionFatal { .. })
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
