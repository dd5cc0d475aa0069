// ==========================================
// 船舶库存合规系统 - 导入统计
// ==========================================

use crate::domain::validation::ValidationIssue;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ==========================================
// IngestionStats - 单个数据源导入结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionStats {
    pub source_name: String,
    pub file_path: PathBuf,
    pub rows_seen: usize,     // 表头以下迭代过的数据行数
    pub rows_inserted: usize, // 通过校验并写入的行数
    pub warnings: Vec<ValidationIssue>,
}

// ==========================================
// IngestionSummary - 一次运行的导入汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionSummary {
    pub results: Vec<IngestionStats>,
    pub warnings: Vec<ValidationIssue>,
    pub has_warnings: bool,
}

impl IngestionSummary {
    /// 汇总各数据源结果, warnings 按数据源顺序拼接
    pub fn from_results(results: Vec<IngestionStats>) -> Self {
        let warnings: Vec<ValidationIssue> = results
            .iter()
            .flat_map(|r| r.warnings.iter().cloned())
            .collect();
        let has_warnings = !warnings.is_empty();

        Self {
            results,
            warnings,
            has_warnings,
        }
    }

    pub fn result_for(&self, source_name: &str) -> Option<&IngestionStats> {
        self.results.iter().find(|r| r.source_name == source_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::IssueKind;

    fn stats(name: &str, warnings: Vec<ValidationIssue>) -> IngestionStats {
        IngestionStats {
            source_name: name.to_string(),
            file_path: PathBuf::from(format!("{}.xlsx", name)),
            rows_seen: 2,
            rows_inserted: 1,
            warnings,
        }
    }

    #[test]
    fn test_summary_unions_warnings_in_source_order() {
        let w1 = ValidationIssue::warning(Some(3), None, IssueKind::EmptyRow, "a: empty row 3");
        let w2 = ValidationIssue::warning(Some(2), Some("email"), IssueKind::MissingOptionalField, "b");

        let summary = IngestionSummary::from_results(vec![
            stats("a", vec![w1.clone()]),
            stats("b", vec![]),
            stats("c", vec![w2.clone()]),
        ]);

        assert!(summary.has_warnings);
        assert_eq!(summary.warnings, vec![w1, w2]);
        assert_eq!(summary.result_for("b").map(|r| r.rows_seen), Some(2));
    }

    #[test]
    fn test_summary_without_warnings() {
        let summary = IngestionSummary::from_results(vec![stats("a", vec![])]);
        assert!(!summary.has_warnings);
        assert!(summary.warnings.is_empty());
    }
}
