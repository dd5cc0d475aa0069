// ==========================================
// 船舶库存合规系统 - 导入 Repository Trait
// ==========================================
// 职责: 定义导入引擎所需的存储接口（不包含实现）
// 红线: raw_excel_rows / validation_errors 只追加, 从不更新或删除
// ==========================================

use crate::domain::validation::ValidationIssue;
use crate::importer::cell::CellValue;
use crate::repository::error::RepositoryResult;

// ==========================================
// SourceBatch - 单个数据源的一次性落库内容
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct SourceBatch<'a> {
    /// 原始审计行: (工作表行号, 序列化 JSON)
    pub raw_rows: &'a [(usize, String)],
    /// 目标表名
    pub table_name: &'a str,
    /// 目标表列名
    pub columns: &'a [&'a str],
    /// 映射后的目标行（与 columns 对齐）
    pub mapped_rows: &'a [Vec<CellValue>],
    /// 本数据源累计的校验问题（表头告警 + 行级问题）
    pub issues: &'a [ValidationIssue],
}

impl SourceBatch<'_> {
    pub fn is_empty(&self) -> bool {
        self.raw_rows.is_empty() && self.mapped_rows.is_empty() && self.issues.is_empty()
    }
}

// ==========================================
// IngestionRepository Trait
// ==========================================
// 用途: 导入引擎的存储协作方
// 实现者: IngestionRepositoryImpl（使用 rusqlite）
pub trait IngestionRepository {
    /// 在独立事务中写入校验问题（致命错误路径使用）
    ///
    /// # 返回
    /// - Ok(usize): 写入条数
    fn insert_validation_issues(&self, issues: &[ValidationIssue]) -> RepositoryResult<usize>;

    /// 在一个事务中依次写入: 原始行 → 目标表行 → 校验问题
    ///
    /// 任一步失败整体回滚; 空集合对应的批量写入跳过。
    fn commit_source_batch(&self, batch: &SourceBatch<'_>) -> RepositoryResult<()>;
}
