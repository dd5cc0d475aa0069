// ==========================================
// 船舶库存合规系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + calamine
// 系统定位: 船上库存与参考目录的版本合规比对
// 流程: Excel 导入 → 运行库 → 逐船比对 → 汇总 → HTML 报告 / 邮件草稿
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 值类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 比对规则
pub mod engine;

// 导入层 - Excel 数据源
pub mod importer;

// 配置层 - 比对选项 / 邮件草稿选项
pub mod config;

// 报告层 - HTML 报告与 .eml 草稿
pub mod report;

// 数据库基础设施（连接初始化/PRAGMA 统一/运行库 schema）
pub mod db;

// 日志系统
pub mod logging;

// 运行目录
pub mod paths;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    CompareOptions, IngestionStats, IngestionSummary, InventoryRecord, IssueKind, IssueRow,
    IssueType, Severity, ValidationIssue, VesselRecord,
};

// 导入
pub use importer::{ingest_excel_files, ExcelIngestor, ImportError, SheetSpec, SourceFiles};

// 引擎
pub use engine::{compare_inventory, ComplianceRunner, InventoryComparator, RunSummary};

// 报告
pub use report::{EmailDrafter, ReportWriter};

// 运行上下文
pub use paths::{RunContext, RunId, RuntimePaths};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "船舶库存合规系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
