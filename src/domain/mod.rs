// ==========================================
// 船舶库存合规系统 - 领域层
// ==========================================
// 职责: 导入引擎与比对器共享的值类型
// 红线: 不含 I/O, 不含业务流程
// ==========================================

pub mod ingestion;
pub mod inventory;
pub mod types;
pub mod validation;

// 重导出核心类型
pub use ingestion::{IngestionStats, IngestionSummary};
pub use inventory::{CompareOptions, InventoryRecord, IssueRow, VesselRecord};
pub use types::{IssueKind, IssueType, Severity};
pub use validation::ValidationIssue;
