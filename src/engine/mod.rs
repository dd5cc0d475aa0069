// ==========================================
// 船舶库存合规系统 - 引擎层
// ==========================================
// 职责: 库存比对规则与逐船调度
// 红线: 比对器为纯计算; 数据读写经由 repository
// ==========================================

pub mod comparator;
pub mod compliance_runner;
pub mod error;
pub mod summary;

// 重导出核心引擎
pub use comparator::{compare_inventory, InventoryComparator};
pub use compliance_runner::{ComplianceRunner, VesselComplianceResult};
pub use error::{EngineError, EngineResult};
pub use summary::{RunSummary, SourceSummary, SummaryError, VesselSummary};
