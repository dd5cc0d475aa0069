// ==========================================
// 船舶库存合规系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有值使用参数化绑定; 表名/列名只来自静态数据源规格
// ==========================================

pub mod error;
pub mod ingestion_repo;
pub mod ingestion_repo_impl;
pub mod inventory_query_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use ingestion_repo::{IngestionRepository, SourceBatch};
pub use ingestion_repo_impl::IngestionRepositoryImpl;
pub use inventory_query_repo::InventoryQueryRepository;
