// ==========================================
// 船舶库存合规系统 - 配置层
// ==========================================
// 职责: 比对选项与邮件草稿选项读取, 缺省时使用内置默认值
// 存储: config_kv 表 (scope_id = 'global')
// ==========================================

pub mod compare_config_trait;
pub mod config_manager;
pub mod email_config_trait;
pub mod error;

// 重导出核心配置管理器
pub use compare_config_trait::CompareConfigReader;
pub use config_manager::{config_keys, ConfigManager};
pub use email_config_trait::{EmailConfigReader, DEFAULT_SUBJECT_TEMPLATE};
pub use error::{ConfigError, ConfigResult};
