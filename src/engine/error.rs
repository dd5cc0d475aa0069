// ==========================================
// 船舶库存合规系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::config::ConfigError;
use crate::repository::RepositoryError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("比对数据读写失败: {0}")]
    Repository(#[from] RepositoryError),

    #[error("比对配置读取失败: {0}")]
    Config(#[from] ConfigError),

    #[error("汇总序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("文件写入失败 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
