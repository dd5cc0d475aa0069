// ==========================================
// 船舶库存合规系统 - 配置错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置值非法: {key} = {value:?} ({expected})")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("配置锁获取失败: {0}")]
    LockError(String),

    #[error("配置读写失败: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
