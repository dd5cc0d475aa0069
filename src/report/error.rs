// ==========================================
// 船舶库存合规系统 - 报告模块错误类型
// ==========================================

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("报告文件写入失败 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type ReportResult<T> = Result<T, ReportError>;
