// ==========================================
// 船舶库存合规系统 - 运行目录
// ==========================================
// 布局: <用户数据目录>/InventoryComplianceReporter/runs/<run_id>/
//       ├── data/   运行库
//       ├── logs/   run.log
//       ├── output/ summary.json, reports/, emails/
//       └── tmp/
// 约束: 只使用绝对路径, 不在可执行文件旁或当前目录写入
// ==========================================

use chrono::Utc;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const APP_DIR_NAME: &str = "InventoryComplianceReporter";
pub const RUNS_DIR_NAME: &str = "runs";
pub const RUN_SUBDIRS: [&str; 4] = ["data", "logs", "output", "tmp"];
pub const LOG_FILE_NAME: &str = "run.log";
pub const DB_FILE_NAME: &str = "run.sqlite";
pub const SUMMARY_FILE_NAME: &str = "summary.json";
pub const REPORTS_DIR_NAME: &str = "reports";
pub const EMAILS_DIR_NAME: &str = "emails";

// ==========================================
// RunContext - 运行上下文
// ==========================================
// 导入引擎只用 run_id 做日志关联
pub trait RunContext {
    fn run_id(&self) -> &str;
}

/// 仅携带 run_id 的运行上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunId(pub String);

impl RunId {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self(run_id.into())
    }
}

impl RunContext for RunId {
    fn run_id(&self) -> &str {
        &self.0
    }
}

// ==========================================
// PathsError
// ==========================================
#[derive(Error, Debug)]
pub enum PathsError {
    #[error("无法解析用户数据目录")]
    NoDataDir,

    #[error("run_id 与 suffix 只能提供其一")]
    ConflictingRunId,

    #[error("运行后缀不能包含路径分隔符: {0}")]
    InvalidSuffix(String),

    #[error("运行目录创建失败 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ==========================================
// RuntimePaths - 单次运行的目录布局
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    pub run_id: String,
    pub app_base_dir: PathBuf,
    pub run_dir: PathBuf,
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub output_dir: PathBuf,
    pub tmp_dir: PathBuf,
    pub log_file: PathBuf,
}

impl RuntimePaths {
    /// 在用户数据目录下创建运行目录
    ///
    /// # 参数
    /// - run_id: 指定运行标识; None 时按当前 UTC 时间生成
    /// - suffix: 生成的运行标识后缀（与 run_id 互斥）
    pub fn create(run_id: Option<&str>, suffix: Option<&str>) -> Result<Self, PathsError> {
        let base = dirs::data_local_dir().ok_or(PathsError::NoDataDir)?;
        Self::create_in(&base, run_id, suffix)
    }

    /// 在指定基础目录下创建运行目录
    pub fn create_in(
        base: &Path,
        run_id: Option<&str>,
        suffix: Option<&str>,
    ) -> Result<Self, PathsError> {
        let run_id = match (run_id.filter(|r| !r.is_empty()), suffix) {
            (Some(_), Some(_)) => return Err(PathsError::ConflictingRunId),
            (Some(run_id), None) => run_id.to_string(),
            (None, suffix) => generate_run_id(suffix)?,
        };

        let app_base_dir = base.join(APP_DIR_NAME);
        let runs_dir = app_base_dir.join(RUNS_DIR_NAME);
        create_dir_all(&runs_dir)?;

        let (run_id, run_dir) = reserve_run_dir(&runs_dir, &run_id)?;
        for name in RUN_SUBDIRS {
            create_dir_all(&run_dir.join(name))?;
        }

        let logs_dir = run_dir.join("logs");
        Ok(Self {
            run_id,
            app_base_dir,
            data_dir: run_dir.join("data"),
            log_file: logs_dir.join(LOG_FILE_NAME),
            logs_dir,
            output_dir: run_dir.join("output"),
            tmp_dir: run_dir.join("tmp"),
            run_dir,
        })
    }

    /// 运行库路径
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    /// 汇总文件路径
    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join(SUMMARY_FILE_NAME)
    }

    /// HTML 报告目录（由报告写出时创建）
    pub fn reports_dir(&self) -> PathBuf {
        self.output_dir.join(REPORTS_DIR_NAME)
    }

    /// 邮件草稿目录（由草稿生成时创建）
    pub fn emails_dir(&self) -> PathBuf {
        self.output_dir.join(EMAILS_DIR_NAME)
    }
}

impl RunContext for RuntimePaths {
    fn run_id(&self) -> &str {
        &self.run_id
    }
}

/// 生成运行标识: YYYYMMDD_HHMMSS_ffffffZ[_suffix]
pub fn generate_run_id(suffix: Option<&str>) -> Result<String, PathsError> {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S_%6fZ").to_string();
    let cleaned = match suffix.map(|s| s.trim().replace(' ', "-")) {
        Some(s) if !s.is_empty() => s,
        _ => return Ok(timestamp),
    };

    if cleaned.contains('/') || cleaned.contains('\\') {
        return Err(PathsError::InvalidSuffix(cleaned));
    }
    Ok(format!("{}_{}", timestamp, cleaned))
}

/// 预留唯一运行目录; 已存在时依次尝试 _02, _03, ...
fn reserve_run_dir(runs_dir: &Path, run_id: &str) -> Result<(String, PathBuf), PathsError> {
    let mut candidate = run_id.to_string();
    let mut counter = 1;
    loop {
        let run_dir = runs_dir.join(&candidate);
        match fs::create_dir(&run_dir) {
            Ok(()) => return Ok((candidate, run_dir)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                counter += 1;
                candidate = format!("{}_{:02}", run_id, counter);
            }
            Err(source) => {
                return Err(PathsError::Io {
                    path: run_dir,
                    source,
                })
            }
        }
    }
}

fn create_dir_all(path: &Path) -> Result<(), PathsError> {
    fs::create_dir_all(path).map_err(|source| PathsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_in_builds_layout() {
        let base = TempDir::new().unwrap();
        let paths = RuntimePaths::create_in(base.path(), Some("run-a"), None).unwrap();

        assert_eq!(paths.run_id, "run-a");
        assert_eq!(
            paths.run_dir,
            base.path().join(APP_DIR_NAME).join(RUNS_DIR_NAME).join("run-a")
        );
        for dir in [&paths.data_dir, &paths.logs_dir, &paths.output_dir, &paths.tmp_dir] {
            assert!(dir.is_dir(), "{}", dir.display());
        }
        assert_eq!(paths.log_file, paths.logs_dir.join("run.log"));
        assert_eq!(paths.db_path(), paths.data_dir.join("run.sqlite"));
        assert_eq!(paths.reports_dir(), paths.output_dir.join("reports"));
        assert_eq!(paths.emails_dir(), paths.output_dir.join("emails"));
    }

    #[test]
    fn test_collisions_get_numbered_suffix() {
        let base = TempDir::new().unwrap();
        let first = RuntimePaths::create_in(base.path(), Some("run-a"), None).unwrap();
        let second = RuntimePaths::create_in(base.path(), Some("run-a"), None).unwrap();
        let third = RuntimePaths::create_in(base.path(), Some("run-a"), None).unwrap();

        assert_eq!(first.run_id, "run-a");
        assert_eq!(second.run_id, "run-a_02");
        assert_eq!(third.run_id, "run-a_03");
    }

    #[test]
    fn test_run_id_and_suffix_are_exclusive() {
        let base = TempDir::new().unwrap();
        let err = RuntimePaths::create_in(base.path(), Some("run-a"), Some("x")).unwrap_err();
        assert!(matches!(err, PathsError::ConflictingRunId));
    }

    #[test]
    fn test_generate_run_id_format() {
        let run_id = generate_run_id(None).unwrap();
        // YYYYMMDD_HHMMSS_ffffffZ
        assert_eq!(run_id.len(), 23);
        assert!(run_id.ends_with('Z'));
        assert_eq!(&run_id[8..9], "_");

        let with_suffix = generate_run_id(Some(" weekly batch ")).unwrap();
        assert!(with_suffix.ends_with("_weekly-batch"));

        assert!(matches!(
            generate_run_id(Some("a/b")),
            Err(PathsError::InvalidSuffix(_))
        ));
    }

    #[test]
    fn test_run_id_context() {
        let ctx = RunId::new("run-x");
        assert_eq!(ctx.run_id(), "run-x");
    }
}
