// ==========================================
// 船舶库存合规系统 - 命令行入口
// ==========================================
// 用法:
//   inventory-compliance [选项] <ic_inventory.xlsx> <vessels_index.xlsx> <vessels_inventory.xlsx> [ship_id ...]
//
// 选项 (写入运行库 config_kv):
//   --draft-emails          生成 .eml 草稿
//   --office-email <addr>   默认办公室邮箱
//   --from <addr>           草稿 From 头
//   --subject <template>    主题模板
//
// 流程: 创建运行目录 → 初始化运行库 → 导入三个数据源 → 逐船比对
//       → HTML 报告 → 邮件草稿（可选）→ summary.json
// 退出码: 0 成功; 1 导入致命错误或运行失败; 2 参数错误
// ==========================================

use anyhow::Context;
use inventory_compliance::config::{config_keys, ConfigManager, EmailConfigReader};
use inventory_compliance::db::{
    compute_input_fingerprint, initialize_run_database, open_sqlite_connection, utc_now_iso,
    RunMetadata,
};
use inventory_compliance::engine::{ComplianceRunner, RunSummary};
use inventory_compliance::importer::{ingest_excel_files, ImportError, SourceFiles};
use inventory_compliance::report::{EmailDraftOptions, EmailDrafter, ReportWriter};
use inventory_compliance::repository::{IngestionRepositoryImpl, InventoryQueryRepository};
use inventory_compliance::{logging, RuntimePaths, APP_NAME, VERSION};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

const USAGE: &str = "用法: inventory-compliance [--draft-emails] [--office-email <addr>] [--from <addr>] [--subject <template>] <ic_inventory.xlsx> <vessels_index.xlsx> <vessels_inventory.xlsx> [ship_id ...]";

// ==========================================
// CliArgs - 命令行参数
// ==========================================
#[derive(Debug, Default)]
struct CliArgs {
    positional: Vec<String>,
    // (config_kv 键, 值)
    settings: Vec<(&'static str, String)>,
}

impl CliArgs {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, String> {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let key = match arg.as_str() {
                "--draft-emails" => {
                    parsed
                        .settings
                        .push((config_keys::EMAIL_DRAFT_ENABLED, "true".to_string()));
                    continue;
                }
                "--office-email" => config_keys::EMAIL_DEFAULT_OFFICE,
                "--from" => config_keys::EMAIL_FROM,
                "--subject" => config_keys::EMAIL_SUBJECT_TEMPLATE,
                flag if flag.starts_with("--") => return Err(format!("未知选项: {}", flag)),
                _ => {
                    parsed.positional.push(arg);
                    continue;
                }
            };
            let value = args.next().ok_or_else(|| format!("选项 {} 缺少参数值", arg))?;
            parsed.settings.push((key, value));
        }

        if parsed.positional.len() < 3 {
            return Err("缺少数据源文件".to_string());
        }
        Ok(parsed)
    }
}

fn main() -> ExitCode {
    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{:#}", e), "运行失败");
            eprintln!("运行失败: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> anyhow::Result<ExitCode> {
    let positional = &args.positional;
    let files = SourceFiles::new(&positional[0], &positional[1], &positional[2]);
    let selection: Vec<String> = positional[3..]
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    // 运行目录 + 日志
    let paths = RuntimePaths::create(None, None).context("运行目录创建失败")?;
    logging::init_with_file(&paths.log_file)?;

    info!("==================================================");
    info!("{} {}", APP_NAME, VERSION);
    info!(run_id = %paths.run_id, run_dir = %paths.run_dir.display(), "运行目录已创建");
    info!("==================================================");

    // 运行库
    let inputs = [
        files.ic_inventory.as_path(),
        files.vessels_index.as_path(),
        files.vessels_inventory.as_path(),
    ];
    let fingerprint = compute_input_fingerprint(&inputs).unwrap_or_else(|e| {
        warn!(error = %e, "输入文件指纹计算失败");
        "unavailable".to_string()
    });
    let db_path = paths.db_path();
    initialize_run_database(&db_path, &RunMetadata::new(&paths.run_id, fingerprint))
        .context("运行库初始化失败")?;
    let conn = Arc::new(Mutex::new(open_sqlite_connection(&db_path)?));

    // 命令行选项写入运行库配置
    let config = ConfigManager::from_connection(conn.clone());
    for (key, value) in &args.settings {
        config.set_global_value(key, value)?;
    }

    // 导入
    let ingest_repo = Arc::new(IngestionRepositoryImpl::from_connection(conn.clone()));
    let ingestion = match ingest_excel_files(&files, ingest_repo, Arc::new(paths.clone())) {
        Ok(summary) => summary,
        Err(ImportError::IngestionFatal { message, issues }) => {
            error!(run_id = %paths.run_id, "导入终止: {}", message);
            for issue in &issues {
                error!(
                    run_id = %paths.run_id,
                    row_number = issue.row_number,
                    column_name = issue.column_name.as_deref(),
                    error_type = issue.error_type.as_str(),
                    severity = issue.severity.as_str(),
                    "{}",
                    issue.message
                );
            }
            eprintln!("导入终止: {}", message);
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    // 比对
    let selection = (!selection.is_empty()).then_some(selection.as_slice());
    let runner = ComplianceRunner::new(
        Arc::new(InventoryQueryRepository::from_connection(conn.clone())),
        ConfigManager::from_connection(conn),
    );
    let results = runner.run(selection)?;

    // HTML 报告
    let mut summary = RunSummary::build(&paths.run_id, &ingestion, &results);
    let source_names = inputs
        .iter()
        .map(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.display().to_string())
        })
        .collect();
    let reports = ReportWriter::new(paths.reports_dir(), utc_now_iso(), source_names)
        .write_all(&results, &mut summary)
        .context("HTML 报告写出失败")?;

    // 邮件草稿
    if config.draft_enabled()? {
        let options = EmailDraftOptions::from_config(&config)?;
        let drafting = EmailDrafter::new(paths.emails_dir(), options, &paths.run_id)
            .draft_all(&results, &reports.vessel_reports);
        drafting.record_into(&mut summary);
    }

    // 汇总
    let summary_path = paths.summary_path();
    summary.write_to(&summary_path)?;

    info!(
        run_id = %paths.run_id,
        vessels = summary.vessels_processed,
        issues = summary.total_issues(),
        warnings = ingestion.warnings.len(),
        errors = summary.errors.len(),
        reports = %reports.summary_report.display(),
        summary = %summary_path.display(),
        "运行完成"
    );
    println!("{}", summary_path.display());
    Ok(ExitCode::SUCCESS)
}
