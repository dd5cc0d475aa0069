// ==========================================
// 船舶库存合规系统 - 报告写出
// ==========================================
// 输出: output/reports/<ship_id>.html + output/reports/run_summary.html
// 单船报告写入失败记入 summary.errors, 不中断其余船舶
// ==========================================

use crate::engine::compliance_runner::VesselComplianceResult;
use crate::engine::summary::{RunSummary, SummaryError};
use crate::report::error::{ReportError, ReportResult};
use crate::report::html::{render_run_summary, render_vessel_report, report_filename};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

pub const RUN_SUMMARY_FILE_NAME: &str = "run_summary.html";
pub const REPORTING_PHASE: &str = "reporting";

/// 报告写出结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOutput {
    /// ship_id → 单船报告路径（仅含写入成功的船舶）
    pub vessel_reports: BTreeMap<String, PathBuf>,
    pub summary_report: PathBuf,
}

// ==========================================
// ReportWriter
// ==========================================
pub struct ReportWriter {
    reports_dir: PathBuf,
    run_timestamp: String,
    source_files: Vec<String>,
}

impl ReportWriter {
    /// # 参数
    /// - reports_dir: 报告目录（不存在时创建）
    /// - run_timestamp: 报告页眉显示的运行时间
    /// - source_files: 报告中列出的数据源文件名
    pub fn new(
        reports_dir: impl Into<PathBuf>,
        run_timestamp: impl Into<String>,
        source_files: Vec<String>,
    ) -> Self {
        Self {
            reports_dir: reports_dir.into(),
            run_timestamp: run_timestamp.into(),
            source_files,
        }
    }

    /// 写出全部单船报告与运行汇总报告
    ///
    /// 成功写入的单船报告文件名回填到 summary 中
    #[instrument(skip(self, results, summary), fields(vessels = results.len()))]
    pub fn write_all(
        &self,
        results: &[VesselComplianceResult],
        summary: &mut RunSummary,
    ) -> ReportResult<ReportOutput> {
        create_dir(&self.reports_dir)?;

        let mut vessel_reports = BTreeMap::new();
        for result in results {
            let filename = report_filename(&result.ship_id);
            let path = self.reports_dir.join(&filename);
            let html = render_vessel_report(result, &self.run_timestamp, &self.source_files);

            match write_file(&path, &html) {
                Ok(()) => {
                    summary.set_report_filename(&result.ship_id, filename);
                    vessel_reports.insert(result.ship_id.clone(), path);
                }
                Err(e) => {
                    warn!(ship_id = %result.ship_id, error = %e, "单船报告写入失败");
                    summary.push_error(SummaryError::new(
                        REPORTING_PHASE,
                        Some(&result.ship_id),
                        e.to_string(),
                        "error",
                    ));
                }
            }
        }

        let summary_report = self.reports_dir.join(RUN_SUMMARY_FILE_NAME);
        write_file(
            &summary_report,
            &render_run_summary(summary, &self.run_timestamp),
        )?;

        info!(
            written = vessel_reports.len(),
            summary_report = %summary_report.display(),
            "HTML 报告写出完成"
        );
        Ok(ReportOutput {
            vessel_reports,
            summary_report,
        })
    }
}

fn create_dir(path: &Path) -> ReportResult<()> {
    fs::create_dir_all(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, contents: &str) -> ReportResult<()> {
    fs::write(path, contents).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ingestion::IngestionSummary;
    use crate::domain::inventory::IssueRow;
    use crate::domain::types::IssueType;
    use tempfile::TempDir;

    fn result(ship_id: &str, issues: Vec<IssueRow>) -> VesselComplianceResult {
        VesselComplianceResult {
            ship_id: ship_id.to_string(),
            ship_name: Some("Alpha".to_string()),
            ship_email: None,
            office_email: None,
            issues,
        }
    }

    fn outdated(ship_id: &str) -> IssueRow {
        IssueRow {
            ship_id: ship_id.to_string(),
            item: "PUB-2".to_string(),
            onboard_edition: Some("A".to_string()),
            current_edition: Some("B".to_string()),
            issue_type: IssueType::Outdated,
        }
    }

    #[test]
    fn test_write_all_creates_reports_and_links_summary() {
        let dir = TempDir::new().unwrap();
        let reports_dir = dir.path().join("output").join("reports");
        let results = vec![result("S1", vec![outdated("S1")]), result("S/2", vec![])];
        let mut summary = RunSummary::build("run", &IngestionSummary::from_results(vec![]), &results);

        let writer = ReportWriter::new(&reports_dir, "2024-01-01T00:00:00Z", vec![]);
        let output = writer.write_all(&results, &mut summary).unwrap();

        assert!(reports_dir.join("S1.html").is_file());
        assert!(reports_dir.join("S2.html").is_file());
        assert_eq!(output.vessel_reports.len(), 2);
        assert_eq!(summary.vessels[1].report_filename.as_deref(), Some("S2.html"));
        assert!(summary.errors.is_empty());

        let html = fs::read_to_string(&output.summary_report).unwrap();
        assert!(html.contains(r#"<a href="S1.html">S1.html</a>"#));
        assert!(html.contains("<strong>Vessels with issues:</strong> 1"));
    }

    #[test]
    fn test_write_failure_is_recorded_and_other_vessels_continue() {
        let dir = TempDir::new().unwrap();
        let reports_dir = dir.path().join("reports");
        // 同名目录占位, 使 S1.html 写入失败
        fs::create_dir_all(reports_dir.join("S1.html")).unwrap();

        let results = vec![result("S1", vec![]), result("S2", vec![])];
        let mut summary = RunSummary::build("run", &IngestionSummary::from_results(vec![]), &results);
        let output = ReportWriter::new(&reports_dir, "ts", vec![])
            .write_all(&results, &mut summary)
            .unwrap();

        assert_eq!(output.vessel_reports.keys().collect::<Vec<_>>(), vec!["S2"]);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].phase, REPORTING_PHASE);
        assert_eq!(summary.errors[0].vessel_id.as_deref(), Some("S1"));
        assert_eq!(summary.vessels[0].report_filename, None);
        assert!(output.summary_report.is_file());
    }
}
