// ==========================================
// 船舶库存合规系统 - 运行汇总
// ==========================================
// 输出: output/summary.json
// ==========================================

use crate::domain::ingestion::IngestionSummary;
use crate::domain::types::IssueType;
use crate::engine::compliance_runner::VesselComplianceResult;
use crate::engine::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VesselSummary {
    pub ship_id: String,
    pub ship_name: Option<String>,
    pub issue_count: usize,
    pub outdated: usize,
    pub missing_onboard: usize,
    pub missing_reference: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub source_name: String,
    pub file_path: PathBuf,
    pub rows_seen: usize,
    pub rows_inserted: usize,
    pub warning_count: usize,
}

// ==========================================
// SummaryError - 报告/草稿阶段的问题记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryError {
    pub phase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vessel_id: Option<String>,
    pub message: String,
    pub severity: String,
}

impl SummaryError {
    pub fn new(
        phase: &str,
        vessel_id: Option<&str>,
        message: impl Into<String>,
        severity: &str,
    ) -> Self {
        Self {
            phase: phase.to_string(),
            vessel_id: vessel_id.map(str::to_string),
            message: message.into(),
            severity: severity.to_string(),
        }
    }
}

// ==========================================
// RunSummary - 一次运行的汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub vessels_processed: usize,
    pub vessels: Vec<VesselSummary>,
    pub ingestion: Vec<SourceSummary>,
    pub errors: Vec<SummaryError>,
}

impl RunSummary {
    pub fn build(
        run_id: &str,
        ingestion: &IngestionSummary,
        results: &[VesselComplianceResult],
    ) -> Self {
        let vessels = results
            .iter()
            .map(|r| VesselSummary {
                ship_id: r.ship_id.clone(),
                ship_name: r.ship_name.clone(),
                issue_count: r.issues.len(),
                outdated: r.count_of(IssueType::Outdated),
                missing_onboard: r.count_of(IssueType::MissingOnboard),
                missing_reference: r.count_of(IssueType::MissingReference),
                report_filename: None,
            })
            .collect::<Vec<_>>();

        let ingestion = ingestion
            .results
            .iter()
            .map(|s| SourceSummary {
                source_name: s.source_name.clone(),
                file_path: s.file_path.clone(),
                rows_seen: s.rows_seen,
                rows_inserted: s.rows_inserted,
                warning_count: s.warnings.len(),
            })
            .collect();

        Self {
            run_id: run_id.to_string(),
            vessels_processed: vessels.len(),
            vessels,
            ingestion,
            errors: Vec::new(),
        }
    }

    /// 追加问题记录; (phase, vessel_id, message, severity) 相同的记录只保留一条
    pub fn push_error(&mut self, entry: SummaryError) {
        if !self.errors.contains(&entry) {
            self.errors.push(entry);
        }
    }

    /// 记录单船报告文件名
    pub fn set_report_filename(&mut self, ship_id: &str, filename: impl Into<String>) {
        if let Some(vessel) = self.vessels.iter_mut().find(|v| v.ship_id == ship_id) {
            vessel.report_filename = Some(filename.into());
        }
    }

    pub fn vessels_with_issues(&self) -> usize {
        self.vessels.iter().filter(|v| v.issue_count > 0).count()
    }

    pub fn total_issues(&self) -> usize {
        self.vessels.iter().map(|v| v.issue_count).sum()
    }

    /// 写入 JSON 文件（覆盖）
    pub fn write_to(&self, path: &Path) -> EngineResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
