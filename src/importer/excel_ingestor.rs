// ==========================================
// 船舶库存合规系统 - Excel 导入引擎
// ==========================================
// 流程: 打开 → 表头校验 → 逐行校验 → 单事务落库
// 致命错误: 独立事务落库后以 ImportError::IngestionFatal 抛出,
//           抛出前不写任何原始行或目标表行
// 告警: 累积后随数据同一事务落库, 并逐条 warn! 记录
// ==========================================

use crate::domain::ingestion::{IngestionStats, IngestionSummary};
use crate::domain::types::IssueKind;
use crate::domain::validation::ValidationIssue;
use crate::importer::cell::{CellValue, NormalizedRow};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::normalizer::{is_blank, is_empty_row, normalize_cell, normalize_header};
use crate::importer::sheet_spec::{SheetSpec, IC_SPEC, VESSEL_INDEX_SPEC, VESSEL_INVENTORY_SPEC};
use crate::importer::workbook_reader::WorkbookSource;
use crate::paths::RunContext;
use crate::repository::ingestion_repo::{IngestionRepository, SourceBatch};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

// ==========================================
// SourceFiles - 三个固定输入文件
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFiles {
    pub ic_inventory: PathBuf,
    pub vessels_index: PathBuf,
    pub vessels_inventory: PathBuf,
}

impl SourceFiles {
    pub fn new(
        ic_inventory: impl Into<PathBuf>,
        vessels_index: impl Into<PathBuf>,
        vessels_inventory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            ic_inventory: ic_inventory.into(),
            vessels_index: vessels_index.into(),
            vessels_inventory: vessels_inventory.into(),
        }
    }

    /// 按导入顺序排列: 参考目录 → 船舶索引 → 船上库存
    pub fn ordered(&self) -> [(&Path, &'static SheetSpec); 3] {
        [
            (self.ic_inventory.as_path(), &IC_SPEC),
            (self.vessels_index.as_path(), &VESSEL_INDEX_SPEC),
            (self.vessels_inventory.as_path(), &VESSEL_INVENTORY_SPEC),
        ]
    }
}

// ==========================================
// ExcelIngestor - 单数据源导入
// ==========================================
pub struct ExcelIngestor<R, C>
where
    R: IngestionRepository + ?Sized,
    C: RunContext + ?Sized,
{
    repo: Arc<R>,
    context: Arc<C>,
}

impl<R, C> ExcelIngestor<R, C>
where
    R: IngestionRepository + ?Sized,
    C: RunContext + ?Sized,
{
    pub fn new(repo: Arc<R>, context: Arc<C>) -> Self {
        Self { repo, context }
    }

    /// 依次导入三个固定数据源, 遇到第一个致命错误即停止
    pub fn ingest_all(&self, files: &SourceFiles) -> ImportResult<IngestionSummary> {
        let mut results = Vec::with_capacity(3);
        for (path, spec) in files.ordered() {
            results.push(self.ingest(path, spec)?);
        }

        let summary = IngestionSummary::from_results(results);
        info!(
            run_id = %self.context.run_id(),
            warnings = summary.warnings.len(),
            "全部数据源导入完成"
        );
        Ok(summary)
    }

    /// 导入单个工作簿
    ///
    /// # 返回
    /// - Ok(IngestionStats): 行统计 + 告警
    /// - Err(ImportError::IngestionFatal): 文件或表头级致命错误, 携带触发问题
    /// - Err(ImportError::Repository): 落库事务失败
    #[instrument(skip(self, spec), fields(source = spec.source_name))]
    pub fn ingest(&self, path: &Path, spec: &SheetSpec) -> ImportResult<IngestionStats> {
        let source = spec.source_name;
        info!(run_id = %self.context.run_id(), file_path = %path.display(), "开始导入数据源");

        // === 步骤 1: 打开工作簿 ===
        // workbook 在本函数任一返回路径上随作用域释放
        let mut workbook = match WorkbookSource::open(path) {
            Ok(wb) => wb,
            Err(e) => {
                return Err(self.abort(ValidationIssue::fatal(
                    None,
                    None,
                    IssueKind::UnreadableFile,
                    format!("{}: failed to read {}: {}", source, path.display(), e),
                )));
            }
        };

        // === 步骤 2: 至少一个工作表 ===
        if workbook.sheet_count() == 0 {
            return Err(self.abort(ValidationIssue::fatal(
                None,
                None,
                IssueKind::EmptyWorksheet,
                format!("{}: workbook has no worksheets: {}", source, path.display()),
            )));
        }

        let grid = match workbook.first_sheet() {
            Ok(Some(grid)) => grid,
            Ok(None) => {
                return Err(self.abort(ValidationIssue::fatal(
                    None,
                    None,
                    IssueKind::EmptyWorksheet,
                    format!("{}: workbook has no worksheets: {}", source, path.display()),
                )));
            }
            Err(e) => {
                return Err(self.abort(ValidationIssue::fatal(
                    None,
                    None,
                    IssueKind::UnreadableFile,
                    format!("{}: failed to read {}: {}", source, path.display(), e),
                )));
            }
        };

        // === 步骤 3: 表头行 ===
        let Some(header_values) = grid.header_row() else {
            return Err(self.abort(ValidationIssue::fatal(
                None,
                None,
                IssueKind::EmptyWorksheet,
                format!("{}: worksheet is empty in {}", source, path.display()),
            )));
        };

        if header_values.iter().all(is_blank) {
            return Err(self.abort(ValidationIssue::fatal(
                Some(1),
                None,
                IssueKind::MissingHeader,
                format!("{}: missing header row in {}", source, path.display()),
            )));
        }

        // === 步骤 4: 表头规范化 + 重复检测 ===
        let (header_map, mut issues) = build_header_map(&header_values, spec);

        // === 步骤 5: 必需列 ===
        let mut missing_columns: Vec<&str> = spec
            .required_columns
            .iter()
            .copied()
            .filter(|required| !header_map.iter().any(|(h, _)| h == required))
            .collect();
        missing_columns.sort_unstable();
        missing_columns.dedup();

        if !missing_columns.is_empty() {
            issues.extend(missing_columns.iter().map(|column| {
                ValidationIssue::fatal(
                    Some(1),
                    Some(*column),
                    IssueKind::MissingRequiredColumn,
                    format!("{}: missing required column '{}'", source, column),
                )
            }));
            self.log_warnings(source, &issues);
            self.persist_fatal(source, &issues);

            let listed = missing_columns
                .iter()
                .map(|c| format!("'{}'", c))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ImportError::fatal(
                format!("{}: missing required columns [{}]", source, listed),
                issues,
            ));
        }

        // === 步骤 6: 逐行处理 ===
        let width = header_map
            .iter()
            .map(|(_, idx)| idx + 1)
            .max()
            .unwrap_or(0);

        let mut rows_seen = 0usize;
        let mut raw_rows: Vec<(usize, String)> = Vec::new();
        let mut mapped_rows: Vec<Vec<CellValue>> = Vec::new();

        for (row_number, cells) in grid.data_rows(width) {
            rows_seen += 1;
            let row = extract_row(cells, &header_map);

            if is_empty_row(&row) {
                issues.push(ValidationIssue::warning(
                    Some(row_number),
                    None,
                    IssueKind::EmptyRow,
                    format!("{}: empty row {}", source, row_number),
                ));
                continue;
            }

            let missing_keys: Vec<&str> = spec
                .key_columns
                .iter()
                .copied()
                .filter(|key| is_blank(row.get(key)))
                .collect();
            if !missing_keys.is_empty() {
                issues.extend(missing_keys.iter().map(|key| {
                    ValidationIssue::warning(
                        Some(row_number),
                        Some(*key),
                        IssueKind::MissingKeyField,
                        format!("{}: missing key field '{}' on row {}", source, key, row_number),
                    )
                }));
                continue;
            }

            for column in spec.warning_columns {
                if is_blank(row.get(column)) {
                    issues.push(ValidationIssue::warning(
                        Some(row_number),
                        Some(*column),
                        IssueKind::MissingOptionalField,
                        format!(
                            "{}: missing optional field '{}' on row {}",
                            source, column, row_number
                        ),
                    ));
                }
            }

            let row_json =
                row.to_raw_json(source)
                    .map_err(|e| ImportError::RowSerialization {
                        row: row_number,
                        message: e.to_string(),
                    })?;
            raw_rows.push((row_number, row_json));
            mapped_rows.push(spec.map_row(&row));
        }

        debug!(rows_seen, rows_accepted = mapped_rows.len(), "数据行遍历完成");

        // === 步骤 7: 单事务落库 ===
        self.log_warnings(source, &issues);
        self.repo.commit_source_batch(&SourceBatch {
            raw_rows: &raw_rows,
            table_name: spec.table_name,
            columns: spec.table_columns,
            mapped_rows: &mapped_rows,
            issues: &issues,
        })?;

        // === 步骤 8: 统计 ===
        let stats = IngestionStats {
            source_name: source.to_string(),
            file_path: path.to_path_buf(),
            rows_seen,
            rows_inserted: mapped_rows.len(),
            warnings: issues.into_iter().filter(|i| i.is_warning()).collect(),
        };

        info!(
            run_id = %self.context.run_id(),
            rows_seen = stats.rows_seen,
            rows_inserted = stats.rows_inserted,
            warnings = stats.warnings.len(),
            "数据源导入完成"
        );
        Ok(stats)
    }

    /// 单个致命问题: 落库后构造错误
    fn abort(&self, issue: ValidationIssue) -> ImportError {
        let message = issue.message.clone();
        let issues = vec![issue];
        self.persist_fatal(&message, &issues);
        ImportError::fatal(message, issues)
    }

    /// 致命问题尽力落库; 落库失败只记录日志, 不掩盖原始错误
    fn persist_fatal(&self, context: &str, issues: &[ValidationIssue]) {
        if let Err(e) = self.repo.insert_validation_issues(issues) {
            error!(
                run_id = %self.context.run_id(),
                error = %e,
                "致命问题落库失败: {}",
                context
            );
        }
    }

    fn log_warnings(&self, source: &str, issues: &[ValidationIssue]) {
        let run_id = self.context.run_id();
        for issue in issues.iter().filter(|i| i.is_warning()) {
            warn!(
                run_id = %run_id,
                source = source,
                row_number = issue.row_number,
                column_name = issue.column_name.as_deref(),
                error_type = issue.error_type.as_str(),
                "{}",
                issue.message
            );
        }
    }
}

/// 导入三个固定数据源（便捷入口）
pub fn ingest_excel_files<R, C>(
    files: &SourceFiles,
    repo: Arc<R>,
    context: Arc<C>,
) -> ImportResult<IngestionSummary>
where
    R: IngestionRepository + ?Sized,
    C: RunContext + ?Sized,
{
    ExcelIngestor::new(repo, context).ingest_all(files)
}

// ==========================================
// 内部辅助函数
// ==========================================

/// 规范化表头 → (表头名, 列下标) 列表; 重复表头保留第一次出现并告警
fn build_header_map(
    header_values: &[CellValue],
    spec: &SheetSpec,
) -> (Vec<(String, usize)>, Vec<ValidationIssue>) {
    let mut header_map: Vec<(String, usize)> = Vec::new();
    let mut warnings = Vec::new();

    for (idx, cell) in header_values.iter().enumerate() {
        let normalized = normalize_header(cell);
        if normalized.is_empty() {
            continue;
        }
        if header_map.iter().any(|(h, _)| *h == normalized) {
            warnings.push(ValidationIssue::warning(
                Some(1),
                Some(normalized.as_str()),
                IssueKind::DuplicateHeader,
                format!(
                    "{}: duplicate header '{}' uses first occurrence",
                    spec.source_name, normalized
                ),
            ));
            continue;
        }
        header_map.push((normalized, idx));
    }

    (header_map, warnings)
}

/// 按表头映射提取一行; 越界单元格视为 Null
fn extract_row(mut cells: Vec<CellValue>, header_map: &[(String, usize)]) -> NormalizedRow {
    let mut row = NormalizedRow::new();
    for (header, idx) in header_map {
        let value = cells
            .get_mut(*idx)
            .map(std::mem::take)
            .unwrap_or(CellValue::Null);
        row.push(header.clone(), normalize_cell(value));
    }
    row
}
