// ==========================================
// 船舶库存合规系统 - 导入层
// ==========================================
// 职责: 三个固定 Excel 数据源 → 校验 → 原始审计行 + 目标表行
// 支持: Excel (.xlsx/.xlsm/.xls/.ods), 仅第一个工作表
// ==========================================

// 模块声明
pub mod cell;
pub mod error;
pub mod excel_ingestor;
pub mod normalizer;
pub mod sheet_spec;
pub mod workbook_reader;

// 重导出核心类型
pub use cell::{CellValue, NormalizedRow};
pub use error::{ImportError, ImportResult};
pub use excel_ingestor::{ingest_excel_files, ExcelIngestor, SourceFiles};
pub use sheet_spec::{SheetSpec, SourceKind, IC_SPEC, VESSEL_INDEX_SPEC, VESSEL_INVENTORY_SPEC};
pub use workbook_reader::{SheetGrid, WorkbookSource};
