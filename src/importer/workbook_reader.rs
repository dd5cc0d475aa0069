// ==========================================
// 船舶库存合规系统 - 工作簿读取
// ==========================================
// 支持: Excel (.xlsx/.xlsm/.xls/.ods), 仅读取第一个工作表
// 约定: 第 1 行为表头, 数据从第 2 行开始 (行号为工作表绝对行号)
// 资源: WorkbookSource 持有文件句柄, 离开作用域即释放
// ==========================================

use crate::importer::cell::CellValue;
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

// ==========================================
// WorkbookSource - 已打开的工作簿
// ==========================================
pub struct WorkbookSource {
    workbook: Sheets<BufReader<File>>,
}

impl WorkbookSource {
    /// 打开工作簿（只读）
    pub fn open(path: &Path) -> Result<Self, calamine::Error> {
        let workbook = open_workbook_auto(path)?;
        Ok(Self { workbook })
    }

    pub fn sheet_count(&self) -> usize {
        self.workbook.sheet_names().len()
    }

    /// 读取第一个工作表; 无工作表时返回 Ok(None)
    pub fn first_sheet(&mut self) -> Result<Option<SheetGrid>, calamine::Error> {
        let sheet_names = self.workbook.sheet_names();
        let Some(first) = sheet_names.first() else {
            return Ok(None);
        };

        let range = self.workbook.worksheet_range(first)?;
        Ok(Some(SheetGrid { range }))
    }
}

// ==========================================
// SheetGrid - 工作表单元格网格
// ==========================================
// calamine 的 Range 只覆盖有数据的矩形区域, 这里按绝对坐标读取,
// 区域外的单元格视为 Null
pub struct SheetGrid {
    range: Range<Data>,
}

impl SheetGrid {
    /// 表头行（第 1 行）; 工作表完全为空时返回 None
    pub fn header_row(&self) -> Option<Vec<CellValue>> {
        let (_, last_col) = self.range.end()?;
        Some(self.read_row(0, last_col as usize + 1))
    }

    /// 表头以下的数据行数
    ///
    /// 计到最后一个含值的行; 末尾只带格式、没有值的行不计入
    pub fn data_row_count(&self) -> usize {
        let Some((start_row, _)) = self.range.start() else {
            return 0;
        };
        self.range
            .rows()
            .enumerate()
            .filter(|(_, row)| row.iter().any(|cell| !matches!(cell, Data::Empty)))
            .map(|(offset, _)| start_row as usize + offset)
            .last()
            .unwrap_or(0)
    }

    /// 逐行读取数据行, 返回 (1 起始行号, 按 `width` 截取的单元格)
    pub fn data_rows(&self, width: usize) -> impl Iterator<Item = (usize, Vec<CellValue>)> + '_ {
        (1..=self.data_row_count()).map(move |row_idx| (row_idx + 1, self.read_row(row_idx, width)))
    }

    fn read_row(&self, row_idx: usize, width: usize) -> Vec<CellValue> {
        (0..width)
            .map(|col_idx| {
                self.range
                    .get_value((row_idx as u32, col_idx as u32))
                    .map(CellValue::from)
                    .unwrap_or(CellValue::Null)
            })
            .collect()
    }
}
