// ==========================================
// 船舶库存合规系统 - 单元格值与规范化行
// ==========================================
// 职责: calamine 单元格 → CellValue; 保留数值/日期类型供下游使用
// 序列化: 日期/时间 → ISO-8601 字符串 (JSON 与 SQLite 一致)
// ==========================================

use calamine::Data;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::ser::Formatter;
use std::io;

// ==========================================
// CellValue - 单元格值
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// 字符串化（与表格显示一致）; Null → None
    pub fn to_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Int(n) => Some(n.to_string()),
            CellValue::Float(f) => Some(format_float(*f)),
            CellValue::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
            CellValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            CellValue::DateTime(dt) => Some(format_datetime(dt)),
        }
    }
}

/// 整数值浮点保留一位小数 (2.0), 其余按最短表示
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

fn format_datetime(value: &NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

// 整数值浮点按整数处理（xlsx 中数字统一以浮点存储）
fn float_cell(value: f64) -> CellValue {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        CellValue::Int(value as i64)
    } else {
        CellValue::Float(value)
    }
}

fn iso_cell(raw: &str) -> CellValue {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return CellValue::DateTime(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return CellValue::Date(d);
    }
    CellValue::Text(raw.to_string())
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Null,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(n) => CellValue::Int(*n),
            Data::Float(f) => float_cell(*f),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => {
                if dt.is_duration() {
                    return float_cell(dt.as_f64());
                }
                match dt.as_datetime() {
                    Some(v) => CellValue::DateTime(v),
                    None => float_cell(dt.as_f64()),
                }
            }
            Data::DateTimeIso(s) => iso_cell(s),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Text(e.to_string()),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => serializer.serialize_none(),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Int(n) => serializer.serialize_i64(*n),
            CellValue::Float(f) => serializer.serialize_f64(*f),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Date(_) | CellValue::DateTime(_) => {
                serializer.serialize_str(&self.to_text().unwrap_or_default())
            }
        }
    }
}

impl ToSql for CellValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            CellValue::Null => ToSqlOutput::Owned(Value::Null),
            CellValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            CellValue::Int(n) => ToSqlOutput::Owned(Value::Integer(*n)),
            CellValue::Float(f) => ToSqlOutput::Owned(Value::Real(*f)),
            CellValue::Bool(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
            CellValue::Date(_) | CellValue::DateTime(_) => {
                ToSqlOutput::Owned(Value::Text(self.to_text().unwrap_or_default()))
            }
        })
    }
}

// ==========================================
// NormalizedRow - 规范化行 (表头名 → 值, 保持列顺序)
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRow {
    cells: Vec<(String, CellValue)>,
}

static NULL_CELL: CellValue = CellValue::Null;

impl NormalizedRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, header: impl Into<String>, value: CellValue) {
        self.cells.push((header.into(), value));
    }

    /// 按规范化表头取值; 列不存在时视为 Null
    pub fn get(&self, header: &str) -> &CellValue {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v)
            .unwrap_or(&NULL_CELL)
    }

    pub fn values(&self) -> impl Iterator<Item = &CellValue> {
        self.cells.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// 原始审计 JSON: {"source": ..., "row": {...}}
    ///
    /// 分隔符为 ", " / ": "; 非 ASCII 字符输出为 \uXXXX (BMP 以外为代理对)
    pub fn to_raw_json(&self, source_name: &str) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct RawPayload<'a> {
            source: &'a str,
            row: &'a NormalizedRow,
        }

        let mut buf = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, AsciiJsonFormatter);
        RawPayload {
            source: source_name,
            row: self,
        }
        .serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

// ==========================================
// AsciiJsonFormatter - ASCII 转义 JSON 输出
// ==========================================
struct AsciiJsonFormatter;

impl Formatter for AsciiJsonFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                // BMP 外字符按 UTF-16 代理对输出
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

impl Serialize for NormalizedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (header, value) in &self.cells {
            map.serialize_entry(header, value)?;
        }
        map.end()
    }
}
