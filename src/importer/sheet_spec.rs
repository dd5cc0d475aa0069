// ==========================================
// 船舶库存合规系统 - 数据源规格注册表
// ==========================================
// 职责: 三个固定输入表的声明式描述
//       (必需列 / 主键列 / 告警列 / 目标表 / 行映射)
// 红线: 静态定义, 运行期不可修改; 行映射为纯函数
// ==========================================

use crate::importer::cell::{CellValue, NormalizedRow};

// ==========================================
// 目标表
// ==========================================
pub const TABLE_IC_INVENTORY: &str = "ic_inventory_row";
pub const TABLE_VESSEL: &str = "vessel";
pub const TABLE_VESSEL_INVENTORY: &str = "vessel_inventory_row";

// ==========================================
// SourceKind - 数据源类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    IcInventory,     // 参考目录 (IC inventory)
    VesselIndex,     // 船舶索引
    VesselInventory, // 船上库存
}

// ==========================================
// SheetSpec - 单个数据源的导入规格
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetSpec {
    pub kind: SourceKind,
    pub source_name: &'static str,
    pub required_columns: &'static [&'static str],
    pub key_columns: &'static [&'static str],
    pub warning_columns: &'static [&'static str],
    pub table_name: &'static str,
    /// 目标表列名, 与 `map_row` 返回值一一对应
    pub table_columns: &'static [&'static str],
}

pub const IC_SPEC: SheetSpec = SheetSpec {
    kind: SourceKind::IcInventory,
    source_name: "safe_ic_inventory",
    required_columns: &[
        "item", "itmdesc", "plinid", "itmclss", "upccode", "edition", "currdate",
    ],
    key_columns: &["item"],
    warning_columns: &[],
    table_name: TABLE_IC_INVENTORY,
    table_columns: &["item", "current_edition", "description", "current_date"],
};

pub const VESSEL_INDEX_SPEC: SheetSpec = SheetSpec {
    kind: SourceKind::VesselIndex,
    source_name: "safe_vessels_index",
    required_columns: &[
        "shipid", "shipname", "custno", "imono", "shipstat", "email", "note1", "note2", "note3",
    ],
    key_columns: &["shipid"],
    warning_columns: &["email"],
    table_name: TABLE_VESSEL,
    table_columns: &[
        "ship_id",
        "ship_name",
        "customer_no",
        "imo_no",
        "ship_status",
        "ship_email",
        "office_email",
        "ams",
    ],
};

pub const VESSEL_INVENTORY_SPEC: SheetSpec = SheetSpec {
    kind: SourceKind::VesselInventory,
    source_name: "safe_vessels_inventory",
    required_columns: &[
        "shipid", "shipname", "custno", "item", "edition", "storeedt", "descrip",
    ],
    key_columns: &["shipid", "item"],
    warning_columns: &[],
    table_name: TABLE_VESSEL_INVENTORY,
    table_columns: &[
        "ship_id",
        "item",
        "onboard_edition",
        "store_edition",
        "description",
    ],
};

impl SourceKind {
    pub fn spec(&self) -> &'static SheetSpec {
        match self {
            SourceKind::IcInventory => &IC_SPEC,
            SourceKind::VesselIndex => &VESSEL_INDEX_SPEC,
            SourceKind::VesselInventory => &VESSEL_INVENTORY_SPEC,
        }
    }
}

impl SheetSpec {
    /// 规范化行 → 目标表行（按 `table_columns` 顺序）
    pub fn map_row(&self, row: &NormalizedRow) -> Vec<CellValue> {
        let col = |name: &str| row.get(name).clone();

        match self.kind {
            SourceKind::IcInventory => vec![
                col("item"),
                col("edition"),
                col("itmdesc"),
                col("currdate"),
            ],
            SourceKind::VesselIndex => vec![
                col("shipid"),
                col("shipname"),
                col("custno"),
                col("imono"),
                col("shipstat"),
                col("email"),
                CellValue::Null, // office_email: 索引表不提供
                CellValue::Null, // ams: 索引表不提供
            ],
            SourceKind::VesselInventory => vec![
                col("shipid"),
                col("item"),
                col("edition"),
                col("storeedt"),
                col("descrip"),
            ],
        }
    }
}
