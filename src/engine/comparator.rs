// ==========================================
// 船舶库存合规系统 - 库存比对引擎
// ==========================================
// 红线: 纯计算, 不访问文件或数据库
// ==========================================
// 职责: 船上库存 × 参考目录 → 问题行
// 分类: MISSING_ONBOARD / MISSING_REFERENCE / OUTDATED
// 顺序: 按船上库存迭代顺序输出; 去重保留首次出现
// ==========================================

use crate::domain::inventory::{CompareOptions, InventoryRecord, IssueRow};
use crate::domain::types::IssueType;
use crate::importer::normalizer::{case_fold, normalize_edition};
use std::collections::{HashMap, HashSet};
use tracing::instrument;

/// 船上版本字段优先顺序
const ONBOARD_EDITION_KEYS: &[&str] = &["onboard_edition", "edition"];
/// 参考版本字段优先顺序
const REFERENCE_EDITION_KEYS: &[&str] = &["current_edition", "edition"];

// ==========================================
// InventoryComparator - 库存比对引擎
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryComparator {
    options: CompareOptions,
}

impl InventoryComparator {
    pub fn new(options: CompareOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> CompareOptions {
        self.options
    }

    /// 比对单船库存
    #[instrument(skip(self, onboard_items, reference_items), fields(
        onboard = onboard_items.len(),
        reference = reference_items.len()
    ))]
    pub fn compare(
        &self,
        ship_id: &str,
        onboard_items: &[InventoryRecord],
        reference_items: &[InventoryRecord],
    ) -> Vec<IssueRow> {
        let opts = self.options;

        // 1. 参考索引: 空 key 跳过, 重复 key 以先出现者为准
        let mut reference_by_item: HashMap<String, &InventoryRecord> = HashMap::new();
        for record in reference_items {
            let key = normalize_item(record.get("item"), opts.case_fold_items);
            if key.is_empty() {
                continue;
            }
            reference_by_item.entry(key).or_insert(record);
        }

        // 2. 逐条分类
        let mut issues = Vec::new();
        for record in onboard_items {
            let raw_item = record.get("item");
            let display_item = raw_item.unwrap_or("").trim().to_string();
            let item_key = normalize_item(raw_item, opts.case_fold_items);
            let reference = reference_by_item.get(&item_key).copied();

            let onboard_edition = record.first_present(ONBOARD_EDITION_KEYS);
            let normalized_onboard = normalize_edition(onboard_edition, opts.case_fold_editions);

            // 2a. 船上版本缺失: 不再检查参考目录是否存在
            if normalized_onboard.as_deref().map_or(true, str::is_empty) {
                issues.push(IssueRow {
                    ship_id: ship_id.to_string(),
                    item: display_item,
                    onboard_edition: onboard_edition.map(str::to_string),
                    current_edition: reference
                        .and_then(|r| r.first_present(REFERENCE_EDITION_KEYS))
                        .map(str::to_string),
                    issue_type: IssueType::MissingOnboard,
                });
                continue;
            }

            // 2b. 参考目录中不存在
            let Some(reference) = reference else {
                issues.push(IssueRow {
                    ship_id: ship_id.to_string(),
                    item: display_item,
                    onboard_edition: onboard_edition.map(str::to_string),
                    current_edition: None,
                    issue_type: IssueType::MissingReference,
                });
                continue;
            };

            // 2c. 规范化后比较, 输出原始版本值
            let current_edition = reference.first_present(REFERENCE_EDITION_KEYS);
            let normalized_current = normalize_edition(current_edition, opts.case_fold_editions);
            if normalized_current != normalized_onboard {
                issues.push(IssueRow {
                    ship_id: ship_id.to_string(),
                    item: display_item,
                    onboard_edition: onboard_edition.map(str::to_string),
                    current_edition: current_edition.map(str::to_string),
                    issue_type: IssueType::Outdated,
                });
            }
        }

        // 3. 去重
        if opts.deduplicate {
            dedupe_issues(issues)
        } else {
            issues
        }
    }
}

/// 比对单船库存（便捷入口）
pub fn compare_inventory(
    ship_id: &str,
    onboard_items: &[InventoryRecord],
    reference_items: &[InventoryRecord],
    options: CompareOptions,
) -> Vec<IssueRow> {
    InventoryComparator::new(options).compare(ship_id, onboard_items, reference_items)
}

/// 条目匹配 key: NULL → ""; TRIM; 可选大小写折叠
fn normalize_item(item: Option<&str>, case_fold_enabled: bool) -> String {
    let trimmed = item.unwrap_or("").trim();
    if case_fold_enabled {
        case_fold(trimmed)
    } else {
        trimmed.to_string()
    }
}

/// 按 (item, onboard_edition, issue_type) 去重, 保留首次出现顺序
///
/// key 不含 ship_id: 调用方须保证每次只传入单船数据
fn dedupe_issues(issues: Vec<IssueRow>) -> Vec<IssueRow> {
    let mut seen: HashSet<(String, Option<String>, IssueType)> = HashSet::new();
    issues
        .into_iter()
        .filter(|issue| {
            seen.insert((
                issue.item.clone(),
                issue.onboard_edition.clone(),
                issue.issue_type,
            ))
        })
        .collect()
}
