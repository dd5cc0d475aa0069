// ==========================================
// 船舶库存合规系统 - 合规比对调度
// ==========================================
// 流程: 读取船舶 → (可选) 按选择过滤 → 逐船比对 → 结果落库
// 红线: 比对器每次只接收单船数据（去重 key 不含 ship_id）
// ==========================================

use crate::config::CompareConfigReader;
use crate::domain::inventory::{CompareOptions, IssueRow, VesselRecord};
use crate::domain::types::IssueType;
use crate::engine::comparator::InventoryComparator;
use crate::engine::error::EngineResult;
use crate::repository::InventoryQueryRepository;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

// ==========================================
// VesselComplianceResult - 单船比对结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VesselComplianceResult {
    pub ship_id: String,
    pub ship_name: Option<String>,
    pub ship_email: Option<String>,
    pub office_email: Option<String>,
    pub issues: Vec<IssueRow>,
}

impl VesselComplianceResult {
    pub fn count_of(&self, issue_type: IssueType) -> usize {
        self.issues
            .iter()
            .filter(|i| i.issue_type == issue_type)
            .count()
    }

    pub fn is_compliant(&self) -> bool {
        self.issues.is_empty()
    }
}

// ==========================================
// ComplianceRunner
// ==========================================
pub struct ComplianceRunner<C>
where
    C: CompareConfigReader,
{
    repo: Arc<InventoryQueryRepository>,
    config: C,
}

impl<C> ComplianceRunner<C>
where
    C: CompareConfigReader,
{
    pub fn new(repo: Arc<InventoryQueryRepository>, config: C) -> Self {
        Self { repo, config }
    }

    /// 对全部或选定船舶执行比对
    ///
    /// # 参数
    /// - selection: 选定的 ship_id; None 表示全部船舶, 未知 ship_id 记录告警后忽略
    ///
    /// # 返回
    /// - 每船一条结果, 按 ship_id 排序
    #[instrument(skip(self, selection))]
    pub fn run(&self, selection: Option<&[String]>) -> EngineResult<Vec<VesselComplianceResult>> {
        let options = self.config.compare_options()?;
        let comparator = InventoryComparator::new(options);
        log_options(&options);

        let vessels = select_vessels(self.repo.list_vessels()?, selection);
        let reference = self.repo.list_reference_inventory()?;
        info!(
            vessels = vessels.len(),
            reference_items = reference.len(),
            "开始合规比对"
        );

        let mut results = Vec::with_capacity(vessels.len());
        for vessel in vessels {
            let onboard = self.repo.list_onboard_inventory(&vessel.ship_id)?;
            let issues = comparator.compare(&vessel.ship_id, &onboard, &reference);
            self.repo.insert_compliance_issues(&issues)?;

            info!(
                ship_id = %vessel.ship_id,
                onboard_items = onboard.len(),
                issues = issues.len(),
                "船舶比对完成"
            );

            results.push(VesselComplianceResult {
                ship_id: vessel.ship_id,
                ship_name: vessel.ship_name,
                ship_email: vessel.ship_email,
                office_email: vessel.office_email,
                issues,
            });
        }

        Ok(results)
    }
}

/// 过滤船舶: 重复 ship_id 只保留第一条; 按选择过滤并对未知 ship_id 告警
fn select_vessels(vessels: Vec<VesselRecord>, selection: Option<&[String]>) -> Vec<VesselRecord> {
    let mut seen = HashSet::new();
    let vessels: Vec<VesselRecord> = vessels
        .into_iter()
        .filter(|v| !v.ship_id.trim().is_empty() && seen.insert(v.ship_id.clone()))
        .collect();

    let Some(selection) = selection else {
        return vessels;
    };

    let wanted: HashSet<&str> = selection.iter().map(|s| s.trim()).collect();
    for ship_id in &wanted {
        if !seen.contains(*ship_id) {
            warn!(ship_id = %ship_id, "选定的船舶不存在, 已忽略");
        }
    }

    vessels
        .into_iter()
        .filter(|v| wanted.contains(v.ship_id.as_str()))
        .collect()
}

fn log_options(options: &CompareOptions) {
    debug!(
        case_fold_items = options.case_fold_items,
        case_fold_editions = options.case_fold_editions,
        deduplicate = options.deduplicate,
        "比对选项"
    );
}
