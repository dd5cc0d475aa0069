// ==========================================
// 船舶库存合规系统 - 比对配置读取 Trait
// ==========================================
// 职责: 定义比对引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::error::ConfigResult;
use crate::domain::inventory::CompareOptions;

// ==========================================
// CompareConfigReader Trait
// ==========================================
// 用途: 比对引擎所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait CompareConfigReader {
    /// 条目匹配是否忽略大小写
    ///
    /// # 默认值
    /// - true
    fn case_fold_items(&self) -> ConfigResult<bool>;

    /// 版本比较是否忽略大小写
    ///
    /// # 默认值
    /// - false
    fn case_fold_editions(&self) -> ConfigResult<bool>;

    /// 是否对问题行去重
    ///
    /// # 默认值
    /// - true
    fn deduplicate(&self) -> ConfigResult<bool>;

    /// 汇总为 CompareOptions
    fn compare_options(&self) -> ConfigResult<CompareOptions> {
        Ok(CompareOptions {
            case_fold_items: self.case_fold_items()?,
            case_fold_editions: self.case_fold_editions()?,
            deduplicate: self.deduplicate()?,
        })
    }
}

/// 固定选项（不读取存储）
impl CompareConfigReader for CompareOptions {
    fn case_fold_items(&self) -> ConfigResult<bool> {
        Ok(self.case_fold_items)
    }

    fn case_fold_editions(&self) -> ConfigResult<bool> {
        Ok(self.case_fold_editions)
    }

    fn deduplicate(&self) -> ConfigResult<bool> {
        Ok(self.deduplicate)
    }
}
