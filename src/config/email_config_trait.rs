// ==========================================
// 船舶库存合规系统 - 邮件草稿配置读取 Trait
// ==========================================
// 职责: 定义邮件草稿所需的配置读取接口（不包含实现）
// ==========================================

use crate::config::error::ConfigResult;

/// 默认邮件主题模板, 支持 {SHIPID} / {SHIPNAME} / {RUN_ID}
pub const DEFAULT_SUBJECT_TEMPLATE: &str = "Inventory Compliance - {SHIPNAME}";

// ==========================================
// EmailConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait EmailConfigReader {
    /// 是否生成 .eml 草稿
    ///
    /// # 默认值
    /// - false
    fn draft_enabled(&self) -> ConfigResult<bool>;

    /// 主题模板（默认 DEFAULT_SUBJECT_TEMPLATE）
    fn subject_template(&self) -> ConfigResult<String>;

    /// 船舶未登记办公室邮箱时使用的默认地址
    fn default_office_email(&self) -> ConfigResult<Option<String>>;

    /// 草稿 From 头
    fn from_address(&self) -> ConfigResult<Option<String>>;
}
