// ==========================================
// 船舶库存合规系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::compare_config_trait::CompareConfigReader;
use crate::config::email_config_trait::{EmailConfigReader, DEFAULT_SUBJECT_TEMPLATE};
use crate::config::error::{ConfigError, ConfigResult};
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> ConfigResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// global scope 全部配置, 按 key 排序
    pub fn get_config_snapshot(&self) -> ConfigResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshot = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    /// 读取布尔配置; 不存在时返回默认值
    fn get_bool_or_default(&self, key: &str, default: bool) -> ConfigResult<bool> {
        match self.get_global_value(key)? {
            Some(value) => parse_bool(key, &value),
            None => Ok(default),
        }
    }

    /// 读取文本配置; 不存在或为空白时返回 None
    fn get_text(&self, key: &str) -> ConfigResult<Option<String>> {
        Ok(self
            .get_global_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }
}

impl CompareConfigReader for ConfigManager {
    fn case_fold_items(&self) -> ConfigResult<bool> {
        self.get_bool_or_default(config_keys::CASE_FOLD_ITEMS, true)
    }

    fn case_fold_editions(&self) -> ConfigResult<bool> {
        self.get_bool_or_default(config_keys::CASE_FOLD_EDITIONS, false)
    }

    fn deduplicate(&self) -> ConfigResult<bool> {
        self.get_bool_or_default(config_keys::DEDUPLICATE, true)
    }
}

impl EmailConfigReader for ConfigManager {
    fn draft_enabled(&self) -> ConfigResult<bool> {
        self.get_bool_or_default(config_keys::EMAIL_DRAFT_ENABLED, false)
    }

    fn subject_template(&self) -> ConfigResult<String> {
        Ok(self
            .get_text(config_keys::EMAIL_SUBJECT_TEMPLATE)?
            .unwrap_or_else(|| DEFAULT_SUBJECT_TEMPLATE.to_string()))
    }

    fn default_office_email(&self) -> ConfigResult<Option<String>> {
        self.get_text(config_keys::EMAIL_DEFAULT_OFFICE)
    }

    fn from_address(&self) -> ConfigResult<Option<String>> {
        self.get_text(config_keys::EMAIL_FROM)
    }
}

/// 解析布尔配置值: 1/0/true/false/yes/no（忽略大小写与首尾空白）
fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            expected: "1/0/true/false/yes/no",
        }),
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 比对选项
    pub const CASE_FOLD_ITEMS: &str = "compare.case_fold_items";
    pub const CASE_FOLD_EDITIONS: &str = "compare.case_fold_editions";
    pub const DEDUPLICATE: &str = "compare.deduplicate";

    // 邮件草稿
    pub const EMAIL_DRAFT_ENABLED: &str = "email.draft_enabled";
    pub const EMAIL_SUBJECT_TEMPLATE: &str = "email.subject_template";
    pub const EMAIL_DEFAULT_OFFICE: &str = "email.default_office_email";
    pub const EMAIL_FROM: &str = "email.from_address";
}
