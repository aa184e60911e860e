// ==========================================
// BolsaGO - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (scope_id = 'global')
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::domain::types::DuplicateAction;
use crate::i18n::SUPPORTED_LOCALES;
use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::field_rules::DEFAULT_MAX_DURATION_MONTHS;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// 默认最大行数
pub const DEFAULT_MAX_ROWS: usize = 5_000;

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
    pub fn new(db_path: &str) -> ImporterResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 会对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ImporterResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ImportError::InternalError(format!("falha ao obter trava: {}", e)))?;
            configure_sqlite_connection(&guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self, key: &str) -> ImporterResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| ImportError::ConfigReadError {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> ImporterResult<Option<String>> {
        let conn = self.get_conn(key)?;

        conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| ImportError::ConfigReadError {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> ImporterResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置（UPSERT）
    ///
    /// 已知键会先校验取值,非法值返回 ConfigValueError
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ImporterResult<()> {
        validate_value(key, value)?;

        let conn = self.get_conn(key)?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )?;

        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON,按键排序）
    pub fn get_config_snapshot(&self) -> ImporterResult<String> {
        let conn = self.get_conn("*")?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let config_map = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<BTreeMap<String, String>>>()?;

        Ok(serde_json::to_string(&config_map)?)
    }
}

// 已知配置键的取值校验
fn validate_value(key: &str, value: &str) -> ImporterResult<()> {
    let invalid = |message: &str| ImportError::ConfigValueError {
        key: key.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    };

    match key {
        config_keys::DEFAULT_DUPLICATE_ACTION => {
            value
                .parse::<DuplicateAction>()
                .map_err(|_| invalid("esperado update ou skip"))?;
        }
        config_keys::MAX_ROWS => {
            value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| invalid("esperado inteiro positivo"))?;
        }
        config_keys::MAX_DURATION_MONTHS => {
            value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| invalid("esperado inteiro positivo"))?;
        }
        config_keys::LOCALE => {
            if !SUPPORTED_LOCALES.contains(&value) {
                return Err(invalid("idioma não suportado"));
            }
        }
        _ => {}
    }
    Ok(())
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
// 存量非法值回退到默认值并记录警告
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_default_duplicate_action(&self) -> ImporterResult<DuplicateAction> {
        let value = self.get_config_or_default(config_keys::DEFAULT_DUPLICATE_ACTION, "skip")?;
        Ok(value.parse::<DuplicateAction>().unwrap_or_else(|_| {
            tracing::warn!(
                config_key = config_keys::DEFAULT_DUPLICATE_ACTION,
                raw_value = %value,
                "重复处理动作配置非法,使用 skip"
            );
            DuplicateAction::Skip
        }))
    }

    async fn get_max_rows(&self) -> ImporterResult<usize> {
        let value = self.get_config_or_default(config_keys::MAX_ROWS, "5000")?;
        Ok(value
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_ROWS))
    }

    async fn get_max_duration_months(&self) -> ImporterResult<u32> {
        let value = self.get_config_or_default(config_keys::MAX_DURATION_MONTHS, "72")?;
        Ok(value
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_DURATION_MONTHS))
    }

    async fn get_locale(&self) -> ImporterResult<String> {
        self.get_config_or_default(config_keys::LOCALE, crate::i18n::DEFAULT_LOCALE)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 导入
    pub const DEFAULT_DUPLICATE_ACTION: &str = "import/default_duplicate_action";
    pub const MAX_ROWS: &str = "import/max_rows";
    pub const MAX_DURATION_MONTHS: &str = "import/max_duration_months";

    // 应用
    pub const LOCALE: &str = "app/locale";
}
