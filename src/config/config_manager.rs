// ==========================================
// 农场地块管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope，当前仅 global)
// ==========================================

use crate::config::import_config_trait::{
    ImportConfigReader, DEFAULT_CONFLICT_RETRIES, DEFAULT_DELIMITER, DEFAULT_SKIP_BLANK_ROWS,
};
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::{Arc, Mutex};

type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    // 导入
    pub const IMPORT_DELIMITER: &str = "import_delimiter";
    pub const IMPORT_SKIP_BLANK_ROWS: &str = "import_skip_blank_rows";
    pub const IMPORT_CONFLICT_RETRIES: &str = "import_conflict_retries";

    /// 全部已知键
    pub const ALL: [&str; 3] = [IMPORT_DELIMITER, IMPORT_SKIP_BLANK_ROWS, IMPORT_CONFLICT_RETRIES];
}

/// 配置项（含来源）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub is_default: bool,
}

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
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 写入配置值（存在则覆盖）
    ///
    /// 写入前按键类型校验，非法值拒绝写入
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        validate_config_value(key, value)?;

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"INSERT INTO config_kv (scope_id, key, value, updated_at)
               VALUES ('global', ?1, ?2, datetime('now'))
               ON CONFLICT(scope_id, key) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at"#,
            params![key, value.trim()],
        )?;

        tracing::info!(key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 列出全部已知配置（未覆写的显示默认值）
    pub fn list_configs(&self) -> ConfigResult<Vec<ConfigEntry>> {
        let mut entries = Vec::with_capacity(config_keys::ALL.len());
        for key in config_keys::ALL {
            let entry = match self.get_config_value(key)? {
                Some(value) => ConfigEntry {
                    key: key.to_string(),
                    value,
                    is_default: false,
                },
                None => ConfigEntry {
                    key: key.to_string(),
                    value: default_value(key),
                    is_default: true,
                },
            };
            entries.push(entry);
        }
        Ok(entries)
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }
}

impl ImportConfigReader for ConfigManager {
    fn get_delimiter(&self) -> ConfigResult<u8> {
        let raw = self.get_config_or_default(
            config_keys::IMPORT_DELIMITER,
            &default_value(config_keys::IMPORT_DELIMITER),
        )?;
        parse_delimiter(&raw)
    }

    fn get_skip_blank_rows(&self) -> ConfigResult<bool> {
        match self.get_config_value(config_keys::IMPORT_SKIP_BLANK_ROWS)? {
            Some(raw) => parse_bool(&raw),
            None => Ok(DEFAULT_SKIP_BLANK_ROWS),
        }
    }

    fn get_conflict_retries(&self) -> ConfigResult<u32> {
        match self.get_config_value(config_keys::IMPORT_CONFLICT_RETRIES)? {
            Some(raw) => Ok(raw.trim().parse::<u32>()?),
            None => Ok(DEFAULT_CONFLICT_RETRIES),
        }
    }
}

// ==========================================
// 解析与校验
// ==========================================

fn default_value(key: &str) -> String {
    match key {
        config_keys::IMPORT_DELIMITER => (DEFAULT_DELIMITER as char).to_string(),
        config_keys::IMPORT_SKIP_BLANK_ROWS => DEFAULT_SKIP_BLANK_ROWS.to_string(),
        config_keys::IMPORT_CONFLICT_RETRIES => DEFAULT_CONFLICT_RETRIES.to_string(),
        _ => String::new(),
    }
}

fn validate_config_value(key: &str, value: &str) -> ConfigResult<()> {
    match key {
        config_keys::IMPORT_DELIMITER => parse_delimiter(value).map(|_| ()),
        config_keys::IMPORT_SKIP_BLANK_ROWS => parse_bool(value).map(|_| ()),
        config_keys::IMPORT_CONFLICT_RETRIES => {
            value.trim().parse::<u32>()?;
            Ok(())
        }
        _ => Err(format!("未知配置键: {}", key).into()),
    }
}

/// 分隔符：单个 ASCII 字符，或 "tab" / "\t"
fn parse_delimiter(raw: &str) -> ConfigResult<u8> {
    match raw {
        "tab" | "\\t" | "\t" => return Ok(b'\t'),
        _ => {}
    }
    let bytes = raw.as_bytes();
    if bytes.len() == 1 && bytes[0].is_ascii() && !bytes[0].is_ascii_alphanumeric() {
        Ok(bytes[0])
    } else {
        Err(format!("无效的分隔符: '{}'（需为单个 ASCII 符号）", raw).into())
    }
}

fn parse_bool(raw: &str) -> ConfigResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(format!("无效的布尔值: '{}'", other).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn setup() -> ConfigManager {
        let conn = Arc::new(Mutex::new(open_in_memory().unwrap()));
        ConfigManager::from_connection(conn).unwrap()
    }

    #[test]
    fn test_defaults_without_rows() {
        let config = setup();
        assert_eq!(config.get_delimiter().unwrap(), b',');
        assert!(config.get_skip_blank_rows().unwrap());
        assert_eq!(config.get_conflict_retries().unwrap(), DEFAULT_CONFLICT_RETRIES);
    }

    #[test]
    fn test_set_and_override() {
        let config = setup();
        config.set_config_value(config_keys::IMPORT_DELIMITER, ";").unwrap();
        config.set_config_value(config_keys::IMPORT_CONFLICT_RETRIES, "5").unwrap();
        config.set_config_value(config_keys::IMPORT_SKIP_BLANK_ROWS, "no").unwrap();

        assert_eq!(config.get_delimiter().unwrap(), b';');
        assert_eq!(config.get_conflict_retries().unwrap(), 5);
        assert!(!config.get_skip_blank_rows().unwrap());

        config.set_config_value(config_keys::IMPORT_DELIMITER, "tab").unwrap();
        assert_eq!(config.get_delimiter().unwrap(), b'\t');
    }

    #[test]
    fn test_reject_invalid_values() {
        let config = setup();
        assert!(config.set_config_value(config_keys::IMPORT_DELIMITER, "ab").is_err());
        assert!(config.set_config_value(config_keys::IMPORT_CONFLICT_RETRIES, "-1").is_err());
        assert!(config.set_config_value("unknown_key", "1").is_err());
        assert_eq!(config.get_config_value(config_keys::IMPORT_DELIMITER).unwrap(), None);
    }

    #[test]
    fn test_list_configs_marks_defaults() {
        let config = setup();
        config.set_config_value(config_keys::IMPORT_CONFLICT_RETRIES, "1").unwrap();

        let entries = config.list_configs().unwrap();
        assert_eq!(entries.len(), 3);
        let retries = entries
            .iter()
            .find(|e| e.key == config_keys::IMPORT_CONFLICT_RETRIES)
            .unwrap();
        assert_eq!(retries.value, "1");
        assert!(!retries.is_default);
        assert!(entries
            .iter()
            .filter(|e| e.key != config_keys::IMPORT_CONFLICT_RETRIES)
            .all(|e| e.is_default));
    }
}
