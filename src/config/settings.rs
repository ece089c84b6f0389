// ==========================================
// 贴片程序核对系统 - 运行配置
// ==========================================
// CheckerSettings: settings 表（SAP_SOURCE / LOG_LEVEL）
// DbSettings:      数据库连接（settings.json + 环境变量覆写）
// ==========================================

use crate::domain::types::{DbType, SapSource};
use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    // settings 表列名
    pub const SAP_SOURCE: &str = "SAP_SOURCE";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";

    // 数据库连接环境变量
    pub const ENV_DB_TYPE: &str = "PNP_CHECKER_DB_TYPE";
    pub const ENV_DB_HOST: &str = "PNP_CHECKER_DB_HOST";
    pub const ENV_DB_DATABASE: &str = "PNP_CHECKER_DB_DATABASE";
    pub const ENV_DB_USER: &str = "PNP_CHECKER_DB_USER";
    pub const ENV_DB_PASSWORD: &str = "PNP_CHECKER_DB_PASSWORD";
}

pub const DEFAULT_LOG_LEVEL: &str = "INFO";

// ==========================================
// CheckerSettings - settings 表
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerSettings {
    pub sap_source: SapSource,
    pub log_level: String,
}

impl Default for CheckerSettings {
    fn default() -> Self {
        Self {
            sap_source: SapSource::Manual,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl CheckerSettings {
    /// 从 settings 表首行构造
    ///
    /// # 规则
    /// - SAP_SOURCE 缺失 → manual（告警）
    /// - SAP_SOURCE 非 manual/db → 配置错误
    /// - LOG_LEVEL 缺失 → INFO（告警）
    pub fn from_sheet_row(row: Option<&HashMap<String, String>>) -> ImportResult<Self> {
        let lookup = |key: &str| -> Option<String> {
            row.and_then(|r| r.get(key))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let sap_source = match lookup(config_keys::SAP_SOURCE) {
            Some(value) => value
                .parse::<SapSource>()
                .map_err(|message| ImportError::ConfigValueError {
                    key: config_keys::SAP_SOURCE.to_string(),
                    value: value.clone(),
                    message,
                })?,
            None => {
                warn!("settings 未定义 SAP_SOURCE,使用 manual");
                SapSource::Manual
            }
        };

        let log_level = match lookup(config_keys::LOG_LEVEL) {
            Some(value) => value.to_uppercase(),
            None => {
                warn!("settings 未定义 LOG_LEVEL,使用 INFO");
                DEFAULT_LOG_LEVEL.to_string()
            }
        };

        Ok(Self {
            sap_source,
            log_level,
        })
    }

    /// LOG_LEVEL 转为 EnvFilter 指令（WARNING → warn, CRITICAL → error）
    pub fn filter_directive(&self) -> String {
        match self.log_level.to_uppercase().as_str() {
            "DEBUG" => "debug",
            "WARNING" | "WARN" => "warn",
            "ERROR" | "CRITICAL" => "error",
            "TRACE" => "trace",
            _ => "info",
        }
        .to_string()
    }
}

// ==========================================
// DbSettings - 数据库连接配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbSettings {
    pub db_type: DbType,
    #[serde(default)]
    pub host: String,
    pub database: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
struct DbSettingsFile {
    db_type: Option<DbType>,
    host: Option<String>,
    database: Option<String>,
    user: Option<String>,
    password: Option<String>,
}

impl DbSettings {
    /// 加载数据库配置
    ///
    /// # 优先级
    /// 环境变量 > settings.json > 默认值（sqlite / 空）
    ///
    /// # 返回
    /// - Err: settings.json 格式错误,或 database 未配置
    pub fn load(settings_json: &Path) -> ImportResult<Self> {
        let file: DbSettingsFile = if settings_json.exists() {
            let content = std::fs::read_to_string(settings_json)?;
            serde_json::from_str(&content).map_err(|e| ImportError::ConfigReadError {
                key: settings_json.display().to_string(),
                message: e.to_string(),
            })?
        } else {
            DbSettingsFile::default()
        };

        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        let db_type = match env(config_keys::ENV_DB_TYPE) {
            Some(value) => value
                .parse::<DbType>()
                .map_err(|message| ImportError::ConfigValueError {
                    key: config_keys::ENV_DB_TYPE.to_string(),
                    value: value.clone(),
                    message,
                })?,
            None => file.db_type.unwrap_or(DbType::Sqlite),
        };

        let database = env(config_keys::ENV_DB_DATABASE)
            .or(file.database)
            .ok_or_else(|| ImportError::ConfigReadError {
                key: "database".to_string(),
                message: "SAP_SOURCE=db 需配置 database".to_string(),
            })?;

        let settings = Self {
            db_type,
            host: env(config_keys::ENV_DB_HOST).or(file.host).unwrap_or_default(),
            database,
            user: env(config_keys::ENV_DB_USER).or(file.user).unwrap_or_default(),
            password: env(config_keys::ENV_DB_PASSWORD)
                .or(file.password)
                .unwrap_or_default(),
        };

        info!(
            db_type = %settings.db_type,
            host = %settings.host,
            database = %settings.database,
            "数据库配置已加载"
        );
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_settings_defaults_when_missing() {
        let settings = CheckerSettings::from_sheet_row(None).unwrap();
        assert_eq!(settings, CheckerSettings::default());
    }

    #[test]
    fn test_settings_from_row() {
        let r = row(&[("SAP_SOURCE", "DB"), ("LOG_LEVEL", "debug")]);
        let settings = CheckerSettings::from_sheet_row(Some(&r)).unwrap();
        assert_eq!(settings.sap_source, SapSource::Db);
        assert_eq!(settings.log_level, "DEBUG");
        assert_eq!(settings.filter_directive(), "debug");
    }

    #[test]
    fn test_settings_rejects_unknown_source() {
        let r = row(&[("SAP_SOURCE", "excel")]);
        assert!(CheckerSettings::from_sheet_row(Some(&r)).is_err());
    }

    #[test]
    fn test_warning_level_maps_to_warn() {
        let settings = CheckerSettings {
            sap_source: SapSource::Manual,
            log_level: "WARNING".to_string(),
        };
        assert_eq!(settings.filter_directive(), "warn");
    }

    #[test]
    fn test_db_settings_from_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"db_type": "sqlite", "database": "/tmp/sap.db", "user": "reader"}}"#
        )
        .unwrap();

        let settings = DbSettings::load(file.path()).unwrap();
        assert_eq!(settings.db_type, DbType::Sqlite);
        assert_eq!(settings.user, "reader");
        assert_eq!(settings.host, "");
    }
}
