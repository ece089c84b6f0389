// ==========================================
// 贴片程序核对系统 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 物料数据来源 (SAP_SOURCE)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SapSource {
    Manual, // 手工导出文件（BOM_590 / MCTO 目录）
    Db,     // SAP 数据库直连
}

impl fmt::Display for SapSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SapSource::Manual => write!(f, "manual"),
            SapSource::Db => write!(f, "db"),
        }
    }
}

impl FromStr for SapSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(SapSource::Manual),
            "db" => Ok(SapSource::Db),
            other => Err(format!("未知 SAP_SOURCE: {}", other)),
        }
    }
}

// ==========================================
// 数据库类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    Mysql,
    Mssql,
    Sqlite,
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbType::Mysql => write!(f, "mysql"),
            DbType::Mssql => write!(f, "mssql"),
            DbType::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for DbType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mysql" => Ok(DbType::Mysql),
            "mssql" => Ok(DbType::Mssql),
            "sqlite" => Ok(DbType::Sqlite),
            other => Err(format!("不支持的 db_type: {}（仅支持 mysql/mssql/sqlite）", other)),
        }
    }
}

// ==========================================
// 贴片程序格式
// ==========================================
// .pp7 → http://api.assembleon.com/pp7/v1
// .pp  → http://api.assembleon.com/pp/v2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgramFormat {
    Pp7V1,
    PpV2,
}

impl ProgramFormat {
    /// 按扩展名识别（不区分大小写）
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pp7" => Some(ProgramFormat::Pp7V1),
            "pp" => Some(ProgramFormat::PpV2),
            _ => None,
        }
    }

    pub fn namespace(&self) -> &'static str {
        match self {
            ProgramFormat::Pp7V1 => "http://api.assembleon.com/pp7/v1",
            ProgramFormat::PpV2 => "http://api.assembleon.com/pp/v2",
        }
    }
}

impl fmt::Display for ProgramFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramFormat::Pp7V1 => write!(f, "PP7"),
            ProgramFormat::PpV2 => write!(f, "PP"),
        }
    }
}

// ==========================================
// 物料分组 (BOM / MCTO)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaterialGroup {
    Bom,
    Mcto,
}

impl fmt::Display for MaterialGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterialGroup::Bom => write!(f, "BOM_590"),
            MaterialGroup::Mcto => write!(f, "MCTO"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sap_source_from_str() {
        assert_eq!("Manual".parse::<SapSource>().unwrap(), SapSource::Manual);
        assert_eq!(" db ".parse::<SapSource>().unwrap(), SapSource::Db);
        assert!("excel".parse::<SapSource>().is_err());
    }

    #[test]
    fn test_program_format_from_extension() {
        assert_eq!(ProgramFormat::from_extension("PP7"), Some(ProgramFormat::Pp7V1));
        assert_eq!(ProgramFormat::from_extension("pp"), Some(ProgramFormat::PpV2));
        assert_eq!(ProgramFormat::from_extension("xml"), None);
    }
}
