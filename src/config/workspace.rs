// ==========================================
// 贴片程序核对系统 - 工作目录布局
// ==========================================
// <base>/BOM_590        BOM 导出文件
// <base>/MCTO           MCTO 导出文件
// <base>/PNP_PROGRAM    贴片程序（.pp / .pp7）
// <base>/CHECKER.xlsx   映射表 + settings（或 CHECKER.csv + settings.csv）
// <base>/settings.json  数据库连接（可选）
// <base>/Log            日志目录
// ==========================================

use std::path::{Path, PathBuf};

pub const BOM_DIR: &str = "BOM_590";
pub const MCTO_DIR: &str = "MCTO";
pub const PROGRAM_DIR: &str = "PNP_PROGRAM";
pub const LOG_DIR: &str = "Log";
pub const LOG_FILE_NAME: &str = "PNP_PROGRAM_CHECKER.log";
pub const CHECKER_WORKBOOK: &str = "CHECKER.xlsx";
pub const CHECKER_CSV: &str = "CHECKER.csv";
pub const SETTINGS_CSV: &str = "settings.csv";
pub const SETTINGS_JSON: &str = "settings.json";
pub const CHECKER_SHEET: &str = "CHECKER";
pub const SETTINGS_SHEET: &str = "settings";

pub const PROGRAM_DETAIL_OUTPUT: &str = "SCRIPT_OUTPUT_PROGRAM_DETAIL.csv";
pub const PROGRAM_SUMMARY_OUTPUT: &str = "SCRIPT_OUTPUT_PROGRAM_SUMMARY.csv";
pub const CHECKER_OUTPUT: &str = "SCRIPT_OUTPUT.csv";

// ==========================================
// WorkspacePaths - 工作目录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePaths {
    base: PathBuf,
}

impl WorkspacePaths {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// 默认工作目录: 可执行文件所在目录,取不到时用当前目录
    pub fn from_executable() -> std::io::Result<Self> {
        let exe = std::env::current_exe()?;
        match exe.parent() {
            Some(dir) => Ok(Self::new(dir)),
            None => Ok(Self::new(std::env::current_dir()?)),
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn bom_dir(&self) -> PathBuf {
        self.base.join(BOM_DIR)
    }

    pub fn mcto_dir(&self) -> PathBuf {
        self.base.join(MCTO_DIR)
    }

    pub fn program_dir(&self) -> PathBuf {
        self.base.join(PROGRAM_DIR)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.base.join(LOG_DIR)
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir().join(LOG_FILE_NAME)
    }

    pub fn checker_workbook(&self) -> PathBuf {
        self.base.join(CHECKER_WORKBOOK)
    }

    pub fn checker_csv(&self) -> PathBuf {
        self.base.join(CHECKER_CSV)
    }

    pub fn settings_csv(&self) -> PathBuf {
        self.base.join(SETTINGS_CSV)
    }

    pub fn settings_json(&self) -> PathBuf {
        self.base.join(SETTINGS_JSON)
    }

    pub fn output_file(&self, name: &str) -> PathBuf {
        self.base.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let paths = WorkspacePaths::new("/work");
        assert_eq!(paths.bom_dir(), PathBuf::from("/work/BOM_590"));
        assert_eq!(
            paths.log_file(),
            PathBuf::from("/work/Log/PNP_PROGRAM_CHECKER.log")
        );
        assert_eq!(
            paths.output_file(CHECKER_OUTPUT),
            PathBuf::from("/work/SCRIPT_OUTPUT.csv")
        );
    }
}
