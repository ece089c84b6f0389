// ==========================================
// 贴片程序核对系统 - 核对流程错误类型
// ==========================================
// Integrity: 数据完整性失败（输出空表头,退出码 2）
// 其余:      非预期失败（尽力输出空表头,退出码 1）
// ==========================================

use crate::importer::error::ImportError;
use thiserror::Error;

/// 数据完整性失败退出码
pub const EXIT_INTEGRITY: i32 = 2;
/// 非预期失败退出码
pub const EXIT_UNEXPECTED: i32 = 1;

#[derive(Error, Debug)]
pub enum CheckerError {
    #[error("数据完整性检查失败: {0}")]
    Integrity(String),

    #[error("数据导入失败: {0}")]
    Import(ImportError),

    #[error("输出写入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CheckerError {
    pub fn integrity(message: impl Into<String>) -> Self {
        CheckerError::Integrity(message.into())
    }

    pub fn is_integrity(&self) -> bool {
        matches!(self, CheckerError::Integrity(_))
    }

    /// 进程退出码
    pub fn exit_code(&self) -> i32 {
        if self.is_integrity() {
            EXIT_INTEGRITY
        } else {
            EXIT_UNEXPECTED
        }
    }
}

// 未找到输入文件 / 数据库残留区间 属于完整性失败
impl From<ImportError> for CheckerError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::NoMatchingFiles(_) | ImportError::UnexpandedRange(_) => {
                CheckerError::Integrity(err.to_string())
            }
            other => CheckerError::Import(other),
        }
    }
}

impl From<csv::Error> for CheckerError {
    fn from(err: csv::Error) -> Self {
        CheckerError::Import(ImportError::from(err))
    }
}

impl From<tokio::task::JoinError> for CheckerError {
    fn from(err: tokio::task::JoinError) -> Self {
        CheckerError::Import(ImportError::from(err))
    }
}

/// Result 类型别名
pub type CheckerResult<T> = Result<T, CheckerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_error_classification() {
        let err = CheckerError::from(ImportError::NoMatchingFiles("BOM_590".into()));
        assert!(err.is_integrity());
        assert_eq!(err.exit_code(), 2);

        let err = CheckerError::from(ImportError::UnexpandedRange("R1-C3".into()));
        assert!(err.is_integrity());

        let err = CheckerError::from(ImportError::DatabaseQueryError("timeout".into()));
        assert!(!err.is_integrity());
        assert_eq!(err.exit_code(), 1);
    }
}
