// ==========================================
// 贴片程序核对系统 - 核心库
// ==========================================
// 输入: CHECKER 映射表, SAP BOM/MCTO（导出文件或数据库）, 贴片程序 XML
// 输出: 程序 DETAIL/SUMMARY 表, 逐位号核对结果 SCRIPT_OUTPUT
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 通用工具 - 标识符与位号
pub mod common;

// 领域层 - 实体与类型
pub mod domain;

// 配置层 - 运行配置与目录布局
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 导入层 - 外部数据
pub mod importer;

// 引擎层 - 核对算法与流程编排
pub mod engine;

// 输出层
pub mod report;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DbType, MaterialGroup, ProgramFormat, SapSource};

// 领域实体
pub use domain::{
    BoardMapping, BoardMappingTable, CheckerRow, CheckerVerdict, MaterialRow, PlacementEvent,
    PlacementSummary, ProgramQuantityIndex,
};

// 引擎
pub use engine::{
    CheckerError, CheckerPipeline, MaterialConsolidator, ProgramNormalizer, Reconciler,
    RunSummary,
};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "贴片程序核对系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
