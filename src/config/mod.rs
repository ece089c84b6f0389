// ==========================================
// 贴片程序核对系统 - 配置层
// ==========================================
// 职责: 运行配置（settings 表 / 数据库连接）、工作目录布局、排除规则
// 覆写: 环境变量 > settings.json > 默认值
// ==========================================

pub mod exclusion;
pub mod settings;
pub mod workspace;

// 重导出核心配置
pub use exclusion::ExclusionRules;
pub use settings::{config_keys, CheckerSettings, DbSettings};
pub use workspace::WorkspacePaths;
