// ==========================================
// 贴片程序核对系统 - 领域模型层
// ==========================================
// 职责: 定义物料行、板/程序映射、贴装事件、核对结果
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod checker;
pub mod mapping;
pub mod material;
pub mod program;
pub mod types;

// 重导出核心类型
pub use checker::{
    sort_verdicts, BoardSide, CheckerRecord, CheckerRow, CheckerVerdict, CHECKER_COLUMNS,
};
pub use mapping::{BoardMapping, BoardMappingTable, MaterialScope};
pub use material::{ExpandedMaterial, MappedMaterial, MaterialRow, ScopedMaterial};
pub use program::{
    BoardComponent, FeederLane, PickAction, PlacementEvent, PlacementSummary, ProgramFile,
    ProgramQuantityIndex,
};
pub use types::{DbType, MaterialGroup, ProgramFormat, SapSource};
