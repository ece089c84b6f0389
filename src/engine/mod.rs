// ==========================================
// 贴片程序核对系统 - 引擎层
// ==========================================
// 职责: 程序规整、物料合并、核对与多贴件检测、流程编排
// 红线: 引擎不做文件/数据库 I/O（编排器除外）,判定必须可解释
// ==========================================

pub mod error;
pub mod extra_parts;
pub mod material_consolidator;
pub mod memory_part;
pub mod orchestrator;
pub mod program_normalizer;
pub mod reconciliation;

// 重导出核心引擎
pub use error::{CheckerError, CheckerResult};
pub use extra_parts::{detect_extra_parts, find_extra_placements};
pub use material_consolidator::{ConsolidatedMaterials, MaterialConsolidator};
pub use memory_part::{remap_memory_component, MemoryRemap};
pub use orchestrator::{CheckerPipeline, RunSummary};
pub use program_normalizer::{ProgramNormalizer, ProgramTables};
pub use reconciliation::{PlacementLookup, Reconciler};
