// ==========================================
// 贴片程序核对系统 - 通用工具
// ==========================================
// 职责: 纯函数工具（标识符标准化、位号展开/排序、分隔串去重）
// 红线: 不含 I/O,不含日志
// ==========================================

pub mod designator;
pub mod text;

pub use designator::{
    designator_sort_key, expand_designator_series, has_unexpanded_range, split_designators,
    split_trailing_number,
};
pub use text::{dedupe_delimited, normalize_identifier, remove_extra_delimiter};
