// ==========================================
// 贴片程序核对系统 - 输出层
// ==========================================
// 职责: 程序 DETAIL/SUMMARY 表与核对结果的落地
// ==========================================

pub mod csv_sink;
pub mod memory_sink;
pub mod sink_trait;

pub use csv_sink::CsvReportSink;
pub use memory_sink::{MemoryReportSink, ReportSnapshot};
pub use sink_trait::ReportSink;
