// ==========================================
// 贴片程序核对系统 - 输出 Trait
// ==========================================
// 用途: 接收程序 DETAIL/SUMMARY 表与最终核对表
// 实现者: CsvReportSink（工作目录 CSV）, MemoryReportSink（测试/嵌入调用）
// ==========================================

use crate::domain::checker::CheckerRow;
use crate::domain::program::{PlacementEvent, PlacementSummary};
use crate::engine::error::CheckerResult;

pub trait ReportSink: Send + Sync {
    /// 写入程序 DETAIL 表
    fn write_program_detail(&self, rows: &[PlacementEvent]) -> CheckerResult<()>;

    /// 写入程序 SUMMARY 表
    fn write_program_summary(&self, rows: &[PlacementSummary]) -> CheckerResult<()>;

    /// 写入核对结果（常规行在前,多贴件行在后）
    fn write_checker(&self, rows: &[CheckerRow]) -> CheckerResult<()>;

    /// 失败时写入仅含表头的核对结果
    fn write_empty_checker(&self) -> CheckerResult<()> {
        self.write_checker(&[])
    }
}
