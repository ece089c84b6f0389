// ==========================================
// 贴片程序核对系统 - 内存输出
// ==========================================
// 用途: 测试与嵌入调用,保留最近一次写入的各表
// ==========================================

use crate::domain::checker::CheckerRow;
use crate::domain::program::{PlacementEvent, PlacementSummary};
use crate::engine::error::CheckerResult;
use crate::report::sink_trait::ReportSink;
use std::sync::{Mutex, MutexGuard};

/// 已写入内容快照
#[derive(Debug, Clone, Default)]
pub struct ReportSnapshot {
    pub program_detail: Option<Vec<PlacementEvent>>,
    pub program_summary: Option<Vec<PlacementSummary>>,
    pub checker: Option<Vec<CheckerRow>>,
}

#[derive(Debug, Default)]
pub struct MemoryReportSink {
    inner: Mutex<ReportSnapshot>,
}

impl MemoryReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ReportSnapshot {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, ReportSnapshot> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ReportSink for MemoryReportSink {
    fn write_program_detail(&self, rows: &[PlacementEvent]) -> CheckerResult<()> {
        self.lock().program_detail = Some(rows.to_vec());
        Ok(())
    }

    fn write_program_summary(&self, rows: &[PlacementSummary]) -> CheckerResult<()> {
        self.lock().program_summary = Some(rows.to_vec());
        Ok(())
    }

    fn write_checker(&self, rows: &[CheckerRow]) -> CheckerResult<()> {
        self.lock().checker = Some(rows.to_vec());
        Ok(())
    }
}
