// ==========================================
// 贴片程序核对系统 - CSV 输出
// ==========================================
// SCRIPT_OUTPUT_PROGRAM_DETAIL.csv   程序 DETAIL 表
// SCRIPT_OUTPUT_PROGRAM_SUMMARY.csv  程序 SUMMARY 表
// SCRIPT_OUTPUT.csv                  核对结果（列顺序固定,失败时仅表头）
// ==========================================

use crate::config::workspace::{CHECKER_OUTPUT, PROGRAM_DETAIL_OUTPUT, PROGRAM_SUMMARY_OUTPUT};
use crate::config::WorkspacePaths;
use crate::domain::checker::{CheckerRow, CHECKER_COLUMNS};
use crate::domain::program::{PlacementEvent, PlacementSummary};
use crate::engine::error::CheckerResult;
use crate::report::sink_trait::ReportSink;
use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

pub const PROGRAM_DETAIL_COLUMNS: [&str; 13] = [
    "PROGRAM_NAME",
    "MACHINE",
    "COMPONENT",
    "DESIGNATOR",
    "BOARD_NUMBER",
    "SHAPE",
    "SECTION_NUMBER",
    "FEEDER_NUMBER",
    "LANE_NUMBER",
    "ROBOT_NUMBER",
    "HEAD_NUMBER",
    "FEEDER_TYPE",
    "TROLLEY_TYPE",
];

pub const PROGRAM_SUMMARY_COLUMNS: [&str; 6] = [
    "PROGRAM_NAME",
    "COMPONENT",
    "DESIGNATOR",
    "SHAPE",
    "BOARD_NUMBER",
    "LOCATION",
];

// ==========================================
// CsvReportSink
// ==========================================
#[derive(Debug, Clone)]
pub struct CsvReportSink {
    detail_path: PathBuf,
    summary_path: PathBuf,
    checker_path: PathBuf,
}

impl CsvReportSink {
    pub fn new(paths: &WorkspacePaths) -> Self {
        Self {
            detail_path: paths.output_file(PROGRAM_DETAIL_OUTPUT),
            summary_path: paths.output_file(PROGRAM_SUMMARY_OUTPUT),
            checker_path: paths.output_file(CHECKER_OUTPUT),
        }
    }

    pub fn checker_path(&self) -> &Path {
        &self.checker_path
    }

    // 表头由调用方显式写入,空表也有表头
    fn open(path: &Path, header: &[&str]) -> CheckerResult<Writer<File>> {
        let mut wtr = WriterBuilder::new().has_headers(false).from_path(path)?;
        wtr.write_record(header)?;
        Ok(wtr)
    }
}

impl ReportSink for CsvReportSink {
    fn write_program_detail(&self, rows: &[PlacementEvent]) -> CheckerResult<()> {
        let mut wtr = Self::open(&self.detail_path, &PROGRAM_DETAIL_COLUMNS)?;
        for e in rows {
            wtr.write_record([
                &e.program_name,
                &e.machine_id,
                &e.component_id,
                &e.designator,
                &e.board_number,
                &e.shape,
                &e.section,
                &e.feeder_number,
                &e.lane_number,
                &e.robot_number,
                &e.head_number,
                &e.feeder_type,
                &e.trolley_type,
            ])?;
        }
        wtr.flush()?;

        info!(file = %self.detail_path.display(), rows = rows.len(), "程序 DETAIL 表已写入");
        Ok(())
    }

    fn write_program_summary(&self, rows: &[PlacementSummary]) -> CheckerResult<()> {
        let mut wtr = Self::open(&self.summary_path, &PROGRAM_SUMMARY_COLUMNS)?;
        for s in rows {
            wtr.write_record([
                s.program_name.as_str(),
                s.component_id.as_str(),
                s.designator.as_str(),
                s.shape.as_str(),
                s.board_text().as_str(),
                s.location_text().as_str(),
            ])?;
        }
        wtr.flush()?;

        info!(file = %self.summary_path.display(), rows = rows.len(), "程序 SUMMARY 表已写入");
        Ok(())
    }

    fn write_checker(&self, rows: &[CheckerRow]) -> CheckerResult<()> {
        let mut wtr = Self::open(&self.checker_path, &CHECKER_COLUMNS)?;
        for row in rows {
            wtr.serialize(row.to_record())?;
        }
        wtr.flush()?;

        info!(file = %self.checker_path.display(), rows = rows.len(), "核对结果已写入");
        Ok(())
    }
}
