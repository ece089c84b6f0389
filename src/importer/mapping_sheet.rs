// ==========================================
// 贴片程序核对系统 - CHECKER 映射表读取
// ==========================================
// CHECKER.xlsx: 工作表 CHECKER（映射）+ settings（运行配置）
// 或 CHECKER.csv + settings.csv
// 列: BOM, MCTO, PV, PNP_PROGRAM_SIDE1, PNP_PROGRAM_SIDE2
// ==========================================

use crate::common::normalize_identifier;
use crate::config::workspace::{CHECKER_SHEET, SETTINGS_SHEET};
use crate::config::{CheckerSettings, WorkspacePaths};
use crate::domain::mapping::{BoardMapping, BoardMappingTable};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{CsvParser, ExcelParser};
use crate::importer::material_source_trait::FileParser;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub const COL_BOM: &str = "BOM";
pub const COL_MCTO: &str = "MCTO";
pub const COL_PV: &str = "PV";
pub const COL_SIDE1: &str = "PNP_PROGRAM_SIDE1";
pub const COL_SIDE2: &str = "PNP_PROGRAM_SIDE2";

// 映射表文件形态
#[derive(Debug, Clone, PartialEq, Eq)]
enum SheetSource {
    Workbook(PathBuf),
    Csv { checker: PathBuf, settings: PathBuf },
}

// ==========================================
// MappingSheetReader
// ==========================================
#[derive(Debug, Clone)]
pub struct MappingSheetReader {
    source: SheetSource,
}

impl MappingSheetReader {
    /// 定位映射表（优先 CHECKER.xlsx,其次 CHECKER.csv）
    pub fn locate(paths: &WorkspacePaths) -> ImportResult<Self> {
        let workbook = paths.checker_workbook();
        if workbook.exists() {
            return Ok(Self {
                source: SheetSource::Workbook(workbook),
            });
        }

        let checker = paths.checker_csv();
        if checker.exists() {
            return Ok(Self {
                source: SheetSource::Csv {
                    checker,
                    settings: paths.settings_csv(),
                },
            });
        }

        Err(ImportError::FileNotFound(format!(
            "{} / {}",
            workbook.display(),
            checker.display()
        )))
    }

    pub fn describe(&self) -> String {
        match &self.source {
            SheetSource::Workbook(path) => path.display().to_string(),
            SheetSource::Csv { checker, .. } => checker.display().to_string(),
        }
    }

    /// 读取 settings 首行
    ///
    /// settings 工作表/文件缺失时返回默认配置（带告警）
    pub fn read_settings(&self) -> ImportResult<CheckerSettings> {
        let records = match &self.source {
            SheetSource::Workbook(path) => {
                if ExcelParser::has_sheet(path, SETTINGS_SHEET)? {
                    ExcelParser::with_sheet(SETTINGS_SHEET).parse_to_raw_records(path)?
                } else {
                    warn!(file = %path.display(), "未找到 settings 工作表");
                    Vec::new()
                }
            }
            SheetSource::Csv { settings, .. } => {
                if settings.exists() {
                    CsvParser.parse_to_raw_records(settings)?
                } else {
                    warn!(file = %settings.display(), "未找到 settings 文件");
                    Vec::new()
                }
            }
        };

        CheckerSettings::from_sheet_row(records.first())
    }

    /// 读取映射行
    ///
    /// # 规则
    /// - 各列按标识符标准化
    /// - 缺 BOM/MCTO/PV/SIDE1 的行丢弃
    /// - 重复行保留首次出现
    ///
    /// # 返回
    /// - Ok(BoardMappingTable): 可能为空（由调用方判定完整性）
    pub fn read_mapping(&self) -> ImportResult<BoardMappingTable> {
        let records = match &self.source {
            SheetSource::Workbook(path) => {
                ExcelParser::with_sheet(CHECKER_SHEET).parse_to_raw_records(path)?
            }
            SheetSource::Csv { checker, .. } => CsvParser.parse_to_raw_records(checker)?,
        };

        let total = records.len();
        let rows: Vec<BoardMapping> = records.iter().filter_map(mapping_from_record).collect();
        let table = BoardMappingTable::new(rows);

        info!(
            source = %self.describe(),
            total = total,
            kept = table.len(),
            "映射表读取完成"
        );
        debug!(
            boms = ?table.selected_boms(),
            mctos = ?table.selected_mctos(),
            programs = ?table.selected_programs(),
            "选中范围"
        );
        Ok(table)
    }
}

fn mapping_from_record(record: &HashMap<String, String>) -> Option<BoardMapping> {
    let field = |key: &str| record.get(key).and_then(|v| normalize_identifier(v));

    Some(BoardMapping {
        bom_id: field(COL_BOM)?,
        mcto_id: field(COL_MCTO)?,
        variant: field(COL_PV)?,
        program_side1: field(COL_SIDE1)?,
        program_side2: field(COL_SIDE2),
    })
}
