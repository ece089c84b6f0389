// ==========================================
// 贴片程序核对系统 - 核对流程编排器
// ==========================================
// 步骤1: 读取映射表与 settings
// 步骤2: 贴片程序解析 + 规整,写出程序 DETAIL/SUMMARY
// 步骤3: 读取 BOM / MCTO（手工导出文件或 SAP 数据库）
// 步骤4: 物料合并（范围关联 / 料号重映射 / 位号展开）
// 步骤5: 核对（数量 + 逐位号）
// 步骤6: 多贴件检测
// 步骤7: 写出核对结果
// 任一步骤失败: 写出仅含表头的 SCRIPT_OUTPUT.csv
// ==========================================

use crate::config::{CheckerSettings, DbSettings, ExclusionRules, WorkspacePaths};
use crate::domain::checker::CheckerRow;
use crate::domain::mapping::BoardMappingTable;
use crate::domain::material::MaterialRow;
use crate::domain::types::SapSource;
use crate::engine::error::{CheckerError, CheckerResult};
use crate::engine::extra_parts::detect_extra_parts;
use crate::engine::material_consolidator::MaterialConsolidator;
use crate::engine::program_normalizer::{ProgramNormalizer, ProgramTables};
use crate::engine::reconciliation::Reconciler;
use crate::importer::{
    parse_program_files, scan_program_files, DatabaseSource, ImportError, ManualFileSource,
    MappingSheetReader, MaterialSource,
};
use crate::report::ReportSink;
use chrono::{DateTime, Local};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

// ==========================================
// RunSummary - 运行摘要
// ==========================================
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub sap_source: SapSource,
    pub mapping_rows: usize,
    pub bom_rows: usize,
    pub mcto_rows: usize,
    pub program_files: usize,
    pub placement_events: usize,
    pub checker_rows: usize,
    pub extra_rows: usize,
}

impl RunSummary {
    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

// 单次运行的中间计数
#[derive(Debug, Default)]
struct RunCounts {
    bom_rows: usize,
    mcto_rows: usize,
    program_files: usize,
    placement_events: usize,
    checker_rows: usize,
    extra_rows: usize,
}

// ==========================================
// CheckerPipeline - 核对流程
// ==========================================
pub struct CheckerPipeline {
    paths: WorkspacePaths,
    rules: ExclusionRules,
    normalizer: ProgramNormalizer,
    consolidator: MaterialConsolidator,
}

impl CheckerPipeline {
    pub fn new(paths: WorkspacePaths) -> Self {
        Self {
            paths,
            rules: ExclusionRules::default(),
            normalizer: ProgramNormalizer::new(),
            consolidator: MaterialConsolidator::new(),
        }
    }

    pub fn with_rules(mut self, rules: ExclusionRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn paths(&self) -> &WorkspacePaths {
        &self.paths
    }

    /// 预读 settings（日志初始化前调用,失败时返回默认配置）
    pub fn preload_settings(paths: &WorkspacePaths) -> CheckerSettings {
        MappingSheetReader::locate(paths)
            .and_then(|reader| reader.read_settings())
            .unwrap_or_default()
    }

    /// 执行完整核对流程
    ///
    /// # 返回
    /// - Ok(RunSummary): 三个输出文件均已写出
    /// - Err: 已尽力写出仅含表头的核对结果
    pub async fn run(&self, sink: &dyn ReportSink) -> CheckerResult<RunSummary> {
        let run_id = Uuid::new_v4().to_string();
        info!(run_id = %run_id, base = %self.paths.base().display(), "开始执行核对流程");

        match self.run_steps(run_id.clone(), sink).await {
            Ok(summary) => {
                info!(
                    run_id = %summary.run_id,
                    checker_rows = summary.checker_rows,
                    extra_rows = summary.extra_rows,
                    elapsed_ms = summary.elapsed_ms(),
                    "核对流程完成"
                );
                Ok(summary)
            }
            Err(e) => {
                if e.is_integrity() {
                    error!(run_id = %run_id, error = %e, "数据完整性检查失败,输出空结果");
                } else {
                    error!(run_id = %run_id, error = ?e, "核对流程异常终止,输出空结果");
                }
                if let Err(write_err) = sink.write_empty_checker() {
                    error!(run_id = %run_id, error = %write_err, "空结果写出失败");
                }
                Err(e)
            }
        }
    }

    async fn run_steps(&self, run_id: String, sink: &dyn ReportSink) -> CheckerResult<RunSummary> {
        let started_at = Local::now();

        // ==========================================
        // 步骤1: 映射表与 settings
        // ==========================================
        debug!("步骤1: 读取映射表");
        let reader = MappingSheetReader::locate(&self.paths)?;
        let settings = reader.read_settings()?;
        let mapping = reader.read_mapping()?;
        if mapping.is_empty() {
            return Err(CheckerError::integrity(format!(
                "映射表无有效行: {}",
                reader.describe()
            )));
        }
        info!(
            sap_source = %settings.sap_source,
            mapping_rows = mapping.len(),
            "映射表读取完成"
        );

        // ==========================================
        // 步骤2 ~ 7
        // ==========================================
        let counts = match settings.sap_source {
            SapSource::Manual => {
                let source = ManualFileSource::new(&self.paths, self.rules.clone());
                self.check(&mapping, &source, sink).await?
            }
            SapSource::Db => {
                let db_settings = DbSettings::load(&self.paths.settings_json())?;
                let source = DatabaseSource::connect(&db_settings, self.rules.clone())?;
                let result = self.check(&mapping, &source, sink).await;
                if let Err(e) = source.close() {
                    warn!(error = %e, "数据库连接关闭失败");
                }
                result?
            }
        };

        Ok(RunSummary {
            run_id,
            started_at,
            finished_at: Local::now(),
            sap_source: settings.sap_source,
            mapping_rows: mapping.len(),
            bom_rows: counts.bom_rows,
            mcto_rows: counts.mcto_rows,
            program_files: counts.program_files,
            placement_events: counts.placement_events,
            checker_rows: counts.checker_rows,
            extra_rows: counts.extra_rows,
        })
    }

    /// 对给定映射表与物料来源执行 步骤2 ~ 7
    async fn check(
        &self,
        mapping: &BoardMappingTable,
        source: &dyn MaterialSource,
        sink: &dyn ReportSink,
    ) -> CheckerResult<RunCounts> {
        // 程序与物料相互独立,并发读取
        let (programs, (bom_rows, mcto_rows)) =
            tokio::try_join!(self.load_programs(mapping), self.load_materials(mapping, source))?;

        debug!("步骤2: 写出程序 DETAIL/SUMMARY");
        sink.write_program_detail(&programs.tables.detail)?;
        sink.write_program_summary(&programs.tables.summary)?;

        debug!("步骤4: 物料合并");
        let materials = self.consolidator.consolidate(mapping, &bom_rows, &mcto_rows)?;

        debug!("步骤5: 数量与位号核对");
        let reconciler = Reconciler::new(&programs.tables.summary, &programs.tables.quantity_index);
        let mut rows: Vec<CheckerRow> = reconciler.reconcile(&materials.mapped);
        let regular = rows.len();

        debug!("步骤6: 多贴件检测");
        let extras = detect_extra_parts(
            &reconciler,
            mapping,
            &programs.tables.summary,
            &materials.expanded,
        );
        let extra_rows = extras.len();
        rows.extend(extras);

        debug!("步骤7: 写出核对结果");
        sink.write_checker(&rows)?;

        Ok(RunCounts {
            bom_rows: bom_rows.len(),
            mcto_rows: mcto_rows.len(),
            program_files: programs.file_count,
            placement_events: programs.tables.detail.len(),
            checker_rows: regular,
            extra_rows,
        })
    }

    // 步骤2: 扫描并解析贴片程序
    async fn load_programs(&self, mapping: &BoardMappingTable) -> CheckerResult<LoadedPrograms> {
        debug!("步骤2: 解析贴片程序");
        let programs = mapping.selected_programs();
        let paths = scan_program_files(&self.paths.program_dir(), &programs);
        info!(programs = ?programs, matched = paths.len(), "匹配贴片程序文件");

        if paths.is_empty() {
            return Err(ImportError::NoMatchingFiles(format!(
                "{} 目录下无匹配程序文件: {:?}",
                self.paths.program_dir().display(),
                programs
            ))
            .into());
        }

        let files = parse_program_files(paths).await?;
        if files.is_empty() {
            return Err(CheckerError::integrity("贴片程序文件全部解析失败"));
        }

        let tables = self.normalizer.normalize(&files)?;
        Ok(LoadedPrograms {
            file_count: files.len(),
            tables,
        })
    }

    // 步骤3: 读取 BOM / MCTO
    async fn load_materials(
        &self,
        mapping: &BoardMappingTable,
        source: &dyn MaterialSource,
    ) -> CheckerResult<(Vec<MaterialRow>, Vec<MaterialRow>)> {
        debug!(source = %source.describe(), "步骤3: 读取 BOM / MCTO");
        let boms = mapping.selected_boms();
        let mctos = mapping.selected_mctos();

        let (bom_rows, mcto_rows) = tokio::try_join!(source.fetch_bom(&boms), source.fetch_mcto(&mctos))?;
        info!(bom_rows = bom_rows.len(), mcto_rows = mcto_rows.len(), "物料行读取完成");
        Ok((bom_rows, mcto_rows))
    }
}

// 步骤2 输出
struct LoadedPrograms {
    file_count: usize,
    tables: ProgramTables,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MemoryReportSink;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_mapping_sheet_is_unexpected_failure() {
        let dir = TempDir::new().unwrap();
        let pipeline = CheckerPipeline::new(WorkspacePaths::new(dir.path()));
        let sink = MemoryReportSink::new();

        let err = pipeline.run(&sink).await.unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert_eq!(sink.snapshot().checker, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_empty_mapping_is_integrity_failure() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("CHECKER.csv"),
            "BOM,MCTO,PV,PNP_PROGRAM_SIDE1,PNP_PROGRAM_SIDE2\n,,,,\n",
        )
        .unwrap();
        let pipeline = CheckerPipeline::new(WorkspacePaths::new(dir.path()));
        let sink = MemoryReportSink::new();

        let err = pipeline.run(&sink).await.unwrap_err();
        assert!(err.is_integrity());
        assert_eq!(sink.snapshot().checker, Some(Vec::new()));
    }

    #[test]
    fn test_preload_settings_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = CheckerPipeline::preload_settings(&WorkspacePaths::new(dir.path()));
        assert_eq!(settings.sap_source, SapSource::Manual);
    }
}
