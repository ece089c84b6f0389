// ==========================================
// 贴片程序核对系统 - 手工导出文件来源
// ==========================================
// SAP_SOURCE = manual
// 目录: BOM_590 / MCTO
// 并发: 每个文件在 blocking 线程池独立解析,按路径顺序合并
// ==========================================

use crate::config::{ExclusionRules, WorkspacePaths};
use crate::domain::material::MaterialRow;
use crate::domain::types::MaterialGroup;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_scanner::scan_export_files;
use crate::importer::material_source_trait::MaterialSource;
use crate::importer::sap_export::SapExportParser;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// ==========================================
// ManualFileSource
// ==========================================
pub struct ManualFileSource {
    bom_dir: PathBuf,
    mcto_dir: PathBuf,
    rules: ExclusionRules,
}

impl ManualFileSource {
    pub fn new(paths: &WorkspacePaths, rules: ExclusionRules) -> Self {
        Self {
            bom_dir: paths.bom_dir(),
            mcto_dir: paths.mcto_dir(),
            rules,
        }
    }

    /// 扫描并并发解析一个分组的导出文件
    ///
    /// # 返回
    /// - Err(NoMatchingFiles): 未找到任何匹配文件
    /// - 单个文件含未展开区间 → 告警并跳过该文件
    async fn load_group(&self, group: MaterialGroup, dir: &Path, ids: &[String]) -> ImportResult<Vec<MaterialRow>> {
        let files = scan_export_files(dir, ids);
        info!(group = %group, dir = %dir.display(), matched = files.len(), "匹配导出文件");

        if files.is_empty() {
            return Err(ImportError::NoMatchingFiles(format!(
                "{} 目录下无匹配文件: {:?}",
                dir.display(),
                ids
            )));
        }

        let tasks = files.iter().cloned().map(|path| {
            let parser = SapExportParser::new(group, self.rules.clone());
            tokio::task::spawn_blocking(move || {
                let result = parser.parse_file(&path);
                (path, result)
            })
        });

        // join_all 保持输入顺序,即路径排序
        let mut rows: Vec<MaterialRow> = Vec::new();
        let mut seen: HashSet<MaterialRow> = HashSet::new();
        for joined in join_all(tasks).await {
            let (path, result) = joined?;
            match result {
                Ok(file_rows) => {
                    info!(file = %path.display(), rows = file_rows.len(), "导出文件读取完成");
                    for row in file_rows {
                        if seen.insert(row.clone()) {
                            rows.push(row);
                        }
                    }
                }
                Err(ImportError::UnexpandedRange(residual)) => {
                    warn!(file = %path.display(), residual = %residual, "位号区间未能展开,跳过该文件");
                }
                Err(ImportError::FieldMappingError { row, message }) => {
                    warn!(file = %path.display(), row = row, message = %message, "导出文件结构不符,跳过该文件");
                }
                Err(e) => return Err(e),
            }
        }

        info!(group = %group, rows = rows.len(), "导出文件合并完成");
        Ok(rows)
    }
}

#[async_trait]
impl MaterialSource for ManualFileSource {
    async fn fetch_bom(&self, bom_ids: &[String]) -> ImportResult<Vec<MaterialRow>> {
        self.load_group(MaterialGroup::Bom, &self.bom_dir, bom_ids)
            .await
    }

    async fn fetch_mcto(&self, mcto_ids: &[String]) -> ImportResult<Vec<MaterialRow>> {
        self.load_group(MaterialGroup::Mcto, &self.mcto_dir, mcto_ids)
            .await
    }

    fn describe(&self) -> String {
        format!(
            "manual(BOM_590={}, MCTO={})",
            self.bom_dir.display(),
            self.mcto_dir.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn bom_export(lines: &[[&str; 4]]) -> String {
        let mut content: String = (1..=9).map(|i| format!("report line {}\n", i)).collect();
        content.push('\n');
        let header = ["Object no.", "Quantity", "Material Description", "Reference Designator"];
        for values in std::iter::once(&header).chain(lines.iter()) {
            // 列: 0..=10,有效列 1/3/5/10
            let mut cols = vec![""; 11];
            cols[1] = values[0];
            cols[3] = values[1];
            cols[5] = values[2];
            cols[10] = values[3];
            content.push_str(&format!("{}\n", cols.join("\t")));
        }
        content
    }

    #[tokio::test]
    async fn test_duplicate_rows_across_files_are_merged() {
        let dir = TempDir::new().unwrap();
        let paths = WorkspacePaths::new(dir.path());
        fs::create_dir_all(paths.bom_dir()).unwrap();

        let content = bom_export(&[
            ["590-624664", "1", "PCBA", ""],
            ["R1", "2", "RES 10K", "R1,R2"],
        ]);
        fs::write(paths.bom_dir().join("590-624664.csv"), &content).unwrap();
        fs::write(paths.bom_dir().join("590-624664_copy.csv"), &content).unwrap();

        let source = ManualFileSource::new(&paths, ExclusionRules::default());
        let rows = source.fetch_bom(&["590-624664".to_string()]).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].component_id, "R1");
        assert_eq!(rows[0].designator_list, vec!["R1", "R2"]);
    }

    #[tokio::test]
    async fn test_no_matching_files_is_error() {
        let dir = TempDir::new().unwrap();
        let paths = WorkspacePaths::new(dir.path());
        fs::create_dir_all(paths.bom_dir()).unwrap();

        let source = ManualFileSource::new(&paths, ExclusionRules::default());
        let result = source.fetch_bom(&["590-624664".to_string()]).await;
        assert!(matches!(result, Err(ImportError::NoMatchingFiles(_))));
    }
}
