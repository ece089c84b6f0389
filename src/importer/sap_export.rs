// ==========================================
// 贴片程序核对系统 - SAP 导出文件解析器
// ==========================================
// 格式: 制表符分隔,前 9 行为报表抬头,之后首个非空行为表头
// 列位置: BOM  = [1, 3, 5, 10]
//         MCTO = [1, 4, 6, 11]
// 列名: Object no. / Quantity / Material Description / Reference Designator
// ==========================================
// BOM 号:  料号以 590 开头的行开启一个 BOM 分组
// MCTO 号: 只有料号、无描述/数量/位号的行
// ==========================================

use crate::common::{normalize_identifier, remove_extra_delimiter};
use crate::config::ExclusionRules;
use crate::domain::material::MaterialRow;
use crate::domain::types::MaterialGroup;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::material_source_trait::DataCleaner as DataCleanerTrait;
use csv::ReaderBuilder;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// 报表抬头行数
pub const EXPORT_SKIP_LINES: usize = 9;

pub const COL_OBJECT_NO: &str = "Object no.";
pub const COL_QUANTITY: &str = "Quantity";
pub const COL_DESCRIPTION: &str = "Material Description";
pub const COL_DESIGNATOR: &str = "Reference Designator";

/// BOM 物料号前缀
pub const BOM_ID_PREFIX: &str = "590";

/// MCTO 文件名未带 PV 后缀时的默认 PV
pub const DEFAULT_VARIANT: &str = "1";

// ==========================================
// ExportLayout - 导出文件列布局
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportLayout {
    pub columns: [usize; 4],
}

impl ExportLayout {
    pub const BOM: ExportLayout = ExportLayout {
        columns: [1, 3, 5, 10],
    };
    pub const MCTO: ExportLayout = ExportLayout {
        columns: [1, 4, 6, 11],
    };

    pub fn for_group(group: MaterialGroup) -> Self {
        match group {
            MaterialGroup::Bom => Self::BOM,
            MaterialGroup::Mcto => Self::MCTO,
        }
    }
}

// 按表头名称定位的列下标
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    component: usize,
    quantity: usize,
    description: usize,
    designator: usize,
}

// 清洗前的导出行
#[derive(Debug, Clone, Default)]
struct ExportRecord {
    line: usize,
    scope_id: Option<String>,
    component: Option<String>,
    description: Option<String>,
    quantity: Option<String>,
    designator: Option<String>,
}

// ==========================================
// SapExportParser
// ==========================================
#[derive(Debug, Clone)]
pub struct SapExportParser {
    group: MaterialGroup,
    layout: ExportLayout,
    rules: ExclusionRules,
    cleaner: DataCleaner,
}

impl SapExportParser {
    pub fn new(group: MaterialGroup, rules: ExclusionRules) -> Self {
        Self {
            group,
            layout: ExportLayout::for_group(group),
            rules,
            cleaner: DataCleaner,
        }
    }

    /// 解析单个导出文件
    ///
    /// # 返回
    /// - Ok(Vec<MaterialRow>): 已分组、展开、去重的物料行
    /// - Err(UnexpandedRange): 文件含无法展开的位号区间（调用方整文件跳过）
    /// - Err: 读取失败或表头缺列
    pub fn parse_file(&self, path: &Path) -> ImportResult<Vec<MaterialRow>> {
        let bytes = std::fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes);
        let variant = match self.group {
            MaterialGroup::Mcto => Some(variant_from_file_name(path)),
            MaterialGroup::Bom => None,
        };

        self.parse_content(&content, variant)
            .map_err(|e| match e {
                ImportError::FieldMappingError { row, message } => ImportError::FieldMappingError {
                    row,
                    message: format!("{}: {}", path.display(), message),
                },
                other => other,
            })
    }

    /// 解析导出文本（文件名已解析出 PV）
    pub fn parse_content(&self, content: &str, variant: Option<String>) -> ImportResult<Vec<MaterialRow>> {
        let body: String = content
            .lines()
            .skip(EXPORT_SKIP_LINES)
            .collect::<Vec<_>>()
            .join("\n");

        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(body.as_bytes());

        let mut index: Option<ColumnIndex> = None;
        let mut records = Vec::new();

        for (offset, result) in reader.records().enumerate() {
            let line = EXPORT_SKIP_LINES + offset + 1;
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    warn!(line = line, error = %e, "导出文件行格式错误,已跳过");
                    continue;
                }
            };

            if record.iter().all(|v| v.trim().is_empty()) {
                continue;
            }

            let columns = match index {
                Some(c) => c,
                None => {
                    index = Some(self.resolve_header(&record, line)?);
                    continue;
                }
            };

            let cell = |idx: usize| -> Option<String> {
                record
                    .get(idx)
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            };

            records.push(ExportRecord {
                line,
                scope_id: None,
                component: cell(columns.component).and_then(|v| normalize_identifier(&v)),
                description: cell(columns.description).and_then(|v| normalize_identifier(&v)),
                quantity: cell(columns.quantity),
                designator: cell(columns.designator).and_then(|v| normalize_identifier(&v)),
            });
        }

        if index.is_none() {
            debug!(group = %self.group, "导出文件无表头,视为空文件");
            return Ok(Vec::new());
        }

        let records = self.fill_scope_and_columns(records);
        self.group_rows(records, variant)
    }

    // 在选中列中按表头名称定位字段
    fn resolve_header(&self, header: &csv::StringRecord, line: usize) -> ImportResult<ColumnIndex> {
        let find = |name: &str| -> ImportResult<usize> {
            self.layout
                .columns
                .iter()
                .copied()
                .find(|idx| header.get(*idx).map(str::trim) == Some(name))
                .ok_or_else(|| ImportError::FieldMappingError {
                    row: line,
                    message: format!("表头缺少列 {}（位置 {:?}）", name, self.layout.columns),
                })
        };

        Ok(ColumnIndex {
            component: find(COL_OBJECT_NO)?,
            quantity: find(COL_QUANTITY)?,
            description: find(COL_DESCRIPTION)?,
            designator: find(COL_DESIGNATOR)?,
        })
    }

    // 识别分组号 → 向下填充分组号 → 丢弃无位号行 → 向下填充其余列
    fn fill_scope_and_columns(&self, records: Vec<ExportRecord>) -> Vec<ExportRecord> {
        let mut current_scope: Option<String> = None;
        let mut with_designator = Vec::new();

        for mut record in records {
            let opens_scope = match self.group {
                MaterialGroup::Bom => record
                    .component
                    .as_deref()
                    .map_or(false, |c| c.starts_with(BOM_ID_PREFIX)),
                MaterialGroup::Mcto => {
                    record.component.is_some()
                        && record.description.is_none()
                        && record.quantity.is_none()
                        && record.designator.is_none()
                }
            };
            if opens_scope {
                current_scope = record.component.clone();
            }
            record.scope_id = current_scope.clone();

            if record.designator.is_some() {
                with_designator.push(record);
            }
        }

        let mut previous = ExportRecord::default();
        for record in with_designator.iter_mut() {
            if record.component.is_none() {
                record.component = previous.component.clone();
            }
            if record.description.is_none() {
                record.description = previous.description.clone();
            }
            if record.quantity.is_none() {
                record.quantity = previous.quantity.clone();
            }
            previous = record.clone();
        }

        with_designator
    }

    // 排除规则 → 数量解析 → 按 (分组号, 料号, 描述, 数量) 合并位号 → 展开去重
    fn group_rows(&self, records: Vec<ExportRecord>, variant: Option<String>) -> ImportResult<Vec<MaterialRow>> {
        let mut groups: BTreeMap<(String, String, String, i64), Vec<String>> = BTreeMap::new();

        for record in records {
            let (scope_id, component, description, designator) = match (
                record.scope_id,
                record.component,
                record.description,
                record.designator,
            ) {
                (Some(s), Some(c), Some(d), Some(r)) => (s, c, d, r),
                _ => continue,
            };

            if self.rules.is_excluded(self.group, &component, &description) {
                continue;
            }

            let quantity = match self
                .cleaner
                .parse_export_quantity(record.quantity.as_deref(), record.line)
            {
                Ok(q) => q,
                Err(e) => {
                    warn!(line = record.line, component = %component, error = %e, "数量无法解析,已跳过");
                    continue;
                }
            };

            groups
                .entry((scope_id, component, description, quantity))
                .or_default()
                .push(designator);
        }

        // 分组键唯一,行天然不重复
        let mut rows: Vec<MaterialRow> = Vec::with_capacity(groups.len());
        for ((scope_id, component, description, quantity), designators) in groups {
            let joined = remove_extra_delimiter(&designators.join(","), ',');
            let designator_list = self.cleaner.clean_designators(&joined)?;
            if designator_list.is_empty() {
                continue;
            }

            let row = match self.group {
                MaterialGroup::Bom => MaterialRow {
                    bom_id: Some(scope_id),
                    mcto_id: None,
                    variant: None,
                    component_id: component,
                    component_desc: description,
                    quantity,
                    designator_list,
                },
                MaterialGroup::Mcto => MaterialRow {
                    bom_id: None,
                    mcto_id: Some(scope_id),
                    variant: variant.clone(),
                    component_id: component,
                    component_desc: description,
                    quantity,
                    designator_list,
                },
            };
            rows.push(row);
        }

        Ok(rows)
    }
}

/// 从 MCTO 文件名提取 PV（最后一个 '_' 之后的部分）
///
/// 例: "705043_2.csv" → "2"; "705043.csv" → "1"
pub fn variant_from_file_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|stem| stem.rsplit_once('_'))
        .and_then(|(_, suffix)| normalize_identifier(suffix))
        .unwrap_or_else(|| DEFAULT_VARIANT.to_string())
}
