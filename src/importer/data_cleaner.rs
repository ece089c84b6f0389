// ==========================================
// 贴片程序核对系统 - 数据清洗器实现
// ==========================================
// 职责: 标识符标准化 / 数量解析 / 盘装换算 / 位号展开去重
// ==========================================

use crate::common::{
    dedupe_delimited, expand_designator_series, has_unexpanded_range, normalize_identifier,
    split_designators,
};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::material_source_trait::DataCleaner as DataCleanerTrait;

/// 盘装数量阈值（>= 该值按千个/盘换算）
pub const TRAY_QUANTITY_THRESHOLD: i64 = 1000;

#[derive(Debug, Clone, Copy, Default)]
pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn clean_identifier(&self, value: &str) -> Option<String> {
        normalize_identifier(value)
    }

    fn parse_export_quantity(&self, value: Option<&str>, row: usize) -> ImportResult<i64> {
        let raw = match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => v.replace(',', "."),
            None => return Ok(0),
        };

        let integer_part = raw.split('.').next().unwrap_or("").trim();
        if integer_part.is_empty() {
            return Ok(0);
        }

        integer_part
            .parse::<i64>()
            .ok()
            .filter(|q| *q >= 0)
            .ok_or(ImportError::QuantityFormatError { row, value: raw })
    }

    fn convert_tray_quantity(&self, value: f64, row: usize) -> ImportResult<i64> {
        if !value.is_finite() || value < 0.0 {
            return Err(ImportError::QuantityFormatError {
                row,
                value: value.to_string(),
            });
        }

        let quantity = value.trunc() as i64;
        Ok(if quantity >= TRAY_QUANTITY_THRESHOLD {
            quantity / TRAY_QUANTITY_THRESHOLD
        } else {
            quantity
        })
    }

    fn clean_designators(&self, value: &str) -> ImportResult<Vec<String>> {
        let expanded = expand_designator_series(&value.to_uppercase());
        if has_unexpanded_range(&expanded) {
            return Err(ImportError::UnexpandedRange(expanded));
        }
        Ok(split_designators(&dedupe_delimited(&expanded, ",")))
    }
}

impl DataCleaner {
    /// 清洗可选字段（空值 → None）
    pub fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| self.clean_identifier(v))
    }
}
