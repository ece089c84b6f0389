// ==========================================
// 贴片程序核对系统 - 导入层 Trait
// ==========================================
// 职责: 定义物料来源 / 文件解析 / 数据清洗接口（不包含实现）
// ==========================================

use crate::domain::material::MaterialRow;
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

// ==========================================
// MaterialSource Trait
// ==========================================
// 用途: BOM / MCTO 行来源
// 实现者: ManualFileSource（导出文件）, DatabaseSource（SAP 数据库）
#[async_trait]
pub trait MaterialSource: Send + Sync {
    /// 读取 BOM 行
    ///
    /// # 参数
    /// - bom_ids: 已标准化的 BOM 号（映射表选中）
    ///
    /// # 返回
    /// - Ok(Vec<MaterialRow>): bom_id 已填充,位号已展开去重
    /// - Err: 文件/数据库错误,或数据库返回无法展开的位号区间
    async fn fetch_bom(&self, bom_ids: &[String]) -> ImportResult<Vec<MaterialRow>>;

    /// 读取 MCTO 行
    ///
    /// # 参数
    /// - mcto_ids: 已标准化的 MCTO 号（映射表选中）
    ///
    /// # 返回
    /// - Ok(Vec<MaterialRow>): mcto_id + variant 已填充
    async fn fetch_mcto(&self, mcto_ids: &[String]) -> ImportResult<Vec<MaterialRow>>;

    /// 来源描述（日志用）
    fn describe(&self) -> String;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 表格文件解析（映射表 / settings）
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行记录（HashMap<列名, 值>）
    ///
    /// # 参数
    /// - file_path: 文件路径
    ///
    /// # 返回
    /// - Ok(Vec<HashMap<String, String>>): 行记录列表（跳过全空行）
    /// - Err: 文件读取错误、格式错误
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<HashMap<String, String>>>;
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 用途: 字段清洗
// 实现者: DataCleanerImpl
pub trait DataCleaner: Send + Sync {
    /// 标识符标准化（TRIM + UPPER + 去前导零,空值/NAN → None）
    fn clean_identifier(&self, value: &str) -> Option<String>;

    /// 解析导出文件数量
    ///
    /// # 规则
    /// - ',' 视为小数点,只取整数部分
    /// - 空值 → 0
    /// - 非数字 → Err
    fn parse_export_quantity(&self, value: Option<&str>, row: usize) -> ImportResult<i64>;

    /// 数据库数量换算（截断取整; >= 1000 视为盘装,除以 1000）
    ///
    /// # 返回
    /// - Err(QuantityFormatError): 负数或非有限值（NaN / ±inf）
    fn convert_tray_quantity(&self, value: f64, row: usize) -> ImportResult<i64>;

    /// 位号清洗: 合并分隔符 → 区间展开 → 去重
    ///
    /// # 返回
    /// - Ok(Vec<String>): 位号列表
    /// - Err(UnexpandedRange): 残留无法展开的区间
    fn clean_designators(&self, value: &str) -> ImportResult<Vec<String>>;
}
