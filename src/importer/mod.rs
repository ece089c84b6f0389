// ==========================================
// 贴片程序核对系统 - 导入层
// ==========================================
// 职责: 外部数据读取,生成领域数据
// 支持: CHECKER 映射表（xlsx/csv）, SAP 导出文件, SAP 数据库, 贴片程序 XML
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod db_source;
pub mod error;
pub mod file_parser;
pub mod file_scanner;
pub mod manual_source;
pub mod mapping_sheet;
pub mod material_source_trait;
pub mod program_parser;
pub mod sap_export;

// 重导出核心类型
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use db_source::DatabaseSource;
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser};
pub use file_scanner::{scan_export_files, scan_program_files};
pub use manual_source::ManualFileSource;
pub use mapping_sheet::MappingSheetReader;
pub use program_parser::{parse_program_files, ProgramParser};
pub use sap_export::SapExportParser;

// 重导出 Trait 接口
pub use material_source_trait::{DataCleaner, FileParser, MaterialSource};
