// ==========================================
// 农场地块管理系统 - 导入层
// ==========================================
// 职责: 外部数据导入（种植户 / 农场 / 地块）
// 支持: CSV 文本, CSV, Excel
// ==========================================

// 模块声明
pub mod error;
pub mod field_importer;
pub mod file_parser;
pub mod row_mapper;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use field_importer::FieldImporter;
pub use file_parser::{CsvParser, ExcelParser, FileParser, UniversalFileParser};
pub use row_mapper::RowMapper;
