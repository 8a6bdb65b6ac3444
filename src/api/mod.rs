// ==========================================
// 农场地块管理系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供 CLI 或上层服务调用
// ==========================================

pub mod dto;
pub mod error;
pub mod farm_api;
pub mod field_api;
pub mod import_api;

// 重导出核心类型
pub use dto::{Expander, FarmData, FieldData, GrowerData, Relation};
pub use error::{ApiError, ApiResult};
pub use farm_api::{FarmApi, GrowerApi};
pub use field_api::FieldApi;
pub use import_api::{FileImportOutcome, ImportApi};
