// ==========================================
// 农场地块管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、校验规则
// 红线: 不含数据访问逻辑,不含导入编排逻辑
// ==========================================

pub mod farm;
pub mod field;
pub mod grower;
pub mod import;
pub mod record;
pub mod types;
pub mod validation;

// 重导出核心类型
pub use farm::Farm;
pub use field::Field;
pub use grower::Grower;
pub use import::{ImportErrors, ImportReport, ImportRow, RawTable, REQUIRED_COLUMNS};
pub use record::{AttributeError, AttributeSetter, Entity, Stored};
pub use types::EntityKind;
pub use validation::{FieldError, ValidationErrors, MIN_FIELD_AREA};
