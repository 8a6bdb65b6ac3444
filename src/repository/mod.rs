// ==========================================
// 农场地块管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约束: 所有更新走乐观锁（version）
// ==========================================

pub mod entity_repo;
pub mod error;
pub mod farm_repo;
pub mod field_repo;
pub mod grower_repo;
mod versioning;

// 重导出核心仓储
pub use entity_repo::EntityRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use farm_repo::FarmRepository;
pub use field_repo::FieldRepository;
pub use grower_repo::GrowerRepository;
