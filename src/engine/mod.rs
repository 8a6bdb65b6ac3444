// ==========================================
// 农场地块管理系统 - 引擎层
// ==========================================
// 职责: 实体解析规则（查找或创建、歧义检测）
// 红线: Engine 不拼 SQL，只经由仓储 trait 访问数据
// ==========================================

pub mod resolver;

// 重导出核心引擎
pub use resolver::{EntityResolver, Resolution};
