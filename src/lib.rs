// ==========================================
// 农场地块管理系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 层级: 种植户 (Grower) → 农场 (Farm) → 地块 (Field)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 实体解析
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    EntityKind, Farm, Field, Grower, ImportErrors, ImportReport, ImportRow, Stored,
    ValidationErrors,
};

// 引擎
pub use engine::{EntityResolver, Resolution};

// 导入
pub use importer::{FieldImporter, ImportError};

// 仓储
pub use repository::{
    EntityRepository, FarmRepository, FieldRepository, GrowerRepository, RepositoryError,
};

// API
pub use api::{ApiError, FarmApi, FieldApi, GrowerApi, ImportApi};

// ==========================================
// 系统常量
// ==========================================

/// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 系统名称
pub const APP_NAME: &str = "农场地块管理系统";
