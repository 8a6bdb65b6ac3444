// ==========================================
// 农场地块管理系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository/导入错误为用户友好的错误消息
// 约束: 版本冲突单独成类，调用方据此决定重读后重试
// ==========================================

use crate::importer::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    /// 字段级校验失败，每条为 "字段: 消息"
    #[error("数据验证失败: {}", .0.join("; "))]
    ValidationError(Vec<String>),

    // ==========================================
    // 并发控制错误
    // ==========================================
    #[error("版本冲突: {entity}(id={id}) 已被其他请求修改（期望version={expected}，实际version={actual}）")]
    VersionConflict {
        entity: String,
        id: i64,
        expected: i64,
        actual: i64,
    },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 导入 / 配置错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("配置错误: {0}")]
    ConfigError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, ApiError::VersionConflict { .. })
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 并发控制错误
            RepositoryError::OptimisticLockFailure {
                entity,
                id,
                expected,
                actual,
            } => ApiError::VersionConflict {
                entity: entity.to_string(),
                id,
                expected,
                actual,
            },

            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::CheckConstraintViolation(msg) => {
                ApiError::ValidationError(vec![format!("检查约束违反: {}", msg)])
            }

            // 数据质量错误
            RepositoryError::ValidationFailed(errors) => ApiError::ValidationError(errors.messages()),
            RepositoryError::Attribute(e) => ApiError::InvalidInput(e.to_string()),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Repository(e) => ApiError::from(e),
            ImportError::ConfigReadError { .. } => ApiError::ConfigError(err.to_string()),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
