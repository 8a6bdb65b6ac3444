// ==========================================
// 农场地块管理系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::record::AttributeError;
use crate::domain::types::EntityKind;
use crate::domain::validation::ValidationErrors;
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 并发控制错误 =====
    #[error("乐观锁冲突: {entity} id={id}, expected_version={expected}, actual_version={actual}")]
    OptimisticLockFailure {
        entity: EntityKind,
        id: i64,
        expected: i64,
        actual: i64,
    },

    // ===== 数据库错误 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    #[error("检查约束违反: {0}")]
    CheckConstraintViolation(String),

    // ===== 数据质量错误 =====
    #[error("数据验证失败: {0}")]
    ValidationFailed(ValidationErrors),

    #[error("属性写入失败: {0}")]
    Attribute(#[from] AttributeError),
}

impl RepositoryError {
    pub fn not_found(entity: EntityKind, id: i64) -> Self {
        RepositoryError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// 仅乐观锁冲突可重读后重试
    pub fn is_retriable(&self) -> bool {
        matches!(self, RepositoryError::OptimisticLockFailure { .. })
    }
}

impl From<ValidationErrors> for RepositoryError {
    fn from(errors: ValidationErrors) -> Self {
        RepositoryError::ValidationFailed(errors)
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else if msg.contains("FOREIGN KEY") {
                    RepositoryError::ForeignKeyViolation(msg)
                } else if msg.contains("CHECK") {
                    RepositoryError::CheckConstraintViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
