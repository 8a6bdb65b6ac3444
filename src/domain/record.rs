// ==========================================
// 农场地块管理系统 - 持久化实体抽象
// ==========================================
// 职责: 统一 id/version/created/updated 元数据 + 属性白名单
// 元数据由仓储层在 insert/save 时填充，领域层只读
// ==========================================

use crate::domain::types::EntityKind;
use crate::domain::validation::{FieldError, ValidationErrors};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use thiserror::Error;

/// 属性写入函数（白名单中的 setter）
pub type AttributeSetter<T> = fn(&mut T, &str) -> Result<(), FieldError>;

// ==========================================
// AttributeError - 属性写入错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttributeError {
    #[error("unknown attribute '{key}' for {entity}")]
    Unknown { entity: EntityKind, key: String },

    #[error("{0}")]
    Invalid(FieldError),
}

// ==========================================
// Entity Trait
// ==========================================
// 实现者: Grower / Farm / Field
pub trait Entity: Clone + Send + Sync + 'static {
    /// 实体类型
    const KIND: EntityKind;

    /// 可由行数据/补丁写入的属性白名单
    const ATTRIBUTES: &'static [(&'static str, AttributeSetter<Self>)];

    /// 名称（同一上级内的匹配键）
    fn name(&self) -> &str;

    /// 上级实体 ID（Grower 为 None）
    fn parent_id(&self) -> Option<i64>;

    /// 全量校验
    fn validate(&self) -> Result<(), ValidationErrors>;

    /// 按白名单写入单个属性，未知键拒绝
    fn apply_attribute(&mut self, key: &str, value: &str) -> Result<(), AttributeError> {
        match Self::ATTRIBUTES.iter().find(|(name, _)| *name == key) {
            Some((_, setter)) => setter(self, value).map_err(AttributeError::Invalid),
            None => Err(AttributeError::Unknown {
                entity: Self::KIND,
                key: key.to_string(),
            }),
        }
    }

    /// 属性是否在白名单内
    fn accepts_attribute(key: &str) -> bool {
        Self::ATTRIBUTES.iter().any(|(name, _)| *name == key)
    }
}

// ==========================================
// Stored<T> - 已持久化实体
// ==========================================
// version: 乐观锁版本号（保存时必须与库中一致）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stored<T> {
    pub id: i64,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data: T,
}

impl<T> Deref for Stored<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}
