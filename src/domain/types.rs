// ==========================================
// 农场地块管理系统 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// EntityKind - 实体类型
// ==========================================
// 层级: Grower → Farm → Field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Grower,
    Farm,
    Field,
}

impl EntityKind {
    /// 数据库表名
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Grower => "grower",
            EntityKind::Farm => "farm",
            EntityKind::Field => "field",
        }
    }

    /// 上级实体类型（Grower 无上级）
    pub fn parent(&self) -> Option<EntityKind> {
        match self {
            EntityKind::Grower => None,
            EntityKind::Farm => Some(EntityKind::Grower),
            EntityKind::Field => Some(EntityKind::Farm),
        }
    }

    /// 复数形式（用于错误消息）
    pub fn plural(&self) -> &'static str {
        match self {
            EntityKind::Grower => "growers",
            EntityKind::Farm => "farms",
            EntityKind::Field => "fields",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}
