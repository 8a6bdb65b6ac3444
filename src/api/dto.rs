// ==========================================
// 农场地块管理系统 - API 数据表示
// ==========================================
// 扁平表示: pk, version, created, updated + 实体属性
// 关联深度: depth = 0 时上级为 id；depth > 0 时递归展开上级（depth - 1）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::farm::Farm;
use crate::domain::field::Field;
use crate::domain::grower::Grower;
use crate::domain::record::Stored;
use crate::domain::types::EntityKind;
use crate::repository::{EntityRepository, RepositoryError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 关联字段：id 或展开后的上级
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Relation<T> {
    Id(i64),
    Nested(Box<T>),
}

impl<T> Relation<T> {
    pub fn nested(&self) -> Option<&T> {
        match self {
            Relation::Nested(inner) => Some(inner),
            Relation::Id(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowerData {
    pub pk: i64,
    pub version: i64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub name: String,
    pub street_addr: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmData {
    pub pk: i64,
    pub version: i64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub name: String,
    pub grower: Relation<GrowerData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldData {
    pub pk: i64,
    pub version: i64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub name: String,
    pub area: Option<f64>,
    pub farm: Relation<FarmData>,
}

impl From<Stored<Grower>> for GrowerData {
    fn from(stored: Stored<Grower>) -> Self {
        let Stored {
            id,
            version,
            created_at,
            updated_at,
            data,
        } = stored;
        Self {
            pk: id,
            version,
            created: created_at,
            updated: updated_at,
            name: data.name,
            street_addr: data.street_addr,
            city: data.city,
            state: data.state,
            zip_code: data.zip_code,
            country: data.country,
        }
    }
}

// ==========================================
// Expander - 按深度展开上级
// ==========================================
pub struct Expander<'a> {
    growers: &'a dyn EntityRepository<Grower>,
    farms: &'a dyn EntityRepository<Farm>,
}

impl<'a> Expander<'a> {
    pub fn new(
        growers: &'a dyn EntityRepository<Grower>,
        farms: &'a dyn EntityRepository<Farm>,
    ) -> Self {
        Self { growers, farms }
    }

    pub fn grower(&self, stored: Stored<Grower>) -> GrowerData {
        stored.into()
    }

    pub fn farm(&self, stored: Stored<Farm>, depth: u32) -> ApiResult<FarmData> {
        let grower = if depth == 0 {
            Relation::Id(stored.grower_id)
        } else {
            let parent = self
                .growers
                .find_by_id(stored.grower_id)?
                .ok_or_else(|| missing_parent(EntityKind::Grower, stored.grower_id))?;
            Relation::Nested(Box::new(self.grower(parent)))
        };

        Ok(FarmData {
            pk: stored.id,
            version: stored.version,
            created: stored.created_at,
            updated: stored.updated_at,
            name: stored.data.name,
            grower,
        })
    }

    pub fn field(&self, stored: Stored<Field>, depth: u32) -> ApiResult<FieldData> {
        let farm = if depth == 0 {
            Relation::Id(stored.farm_id)
        } else {
            let parent = self
                .farms
                .find_by_id(stored.farm_id)?
                .ok_or_else(|| missing_parent(EntityKind::Farm, stored.farm_id))?;
            Relation::Nested(Box::new(self.farm(parent, depth - 1)?))
        };

        Ok(FieldData {
            pk: stored.id,
            version: stored.version,
            created: stored.created_at,
            updated: stored.updated_at,
            name: stored.data.name,
            area: stored.data.area,
            farm,
        })
    }
}

fn missing_parent(kind: EntityKind, id: i64) -> ApiError {
    RepositoryError::not_found(kind, id).into()
}
