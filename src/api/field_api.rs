// ==========================================
// 农场地块管理系统 - 地块 API
// ==========================================
// 职责: 地块 CRUD（按主键），返回扁平表示
// 约束: replace / patch 必须携带调用方读到的 version
// ==========================================

use std::sync::Arc;
use tracing::{debug, info};

use crate::api::dto::{Expander, FieldData};
use crate::api::error::{ApiError, ApiResult};
use crate::domain::field::Field;
use crate::domain::record::{Entity, Stored};
use crate::domain::types::EntityKind;
use crate::repository::{
    EntityRepository, FarmRepository, FieldRepository, GrowerRepository, RepositoryError,
};

// ==========================================
// FieldApi - 地块 API
// ==========================================
pub struct FieldApi {
    grower_repo: Arc<GrowerRepository>,
    farm_repo: Arc<FarmRepository>,
    field_repo: Arc<FieldRepository>,
}

impl FieldApi {
    pub fn new(
        grower_repo: Arc<GrowerRepository>,
        farm_repo: Arc<FarmRepository>,
        field_repo: Arc<FieldRepository>,
    ) -> Self {
        Self {
            grower_repo,
            farm_repo,
            field_repo,
        }
    }

    fn expander(&self) -> Expander<'_> {
        Expander::new(self.grower_repo.as_ref(), self.farm_repo.as_ref())
    }

    fn load(&self, pk: i64) -> ApiResult<Stored<Field>> {
        self.field_repo
            .find_by_id(pk)?
            .ok_or_else(|| RepositoryError::not_found(EntityKind::Field, pk).into())
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 查询地块列表
    ///
    /// # 参数
    /// - farm_id: 可选农场过滤
    /// - depth: 关联展开深度
    pub fn list(&self, farm_id: Option<i64>, depth: u32) -> ApiResult<Vec<FieldData>> {
        let expander = self.expander();
        self.field_repo
            .list(farm_id)?
            .into_iter()
            .map(|field| expander.field(field, depth))
            .collect()
    }

    /// 按主键查询地块
    pub fn get(&self, pk: i64, depth: u32) -> ApiResult<FieldData> {
        let field = self.load(pk)?;
        self.expander().field(field, depth)
    }

    // ==========================================
    // 写入接口
    // ==========================================

    /// 新建地块
    ///
    /// # 参数
    /// - farm_id: 所属农场
    /// - name: 地块名称
    /// - attributes: 白名单属性（area）
    pub fn create(
        &self,
        farm_id: i64,
        name: &str,
        attributes: &[(String, String)],
    ) -> ApiResult<FieldData> {
        if self.farm_repo.find_by_id(farm_id)?.is_none() {
            return Err(RepositoryError::not_found(EntityKind::Farm, farm_id).into());
        }

        let mut field = Field::new(name.trim(), farm_id);
        apply_attributes(&mut field, attributes)?;

        let stored = self.field_repo.insert(field)?;
        info!(field_id = stored.id, farm_id, name = %stored.name, "地块已创建");
        self.expander().field(stored, 0)
    }

    /// 全量替换（PUT）
    ///
    /// # 参数
    /// - expected_version: 调用方读到的版本号
    ///
    /// # 返回
    /// - Err(ApiError::VersionConflict): 版本已变化，未做任何修改
    pub fn replace(
        &self,
        pk: i64,
        expected_version: i64,
        name: &str,
        area: Option<f64>,
    ) -> ApiResult<FieldData> {
        let current = self.load(pk)?;
        let candidate = Stored {
            version: expected_version,
            data: Field {
                name: name.trim().to_string(),
                area,
                farm_id: current.farm_id,
            },
            ..current
        };

        let saved = self.field_repo.save(&candidate)?;
        debug!(field_id = pk, version = saved.version, "地块已替换");
        self.expander().field(saved, 0)
    }

    /// 部分更新（PATCH）
    ///
    /// 支持 name 与白名单属性；未知键拒绝
    pub fn patch(
        &self,
        pk: i64,
        expected_version: i64,
        attributes: &[(String, String)],
    ) -> ApiResult<FieldData> {
        let mut candidate = self.load(pk)?;
        candidate.version = expected_version;

        let mut rest = Vec::with_capacity(attributes.len());
        for (key, value) in attributes {
            if key == "name" {
                candidate.data.name = value.trim().to_string();
            } else {
                rest.push((key.clone(), value.clone()));
            }
        }
        apply_attributes(&mut candidate.data, &rest)?;

        let saved = self.field_repo.save(&candidate)?;
        debug!(field_id = pk, version = saved.version, "地块已更新");
        self.expander().field(saved, 0)
    }

    /// 删除地块
    pub fn delete(&self, pk: i64) -> ApiResult<()> {
        self.field_repo.delete(pk)?;
        info!(field_id = pk, "地块已删除");
        Ok(())
    }
}

fn apply_attributes(field: &mut Field, attributes: &[(String, String)]) -> ApiResult<()> {
    let mut invalid = Vec::new();
    for (key, value) in attributes {
        if !Field::accepts_attribute(key) {
            return Err(ApiError::InvalidInput(format!(
                "unknown attribute '{}' for {}",
                key,
                EntityKind::Field
            )));
        }
        if let Err(e) = field.apply_attribute(key, value) {
            invalid.push(e.to_string());
        }
    }

    if invalid.is_empty() {
        Ok(())
    } else {
        Err(ApiError::ValidationError(invalid))
    }
}
