// ==========================================
// 农场地块管理系统 - 农场 / 种植户 API
// ==========================================
// 职责: 农场列表、种植户查询与删除（级联）
// ==========================================

use std::sync::Arc;
use tracing::info;

use crate::api::dto::{Expander, FarmData, GrowerData};
use crate::api::error::ApiResult;
use crate::domain::types::EntityKind;
use crate::repository::{EntityRepository, FarmRepository, GrowerRepository, RepositoryError};

// ==========================================
// FarmApi
// ==========================================
pub struct FarmApi {
    grower_repo: Arc<GrowerRepository>,
    farm_repo: Arc<FarmRepository>,
}

impl FarmApi {
    pub fn new(grower_repo: Arc<GrowerRepository>, farm_repo: Arc<FarmRepository>) -> Self {
        Self {
            grower_repo,
            farm_repo,
        }
    }

    /// 查询农场列表
    ///
    /// # 参数
    /// - grower_id: 可选种植户过滤
    /// - depth: 关联展开深度
    pub fn list(&self, grower_id: Option<i64>, depth: u32) -> ApiResult<Vec<FarmData>> {
        let expander = Expander::new(self.grower_repo.as_ref(), self.farm_repo.as_ref());
        self.farm_repo
            .list(grower_id)?
            .into_iter()
            .map(|farm| expander.farm(farm, depth))
            .collect()
    }

    pub fn get(&self, pk: i64, depth: u32) -> ApiResult<FarmData> {
        let farm = self
            .farm_repo
            .find_by_id(pk)?
            .ok_or_else(|| RepositoryError::not_found(EntityKind::Farm, pk))?;
        Expander::new(self.grower_repo.as_ref(), self.farm_repo.as_ref()).farm(farm, depth)
    }
}

// ==========================================
// GrowerApi
// ==========================================
pub struct GrowerApi {
    grower_repo: Arc<GrowerRepository>,
}

impl GrowerApi {
    pub fn new(grower_repo: Arc<GrowerRepository>) -> Self {
        Self { grower_repo }
    }

    pub fn list(&self) -> ApiResult<Vec<GrowerData>> {
        Ok(self
            .grower_repo
            .list(None)?
            .into_iter()
            .map(GrowerData::from)
            .collect())
    }

    pub fn get(&self, pk: i64) -> ApiResult<GrowerData> {
        let grower = self
            .grower_repo
            .find_by_id(pk)?
            .ok_or_else(|| RepositoryError::not_found(EntityKind::Grower, pk))?;
        Ok(grower.into())
    }

    /// 删除种植户（其农场与地块级联删除）
    pub fn delete(&self, pk: i64) -> ApiResult<()> {
        self.grower_repo.delete(pk)?;
        info!(grower_id = pk, "种植户已删除（级联）");
        Ok(())
    }
}
