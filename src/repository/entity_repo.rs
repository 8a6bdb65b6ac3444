// ==========================================
// 农场地块管理系统 - 实体仓储 Trait
// ==========================================
// 红线: Repository 不含业务逻辑（不做名称唯一性判断）
// 约束: 写入前必须全量校验；save 必须带版本检查
// ==========================================

use crate::domain::record::{Entity, Stored};
use crate::repository::error::RepositoryResult;

// ==========================================
// EntityRepository Trait
// ==========================================
// 实现者: GrowerRepository / FarmRepository / FieldRepository
pub trait EntityRepository<T: Entity>: Send + Sync {
    /// 按主键查询
    fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Stored<T>>>;

    /// 按名称查询（parent_id 为上级作用域；Grower 忽略该参数）
    ///
    /// # 返回
    /// - 所有同名记录，按 id 升序（可能多于 1 条）
    fn find_by_name(&self, parent_id: Option<i64>, name: &str) -> RepositoryResult<Vec<Stored<T>>>;

    /// 列出作用域内全部记录（None = 全部）
    fn list(&self, parent_id: Option<i64>) -> RepositoryResult<Vec<Stored<T>>>;

    /// 新建记录
    ///
    /// # 返回
    /// - Ok(Stored<T>): version=1，created_at=updated_at=当前时间
    /// - Err(ValidationFailed): 校验失败，未写入
    fn insert(&self, data: T) -> RepositoryResult<Stored<T>>;

    /// 带乐观锁保存
    ///
    /// # 并发控制
    /// 仅当库中 version 等于 `entity.version` 时写入，写入后 version+1 并刷新 updated_at
    ///
    /// # 错误
    /// - `RepositoryError::OptimisticLockFailure`: version 不匹配（已被其他写入方修改）
    /// - `RepositoryError::NotFound`: 记录不存在
    /// - `RepositoryError::ValidationFailed`: 校验失败，未写入
    fn save(&self, entity: &Stored<T>) -> RepositoryResult<Stored<T>>;

    /// 删除记录（下级记录级联删除）
    fn delete(&self, id: i64) -> RepositoryResult<()>;
}
