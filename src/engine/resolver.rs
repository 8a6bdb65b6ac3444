// ==========================================
// 农场地块管理系统 - 实体解析器
// ==========================================
// 职责: 按 (上级, 名称) 查找或创建 Grower / Farm / Field
// 规则:
//   0 条匹配 → 按行属性构造 + 全量校验 → 新建
//   1 条匹配 → 直接返回；仅 Field 用行内 area 覆写并走版本化保存
//   多条匹配 → 记录歧义错误，不重试
// 红线: 行级失败只写入错误收集器，不返回 Err；
//       Err 只用于基础设施故障（数据库不可用等）
// ==========================================

use crate::domain::farm::Farm;
use crate::domain::field::Field;
use crate::domain::grower::Grower;
use crate::domain::import::ImportErrors;
use crate::domain::record::{AttributeError, Entity, Stored};
use crate::domain::types::EntityKind;
use crate::domain::validation::ValidationErrors;
use crate::repository::{EntityRepository, RepositoryError, RepositoryResult};
use tracing::{debug, info, warn};

// ==========================================
// Resolution - 解析结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Resolved(Stored<T>),
    Unresolved,
}

impl<T> Resolution<T> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn into_resolved(self) -> Option<Stored<T>> {
        match self {
            Resolution::Resolved(entity) => Some(entity),
            Resolution::Unresolved => None,
        }
    }
}

/// 上级作用域（用于查询与错误消息）
#[derive(Debug, Clone, Copy)]
struct Scope<'s> {
    kind: EntityKind,
    id: i64,
    name: &'s str,
}

impl<'s> Scope<'s> {
    fn of<T: Entity>(parent: &'s Stored<T>) -> Self {
        Self {
            kind: T::KIND,
            id: parent.id,
            name: parent.name(),
        }
    }
}

enum Lookup<T> {
    Missing,
    Unique(Stored<T>),
    Ambiguous(usize),
}

// ==========================================
// EntityResolver
// ==========================================
pub struct EntityResolver<'r> {
    growers: &'r dyn EntityRepository<Grower>,
    farms: &'r dyn EntityRepository<Farm>,
    fields: &'r dyn EntityRepository<Field>,
    conflict_retries: u32,
}

impl<'r> EntityResolver<'r> {
    /// # 参数
    /// - conflict_retries: 地块面积更新遇到版本冲突时的重读重试次数
    pub fn new(
        growers: &'r dyn EntityRepository<Grower>,
        farms: &'r dyn EntityRepository<Farm>,
        fields: &'r dyn EntityRepository<Field>,
        conflict_retries: u32,
    ) -> Self {
        Self {
            growers,
            farms,
            fields,
            conflict_retries,
        }
    }

    /// 解析种植户（无上级作用域）
    ///
    /// attributes 仅在新建时使用；已存在的种植户不会被导入修改
    pub fn resolve_grower(
        &self,
        row: usize,
        name: &str,
        attributes: &[(String, String)],
        errors: &mut ImportErrors,
    ) -> RepositoryResult<Resolution<Grower>> {
        match lookup(self.growers, None, name)? {
            Lookup::Unique(grower) => Ok(Resolution::Resolved(grower)),
            Lookup::Ambiguous(count) => {
                record_ambiguity(errors, row, EntityKind::Grower, name, None, count);
                Ok(Resolution::Unresolved)
            }
            Lookup::Missing => create(self.growers, Grower::new(name), attributes, row, errors),
        }
    }

    /// 解析农场（作用域 = 种植户）
    pub fn resolve_farm(
        &self,
        row: usize,
        grower: &Stored<Grower>,
        name: &str,
        errors: &mut ImportErrors,
    ) -> RepositoryResult<Resolution<Farm>> {
        let scope = Scope::of(grower);
        match lookup(self.farms, Some(scope.id), name)? {
            Lookup::Unique(farm) => Ok(Resolution::Resolved(farm)),
            Lookup::Ambiguous(count) => {
                record_ambiguity(errors, row, EntityKind::Farm, name, Some(scope), count);
                Ok(Resolution::Unresolved)
            }
            Lookup::Missing => create(self.farms, Farm::new(name, grower.id), &[], row, errors),
        }
    }

    /// 解析地块（作用域 = 农场）
    ///
    /// 已存在的地块按行属性（area）覆写后版本化保存
    pub fn resolve_field(
        &self,
        row: usize,
        farm: &Stored<Farm>,
        name: &str,
        attributes: &[(String, String)],
        errors: &mut ImportErrors,
    ) -> RepositoryResult<Resolution<Field>> {
        let scope = Scope::of(farm);
        match lookup(self.fields, Some(scope.id), name)? {
            Lookup::Unique(field) => self.update_field(field, attributes, row, errors),
            Lookup::Ambiguous(count) => {
                record_ambiguity(errors, row, EntityKind::Field, name, Some(scope), count);
                Ok(Resolution::Unresolved)
            }
            Lookup::Missing => create(self.fields, Field::new(name, farm.id), attributes, row, errors),
        }
    }

    fn update_field(
        &self,
        mut current: Stored<Field>,
        attributes: &[(String, String)],
        row: usize,
        errors: &mut ImportErrors,
    ) -> RepositoryResult<Resolution<Field>> {
        if attributes.is_empty() {
            return Ok(Resolution::Resolved(current));
        }

        let mut attempt = 0;
        loop {
            let mut candidate = current.clone();
            if let Err(failures) = apply_and_validate(&mut candidate.data, attributes) {
                record_validation(errors, row, &failures);
                return Ok(Resolution::Unresolved);
            }

            match self.fields.save(&candidate) {
                Ok(saved) => {
                    debug!(row, field_id = saved.id, version = saved.version, "地块面积已更新");
                    return Ok(Resolution::Resolved(saved));
                }
                Err(e) if e.is_retriable() && attempt < self.conflict_retries => {
                    attempt += 1;
                    warn!(row, field_id = current.id, attempt, error = %e, "地块版本冲突，重读后重试");
                    match self.fields.find_by_id(current.id)? {
                        Some(fresh) => current = fresh,
                        None => {
                            errors.push(format!(
                                "Row {}: field '{}' was deleted during import",
                                row, current.name
                            ));
                            return Ok(Resolution::Unresolved);
                        }
                    }
                }
                Err(e @ RepositoryError::OptimisticLockFailure { .. }) => {
                    warn!(row, field_id = current.id, error = %e, "地块版本冲突，重试耗尽");
                    errors.push(format!(
                        "Row {}: field '{}' was modified concurrently (version conflict), area not updated",
                        row, current.name
                    ));
                    return Ok(Resolution::Unresolved);
                }
                Err(e) => return row_level_or_propagate(e, row, errors),
            }
        }
    }
}

// ==========================================
// 通用步骤
// ==========================================

fn lookup<T: Entity>(
    repo: &dyn EntityRepository<T>,
    scope: Option<i64>,
    name: &str,
) -> RepositoryResult<Lookup<T>> {
    let mut matches = repo.find_by_name(scope, name)?;
    Ok(match matches.len() {
        0 => Lookup::Missing,
        1 => match matches.pop() {
            Some(entity) => Lookup::Unique(entity),
            None => Lookup::Missing,
        },
        n => Lookup::Ambiguous(n),
    })
}

fn create<T: Entity>(
    repo: &dyn EntityRepository<T>,
    mut entity: T,
    attributes: &[(String, String)],
    row: usize,
    errors: &mut ImportErrors,
) -> RepositoryResult<Resolution<T>> {
    if let Err(failures) = apply_and_validate(&mut entity, attributes) {
        record_validation(errors, row, &failures);
        return Ok(Resolution::Unresolved);
    }

    match repo.insert(entity) {
        Ok(stored) => {
            info!(
                row,
                entity = %T::KIND,
                id = stored.id,
                name = stored.name(),
                parent_id = ?stored.parent_id(),
                "新建实体"
            );
            Ok(Resolution::Resolved(stored))
        }
        Err(e) => row_level_or_propagate(e, row, errors),
    }
}

/// 按白名单写入属性后做全量校验；未知属性与非法值一并汇总
fn apply_and_validate<T: Entity>(
    entity: &mut T,
    attributes: &[(String, String)],
) -> Result<(), Vec<String>> {
    let mut failures = Vec::new();
    let mut invalid = ValidationErrors::new();

    for (key, value) in attributes {
        match entity.apply_attribute(key, value) {
            Ok(()) => {}
            Err(AttributeError::Invalid(e)) => invalid.push(e),
            Err(unknown @ AttributeError::Unknown { .. }) => failures.push(unknown.to_string()),
        }
    }

    if invalid.is_empty() {
        if let Err(validation) = entity.validate() {
            failures.extend(validation.messages());
        }
    } else {
        // 属性值无法解析时不再对残缺实体做二次校验
        failures.extend(invalid.messages());
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}

fn record_validation(errors: &mut ImportErrors, row: usize, failures: &[String]) {
    for failure in failures {
        warn!(row, error = %failure, "行校验失败");
        errors.push(format!("Row {}: {}", row, failure));
    }
}

fn record_ambiguity(
    errors: &mut ImportErrors,
    row: usize,
    kind: EntityKind,
    name: &str,
    scope: Option<Scope<'_>>,
    count: usize,
) {
    let message = match scope {
        Some(scope) => format!(
            "Row {}: Multiple {} named '{}' exist for {} '{}'",
            row,
            kind.plural(),
            name,
            scope.kind,
            scope.name
        ),
        None => format!("Row {}: Multiple {} named '{}' exist", row, kind.plural(), name),
    };
    warn!(row, entity = %kind, name, count, "名称匹配到多条记录");
    errors.push(message);
}

/// 数据约束类失败计入行错误，其余（连接、锁、SQL）向上传播
fn row_level_or_propagate<T>(
    err: RepositoryError,
    row: usize,
    errors: &mut ImportErrors,
) -> RepositoryResult<Resolution<T>> {
    match err {
        RepositoryError::ValidationFailed(validation) => {
            record_validation(errors, row, &validation.messages());
            Ok(Resolution::Unresolved)
        }
        RepositoryError::Attribute(_)
        | RepositoryError::CheckConstraintViolation(_)
        | RepositoryError::ForeignKeyViolation(_)
        | RepositoryError::UniqueConstraintViolation(_)
        | RepositoryError::NotFound { .. } => {
            let message = err.to_string();
            record_validation(errors, row, &[message]);
            Ok(Resolution::Unresolved)
        }
        other => Err(other),
    }
}
