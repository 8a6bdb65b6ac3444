// ==========================================
// 农场地块管理系统 - 乐观锁写入辅助
// ==========================================
// UPDATE ... SET version = version + 1 WHERE id = ? AND version = ?
// 影响行数为 0 时区分“记录不存在”与“版本冲突”
// ==========================================

use crate::domain::types::EntityKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};

/// 校验带版本条件的 UPDATE 结果
///
/// # 参数
/// - rows_affected: UPDATE 影响行数
/// - expected: 调用方读取时的版本号
pub(crate) fn check_versioned_update(
    conn: &Connection,
    kind: EntityKind,
    id: i64,
    expected: i64,
    rows_affected: usize,
) -> RepositoryResult<()> {
    if rows_affected == 1 {
        return Ok(());
    }

    let sql = format!("SELECT version FROM {} WHERE id = ?1", kind.table_name());
    let actual: Option<i64> = conn
        .query_row(&sql, params![id], |row| row.get(0))
        .optional()?;

    match actual {
        // 记录存在，但version不匹配 -> 乐观锁冲突
        Some(actual) => {
            tracing::warn!(entity = %kind, id, expected, actual, "乐观锁冲突");
            Err(RepositoryError::OptimisticLockFailure {
                entity: kind,
                id,
                expected,
                actual,
            })
        }
        None => Err(RepositoryError::not_found(kind, id)),
    }
}

/// 删除结果校验
pub(crate) fn check_deleted(kind: EntityKind, id: i64, rows_affected: usize) -> RepositoryResult<()> {
    if rows_affected == 0 {
        return Err(RepositoryError::not_found(kind, id));
    }
    Ok(())
}
