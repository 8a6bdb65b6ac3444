// ==========================================
// 农场地块管理系统 - 地块数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: area ≥ 0.0001 由校验保证，schema CHECK 兜底
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::field::Field;
use crate::domain::record::{Entity, Stored};
use crate::domain::types::EntityKind;
use crate::repository::entity_repo::EntityRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::versioning::{check_deleted, check_versioned_update};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str =
    "SELECT id, name, area, farm_id, version, created_at, updated_at FROM field";

// ==========================================
// FieldRepository - 地块仓储
// ==========================================
pub struct FieldRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FieldRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 按数据库路径创建仓储实例
    pub fn from_path(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row) -> rusqlite::Result<Stored<Field>> {
        Ok(Stored {
            id: row.get(0)?,
            data: Field {
                name: row.get(1)?,
                area: row.get(2)?,
                farm_id: row.get(3)?,
            },
            version: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

impl EntityRepository<Field> for FieldRepository {
    fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Stored<Field>>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        let field = conn
            .query_row(&sql, params![id], Self::map_row)
            .optional()?;
        Ok(field)
    }

    fn find_by_name(&self, parent_id: Option<i64>, name: &str) -> RepositoryResult<Vec<Stored<Field>>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE (?1 IS NULL OR farm_id = ?1) AND name = ?2 ORDER BY id ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let fields = stmt
            .query_map(params![parent_id, name], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(fields)
    }

    fn list(&self, parent_id: Option<i64>) -> RepositoryResult<Vec<Stored<Field>>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE (?1 IS NULL OR farm_id = ?1) ORDER BY id ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let fields = stmt
            .query_map(params![parent_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(fields)
    }

    fn insert(&self, data: Field) -> RepositoryResult<Stored<Field>> {
        data.validate()?;
        let now = Utc::now();
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO field (name, area, farm_id, version, created_at, updated_at)
               VALUES (?1, ?2, ?3, 1, ?4, ?4)"#,
            params![&data.name, data.area, data.farm_id, now],
        )?;

        Ok(Stored {
            id: conn.last_insert_rowid(),
            version: 1,
            created_at: now,
            updated_at: now,
            data,
        })
    }

    fn save(&self, entity: &Stored<Field>) -> RepositoryResult<Stored<Field>> {
        entity.data.validate()?;
        let now = Utc::now();
        let conn = self.get_conn()?;

        let rows_affected = conn.execute(
            r#"UPDATE field
               SET name = ?1, area = ?2, farm_id = ?3, version = version + 1, updated_at = ?4
               WHERE id = ?5 AND version = ?6"#,
            params![
                &entity.name,
                entity.area,
                entity.farm_id,
                now,
                entity.id,
                entity.version,
            ],
        )?;
        check_versioned_update(&conn, EntityKind::Field, entity.id, entity.version, rows_affected)?;

        Ok(Stored {
            version: entity.version + 1,
            updated_at: now,
            ..entity.clone()
        })
    }

    fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute("DELETE FROM field WHERE id = ?1", params![id])?;
        check_deleted(EntityKind::Field, id, rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::domain::farm::Farm;
    use crate::domain::grower::Grower;
    use crate::repository::farm_repo::FarmRepository;
    use crate::repository::grower_repo::GrowerRepository;

    fn setup() -> (FieldRepository, i64) {
        let conn = Arc::new(Mutex::new(open_in_memory().unwrap()));
        let growers = GrowerRepository::new(conn.clone());
        let farms = FarmRepository::new(conn.clone());
        let grower = growers.insert(Grower::new("Acme")).unwrap();
        let farm = farms.insert(Farm::new("North", grower.id)).unwrap();
        (FieldRepository::new(conn), farm.id)
    }

    #[test]
    fn test_insert_and_find_by_name() {
        let (repo, farm_id) = setup();
        let stored = repo.insert(Field::new("F1", farm_id).with_area(12.5)).unwrap();

        let found = repo.find_by_name(Some(farm_id), "F1").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, stored.id);
        assert_eq!(found[0].area, Some(12.5));
        assert!(repo.find_by_name(Some(farm_id + 1), "F1").unwrap().is_empty());
    }

    #[test]
    fn test_insert_rejects_small_area() {
        let (repo, farm_id) = setup();
        let result = repo.insert(Field::new("F1", farm_id).with_area(0.00001));
        match result {
            Err(RepositoryError::ValidationFailed(errors)) => {
                assert_eq!(errors.messages(), vec!["area: Area must be at least 0.0001 acres."]);
            }
            other => panic!("Expected ValidationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_save_rejects_small_area_without_writing() {
        let (repo, farm_id) = setup();
        let mut stored = repo.insert(Field::new("F1", farm_id).with_area(3.0)).unwrap();
        stored.data.area = Some(0.0);

        assert!(matches!(repo.save(&stored), Err(RepositoryError::ValidationFailed(_))));

        let found = repo.find_by_id(stored.id).unwrap().unwrap();
        assert_eq!(found.area, Some(3.0));
        assert_eq!(found.version, 1);
    }

    #[test]
    fn test_stale_save_is_rejected() {
        let (repo, farm_id) = setup();
        let original = repo.insert(Field::new("F1", farm_id).with_area(3.0)).unwrap();

        let mut first = original.clone();
        first.data.area = Some(4.0);
        repo.save(&first).unwrap();

        let mut stale = original.clone();
        stale.data.area = Some(5.0);
        match repo.save(&stale) {
            Err(RepositoryError::OptimisticLockFailure { expected, actual, .. }) => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 2);
            }
            other => panic!("Expected OptimisticLockFailure, got {:?}", other),
        }

        let found = repo.find_by_id(original.id).unwrap().unwrap();
        assert_eq!(found.area, Some(4.0));
        assert_eq!(found.version, 2);
    }
}
