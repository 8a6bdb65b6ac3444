// ==========================================
// 农场地块管理系统 - 农场数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 级联: 删除农场时其地块由外键 ON DELETE CASCADE 删除
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::farm::Farm;
use crate::domain::record::{Entity, Stored};
use crate::domain::types::EntityKind;
use crate::repository::entity_repo::EntityRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::versioning::{check_deleted, check_versioned_update};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str =
    "SELECT id, name, grower_id, version, created_at, updated_at FROM farm";

// ==========================================
// FarmRepository - 农场仓储
// ==========================================
pub struct FarmRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FarmRepository {
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

    fn map_row(row: &Row) -> rusqlite::Result<Stored<Farm>> {
        Ok(Stored {
            id: row.get(0)?,
            data: Farm {
                name: row.get(1)?,
                grower_id: row.get(2)?,
            },
            version: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl EntityRepository<Farm> for FarmRepository {
    fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Stored<Farm>>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        let farm = conn
            .query_row(&sql, params![id], Self::map_row)
            .optional()?;
        Ok(farm)
    }

    fn find_by_name(&self, parent_id: Option<i64>, name: &str) -> RepositoryResult<Vec<Stored<Farm>>> {
        let conn = self.get_conn()?;
        let farms = match parent_id {
            Some(grower_id) => {
                let sql = format!(
                    "{} WHERE grower_id = ?1 AND name = ?2 ORDER BY id ASC",
                    SELECT_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![grower_id, name], Self::map_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let sql = format!("{} WHERE name = ?1 ORDER BY id ASC", SELECT_COLUMNS);
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![name], Self::map_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(farms)
    }

    fn list(&self, parent_id: Option<i64>) -> RepositoryResult<Vec<Stored<Farm>>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE (?1 IS NULL OR grower_id = ?1) ORDER BY id ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let farms = stmt
            .query_map(params![parent_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(farms)
    }

    fn insert(&self, data: Farm) -> RepositoryResult<Stored<Farm>> {
        data.validate()?;
        let now = Utc::now();
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO farm (name, grower_id, version, created_at, updated_at)
               VALUES (?1, ?2, 1, ?3, ?3)"#,
            params![&data.name, data.grower_id, now],
        )?;

        Ok(Stored {
            id: conn.last_insert_rowid(),
            version: 1,
            created_at: now,
            updated_at: now,
            data,
        })
    }

    fn save(&self, entity: &Stored<Farm>) -> RepositoryResult<Stored<Farm>> {
        entity.data.validate()?;
        let now = Utc::now();
        let conn = self.get_conn()?;

        let rows_affected = conn.execute(
            r#"UPDATE farm
               SET name = ?1, grower_id = ?2, version = version + 1, updated_at = ?3
               WHERE id = ?4 AND version = ?5"#,
            params![&entity.name, entity.grower_id, now, entity.id, entity.version],
        )?;
        check_versioned_update(&conn, EntityKind::Farm, entity.id, entity.version, rows_affected)?;

        Ok(Stored {
            version: entity.version + 1,
            updated_at: now,
            ..entity.clone()
        })
    }

    fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute("DELETE FROM farm WHERE id = ?1", params![id])?;
        check_deleted(EntityKind::Farm, id, rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::domain::grower::Grower;
    use crate::repository::grower_repo::GrowerRepository;

    fn setup() -> (GrowerRepository, FarmRepository) {
        let conn = Arc::new(Mutex::new(open_in_memory().unwrap()));
        (GrowerRepository::new(conn.clone()), FarmRepository::new(conn))
    }

    #[test]
    fn test_find_by_name_is_scoped_to_grower() {
        let (growers, farms) = setup();
        let acme = growers.insert(Grower::new("Acme")).unwrap();
        let other = growers.insert(Grower::new("Other")).unwrap();

        farms.insert(Farm::new("North", acme.id)).unwrap();
        farms.insert(Farm::new("North", other.id)).unwrap();

        assert_eq!(farms.find_by_name(Some(acme.id), "North").unwrap().len(), 1);
        assert_eq!(farms.find_by_name(None, "North").unwrap().len(), 2);
        assert_eq!(farms.list(Some(other.id)).unwrap().len(), 1);
        assert_eq!(farms.list(None).unwrap().len(), 2);
    }

    #[test]
    fn test_insert_requires_existing_grower() {
        let (_growers, farms) = setup();
        let result = farms.insert(Farm::new("North", 999));
        assert!(matches!(result, Err(RepositoryError::ForeignKeyViolation(_))));
    }

    #[test]
    fn test_delete_grower_cascades() {
        let (growers, farms) = setup();
        let acme = growers.insert(Grower::new("Acme")).unwrap();
        let farm = farms.insert(Farm::new("North", acme.id)).unwrap();

        growers.delete(acme.id).unwrap();
        assert!(farms.find_by_id(farm.id).unwrap().is_none());
    }
}
