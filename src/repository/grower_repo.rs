// ==========================================
// 农场地块管理系统 - 种植户数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::grower::Grower;
use crate::domain::record::{Entity, Stored};
use crate::domain::types::EntityKind;
use crate::repository::entity_repo::EntityRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::versioning::{check_deleted, check_versioned_update};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"SELECT id, name, street_addr, city, state, zip_code, country,
                                        version, created_at, updated_at
                                 FROM grower"#;

// ==========================================
// GrowerRepository - 种植户仓储
// ==========================================
pub struct GrowerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl GrowerRepository {
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

    fn map_row(row: &Row) -> rusqlite::Result<Stored<Grower>> {
        Ok(Stored {
            id: row.get(0)?,
            data: Grower {
                name: row.get(1)?,
                street_addr: row.get(2)?,
                city: row.get(3)?,
                state: row.get(4)?,
                zip_code: row.get(5)?,
                country: row.get(6)?,
            },
            version: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }
}

impl EntityRepository<Grower> for GrowerRepository {
    fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Stored<Grower>>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        let grower = conn
            .query_row(&sql, params![id], Self::map_row)
            .optional()?;
        Ok(grower)
    }

    fn find_by_name(
        &self,
        _parent_id: Option<i64>,
        name: &str,
    ) -> RepositoryResult<Vec<Stored<Grower>>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE name = ?1 ORDER BY id ASC", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let growers = stmt
            .query_map(params![name], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(growers)
    }

    fn list(&self, _parent_id: Option<i64>) -> RepositoryResult<Vec<Stored<Grower>>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY id ASC", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let growers = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(growers)
    }

    fn insert(&self, data: Grower) -> RepositoryResult<Stored<Grower>> {
        data.validate()?;
        let now = Utc::now();
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO grower (
                name, street_addr, city, state, zip_code, country,
                version, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)"#,
            params![
                &data.name,
                &data.street_addr,
                &data.city,
                &data.state,
                &data.zip_code,
                &data.country,
                now,
            ],
        )?;

        Ok(Stored {
            id: conn.last_insert_rowid(),
            version: 1,
            created_at: now,
            updated_at: now,
            data,
        })
    }

    fn save(&self, entity: &Stored<Grower>) -> RepositoryResult<Stored<Grower>> {
        entity.data.validate()?;
        let now = Utc::now();
        let conn = self.get_conn()?;

        let rows_affected = conn.execute(
            r#"UPDATE grower
               SET name = ?1, street_addr = ?2, city = ?3, state = ?4,
                   zip_code = ?5, country = ?6,
                   version = version + 1, updated_at = ?7
               WHERE id = ?8 AND version = ?9"#,
            params![
                &entity.name,
                &entity.street_addr,
                &entity.city,
                &entity.state,
                &entity.zip_code,
                &entity.country,
                now,
                entity.id,
                entity.version,
            ],
        )?;
        check_versioned_update(&conn, EntityKind::Grower, entity.id, entity.version, rows_affected)?;

        Ok(Stored {
            version: entity.version + 1,
            updated_at: now,
            ..entity.clone()
        })
    }

    fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute("DELETE FROM grower WHERE id = ?1", params![id])?;
        check_deleted(EntityKind::Grower, id, rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn setup_repo() -> GrowerRepository {
        GrowerRepository::new(Arc::new(Mutex::new(open_in_memory().unwrap())))
    }

    #[test]
    fn test_insert_and_find() {
        let repo = setup_repo();
        let mut grower = Grower::new("Acme");
        grower.city = Some("Fresno".to_string());
        let stored = repo.insert(grower).unwrap();

        assert_eq!(stored.version, 1);
        assert_eq!(stored.created_at, stored.updated_at);

        let found = repo.find_by_id(stored.id).unwrap().unwrap();
        assert_eq!(found.name, "Acme");
        assert_eq!(found.city.as_deref(), Some("Fresno"));
        assert_eq!(found.version, 1);
    }

    #[test]
    fn test_find_by_name_returns_all_matches() {
        let repo = setup_repo();
        repo.insert(Grower::new("Acme")).unwrap();
        repo.insert(Grower::new("Acme")).unwrap();
        repo.insert(Grower::new("Other")).unwrap();

        assert_eq!(repo.find_by_name(None, "Acme").unwrap().len(), 2);
        assert_eq!(repo.find_by_name(None, "Missing").unwrap().len(), 0);
        assert_eq!(repo.list(None).unwrap().len(), 3);
    }

    #[test]
    fn test_insert_rejects_invalid() {
        let repo = setup_repo();
        let result = repo.insert(Grower::new(""));
        assert!(matches!(result, Err(RepositoryError::ValidationFailed(_))));
        assert!(repo.list(None).unwrap().is_empty());
    }

    #[test]
    fn test_save_increments_version() {
        let repo = setup_repo();
        let mut stored = repo.insert(Grower::new("Acme")).unwrap();
        stored.data.country = Some("US".to_string());

        let saved = repo.save(&stored).unwrap();
        assert_eq!(saved.version, 2);
        assert!(saved.updated_at >= stored.updated_at);
        assert_eq!(saved.created_at, stored.created_at);

        let found = repo.find_by_id(stored.id).unwrap().unwrap();
        assert_eq!(found.version, 2);
        assert_eq!(found.country.as_deref(), Some("US"));
    }

    #[test]
    fn test_delete_missing() {
        let repo = setup_repo();
        assert!(matches!(repo.delete(42), Err(RepositoryError::NotFound { .. })));
    }
}
