// ==========================================
// 农场地块管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 所有仓储共享同一数据库连接
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::api::{FarmApi, FieldApi, GrowerApi, ImportApi};
use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::importer::FieldImporter;
use crate::repository::{FarmRepository, FieldRepository, GrowerRepository};

/// 应用状态
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 共享数据库连接
    pub conn: Arc<Mutex<Connection>>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 地块API
    pub field_api: Arc<FieldApi>,

    /// 农场API
    pub farm_api: Arc<FarmApi>,

    /// 种植户API
    pub grower_api: Arc<GrowerApi>,

    /// 导入API
    pub import_api: Arc<ImportApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并初始化表结构（幂等）
    /// 2. 初始化所有Repository
    /// 3. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("无法初始化数据库表结构: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let grower_repo = Arc::new(GrowerRepository::new(conn.clone()));
        let farm_repo = Arc::new(FarmRepository::new(conn.clone()));
        let field_repo = Arc::new(FieldRepository::new(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let importer = Arc::new(FieldImporter::new(
            grower_repo.clone(),
            farm_repo.clone(),
            field_repo.clone(),
            config_manager.clone(),
        ));

        let field_api = Arc::new(FieldApi::new(
            grower_repo.clone(),
            farm_repo.clone(),
            field_repo,
        ));
        let farm_api = Arc::new(FarmApi::new(grower_repo.clone(), farm_repo));
        let grower_api = Arc::new(GrowerApi::new(grower_repo));
        let import_api = Arc::new(ImportApi::new(importer));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            conn,
            config_manager,
            field_api,
            farm_api,
            grower_api,
            import_api,
        })
    }

    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 FIELD_MGMT_DB_PATH（非空时）
/// - 用户数据目录/field-mgmt/field_mgmt.db
/// - 回退: ./field_mgmt.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("FIELD_MGMT_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./field_mgmt.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("field-mgmt");
        // 目录创建失败时使用当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("field_mgmt.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_app_state_initializes_schema() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("state.db").to_string_lossy().to_string();

        let state = AppState::new(db_path.clone()).unwrap();
        assert_eq!(state.get_db_path(), db_path);
        assert!(state.grower_api.list().unwrap().is_empty());

        // 再次打开同一数据库不报错
        drop(state);
        assert!(AppState::new(db_path).is_ok());
    }
}
