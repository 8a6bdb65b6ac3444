// ==========================================
// 农场地块管理系统 - 导入 API
// ==========================================
// 职责: 封装地块导入（CSV 文本 / 单文件 / 多文件并发）
// 约束: 导入核心为同步阻塞调用，经 spawn_blocking 执行
// ==========================================

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::import::ImportReport;
use crate::importer::FieldImporter;

/// 批量导入中单个文件的结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileImportOutcome {
    pub file_path: String,
    /// 导入报告（文件级失败时为 None）
    pub report: Option<ImportReport>,
    /// 文件级失败原因
    pub error: Option<String>,
}

impl FileImportOutcome {
    pub fn succeeded(&self) -> bool {
        self.report.as_ref().map(|r| r.success).unwrap_or(false)
    }
}

/// 导入API
pub struct ImportApi {
    importer: Arc<FieldImporter<Arc<ConfigManager>>>,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(importer: Arc<FieldImporter<Arc<ConfigManager>>>) -> Self {
        Self { importer }
    }

    /// 导入 CSV 文本
    ///
    /// # 返回
    /// - Ok(ImportReport): 行级错误在 report.errors 中
    /// - Err(ApiError): 文本无法解析或数据库不可用
    pub async fn import_csv(&self, text: String) -> ApiResult<ImportReport> {
        let importer = Arc::clone(&self.importer);
        let report = tokio::task::spawn_blocking(move || importer.import_text(&text))
            .await
            .map_err(|e| ApiError::InternalError(format!("导入任务失败: {}", e)))??;
        Ok(report)
    }

    /// 导入单个文件（.csv / .xlsx / .xls）
    pub async fn import_file(&self, file_path: impl Into<PathBuf>) -> ApiResult<ImportReport> {
        let importer = Arc::clone(&self.importer);
        let path = file_path.into();
        let report = tokio::task::spawn_blocking(move || importer.import_file(&path))
            .await
            .map_err(|e| ApiError::InternalError(format!("导入任务失败: {}", e)))??;
        Ok(report)
    }

    /// 并发导入多个文件，各文件互不影响
    pub async fn batch_import(&self, file_paths: Vec<PathBuf>) -> Vec<FileImportOutcome> {
        info!(files = file_paths.len(), "开始批量导入");

        let tasks = file_paths.into_iter().map(|path| async move {
            let file_path = path.display().to_string();
            match self.import_file(path).await {
                Ok(report) => FileImportOutcome {
                    file_path,
                    report: Some(report),
                    error: None,
                },
                Err(e) => {
                    warn!(file_path = %file_path, error = %e, "文件导入失败");
                    FileImportOutcome {
                        file_path,
                        report: None,
                        error: Some(e.to_string()),
                    }
                }
            }
        });

        let outcomes = join_all(tasks).await;
        info!(
            files = outcomes.len(),
            succeeded = outcomes.iter().filter(|o| o.succeeded()).count(),
            "批量导入完成"
        );
        outcomes
    }
}
