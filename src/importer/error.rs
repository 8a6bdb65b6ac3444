// ==========================================
// 农场地块管理系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 范围: 只覆盖整批失败（文件、格式、配置、基础设施）
//       行级失败进入 ImportErrors，不走此类型
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 配置错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    // ===== 基础设施错误 =====
    #[error("数据访问失败: {0}")]
    Repository(#[from] RepositoryError),
}

impl ImportError {
    pub fn config(key: &str, err: impl std::fmt::Display) -> Self {
        ImportError::ConfigReadError {
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
