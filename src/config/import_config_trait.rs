// ==========================================
// 农场地块管理系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use std::error::Error;
use std::sync::Arc;

/// CSV 默认分隔符
pub const DEFAULT_DELIMITER: u8 = b',';

/// 默认跳过空白行
pub const DEFAULT_SKIP_BLANK_ROWS: bool = true;

/// 导入更新地块面积时，版本冲突的默认重试次数
pub const DEFAULT_CONFLICT_RETRIES: u32 = 2;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）、DefaultImportConfig
pub trait ImportConfigReader: Send + Sync {
    /// 获取 CSV 分隔符（单字节）
    ///
    /// # 默认值
    /// - ','
    fn get_delimiter(&self) -> Result<u8, Box<dyn Error + Send + Sync>>;

    /// 是否跳过完全空白的行（跳过的行不计入 records_read）
    ///
    /// # 默认值
    /// - true
    fn get_skip_blank_rows(&self) -> Result<bool, Box<dyn Error + Send + Sync>>;

    /// 地块面积更新遇到乐观锁冲突时的重读重试次数
    ///
    /// # 默认值
    /// - 2
    fn get_conflict_retries(&self) -> Result<u32, Box<dyn Error + Send + Sync>>;
}

// ==========================================
// DefaultImportConfig - 固定默认值
// ==========================================
// 用途: 无数据库配置时（单元测试、内存导入）
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultImportConfig;

impl ImportConfigReader for DefaultImportConfig {
    fn get_delimiter(&self) -> Result<u8, Box<dyn Error + Send + Sync>> {
        Ok(DEFAULT_DELIMITER)
    }

    fn get_skip_blank_rows(&self) -> Result<bool, Box<dyn Error + Send + Sync>> {
        Ok(DEFAULT_SKIP_BLANK_ROWS)
    }

    fn get_conflict_retries(&self) -> Result<u32, Box<dyn Error + Send + Sync>> {
        Ok(DEFAULT_CONFLICT_RETRIES)
    }
}

// 共享配置（API 层在多个导入任务间共用同一 ConfigManager）
impl<T: ImportConfigReader + ?Sized> ImportConfigReader for Arc<T> {
    fn get_delimiter(&self) -> Result<u8, Box<dyn Error + Send + Sync>> {
        (**self).get_delimiter()
    }

    fn get_skip_blank_rows(&self) -> Result<bool, Box<dyn Error + Send + Sync>> {
        (**self).get_skip_blank_rows()
    }

    fn get_conflict_retries(&self) -> Result<u32, Box<dyn Error + Send + Sync>> {
        (**self).get_conflict_retries()
    }
}
