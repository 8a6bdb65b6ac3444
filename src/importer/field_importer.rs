// ==========================================
// 农场地块管理系统 - 地块数据导入器
// ==========================================
// 职责: 整合导入流程，从 CSV 文本 / 文件到数据库
// 流程: 解析 → 表头预检 → 逐行 (种植户 → 农场 → 地块) 解析 → 汇总
// 红线: 仅表头预检可使整批失败；行级失败只累积，不中断
// ==========================================

use crate::config::config_manager::config_keys;
use crate::config::ImportConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::farm::Farm;
use crate::domain::field::Field;
use crate::domain::grower::Grower;
use crate::domain::import::{ImportErrors, ImportReport, ImportRow, RawTable};
use crate::engine::resolver::{EntityResolver, Resolution};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{CsvParser, FileParser, UniversalFileParser};
use crate::importer::row_mapper::RowMapper;
use crate::repository::{
    EntityRepository, FarmRepository, FieldRepository, GrowerRepository, RepositoryError,
};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, instrument, warn, Span};
use uuid::Uuid;

/// 解析参数（每次导入读取一次配置）
struct ImportSettings {
    delimiter: u8,
    skip_blank_rows: bool,
    conflict_retries: u32,
}

// ==========================================
// FieldImporter - 地块数据导入器
// ==========================================
pub struct FieldImporter<C>
where
    C: ImportConfigReader,
{
    // 数据访问层
    growers: Arc<dyn EntityRepository<Grower>>,
    farms: Arc<dyn EntityRepository<Farm>>,
    fields: Arc<dyn EntityRepository<Field>>,

    // 配置读取器
    config: C,
}

impl<C> FieldImporter<C>
where
    C: ImportConfigReader,
{
    pub fn new(
        growers: Arc<dyn EntityRepository<Grower>>,
        farms: Arc<dyn EntityRepository<Farm>>,
        fields: Arc<dyn EntityRepository<Field>>,
        config: C,
    ) -> Self {
        Self {
            growers,
            farms,
            fields,
            config,
        }
    }

    /// 三个仓储共享同一连接
    pub fn from_connection(conn: Arc<Mutex<Connection>>, config: C) -> Self {
        Self::new(
            Arc::new(GrowerRepository::new(conn.clone())),
            Arc::new(FarmRepository::new(conn.clone())),
            Arc::new(FieldRepository::new(conn)),
            config,
        )
    }

    pub fn from_path(db_path: &str, config: C) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path).map_err(RepositoryError::from)?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn)), config))
    }

    /// 导入 CSV 文本（首行为表头）
    ///
    /// # 返回
    /// - Ok(ImportReport): 行级错误在 report.errors 中
    /// - Err: 文本无法解析或配置不可读；单行的数据访问错误记入 report.errors
    pub fn import_text(&self, text: &str) -> ImportResult<ImportReport> {
        let settings = self.load_settings()?;
        let table = CsvParser::new(settings.delimiter, settings.skip_blank_rows).parse_text(text)?;
        self.run(table, &settings, "<text>")
    }

    /// 导入文件（.csv / .xlsx / .xls）
    pub fn import_file<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ImportReport> {
        let settings = self.load_settings()?;
        let path = file_path.as_ref();
        let table = UniversalFileParser::new(settings.delimiter, settings.skip_blank_rows)
            .parse_file(path)?;
        self.run(table, &settings, &path.display().to_string())
    }

    /// 导入已解析的表格
    pub fn import_table(&self, table: RawTable) -> ImportResult<ImportReport> {
        let settings = self.load_settings()?;
        self.run(table, &settings, "<table>")
    }

    fn load_settings(&self) -> ImportResult<ImportSettings> {
        Ok(ImportSettings {
            delimiter: self
                .config
                .get_delimiter()
                .map_err(|e| ImportError::config(config_keys::IMPORT_DELIMITER, e))?,
            skip_blank_rows: self
                .config
                .get_skip_blank_rows()
                .map_err(|e| ImportError::config(config_keys::IMPORT_SKIP_BLANK_ROWS, e))?,
            conflict_retries: self
                .config
                .get_conflict_retries()
                .map_err(|e| ImportError::config(config_keys::IMPORT_CONFLICT_RETRIES, e))?,
        })
    }

    #[instrument(skip(self, table, settings), fields(batch_id))]
    fn run(
        &self,
        table: RawTable,
        settings: &ImportSettings,
        source: &str,
    ) -> ImportResult<ImportReport> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        Span::current().record("batch_id", batch_id.as_str());
        info!(source = %source, rows = table.rows.len(), "开始导入地块数据");

        // === 表头预检 ===
        let missing = table.missing_columns();
        if !missing.is_empty() {
            let mut errors = ImportErrors::new();
            for column in missing {
                warn!(column, "缺少必需列");
                errors.push(format!("Missing required column: {}", column));
            }
            return Ok(ImportReport::rejected(errors));
        }

        // === 逐行解析 ===
        let mapper = RowMapper::for_table(&table);
        let resolver = EntityResolver::new(
            self.growers.as_ref(),
            self.farms.as_ref(),
            self.fields.as_ref(),
            settings.conflict_retries,
        );

        let mut errors = ImportErrors::new();
        let mut records_read = 0;
        let mut records_processed = 0;

        for (row_number, cells) in table.numbered_rows() {
            let row = mapper.map_row(cells, row_number);
            records_read += 1;

            match process_row(&resolver, &row, &mut errors) {
                Ok(true) => records_processed += 1,
                Ok(false) => debug!(row = row.row_number, "行未处理"),
                Err(e) => {
                    // 基础设施故障同样只影响本行，继续处理后续行
                    warn!(row = row.row_number, error = %e, "行处理失败（数据访问错误）");
                    errors.push(format!("Row {}: {}", row.row_number, e));
                }
            }
        }

        let report = ImportReport::completed(records_read, records_processed, errors);
        info!(
            records_read = report.records_read,
            records_processed = report.records_processed,
            errors = report.errors.len(),
            success = report.success,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "导入完成"
        );
        Ok(report)
    }
}

/// 单行: 种植户 → 农场 → 地块，任一级未解析即跳过剩余层级
///
/// # 返回
/// - Ok(true): 地块已解析（计入 records_processed）
fn process_row(
    resolver: &EntityResolver<'_>,
    row: &ImportRow,
    errors: &mut ImportErrors,
) -> Result<bool, RepositoryError> {
    let n = row.row_number;

    let grower = match resolver.resolve_grower(n, &row.grower_name, &row.grower_attributes, errors)? {
        Resolution::Resolved(grower) => grower,
        Resolution::Unresolved => return Ok(false),
    };

    let farm = match resolver.resolve_farm(n, &grower, &row.farm_name, errors)? {
        Resolution::Resolved(farm) => farm,
        Resolution::Unresolved => return Ok(false),
    };

    let field = resolver.resolve_field(n, &farm, &row.field_name, &row.field_attributes, errors)?;
    Ok(field.is_resolved())
}
