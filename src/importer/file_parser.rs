// ==========================================
// 农场地块管理系统 - 文件解析器实现
// ==========================================
// 支持: CSV 文本 / CSV (.csv) / Excel (.xlsx/.xls)
// 输出: RawTable（表头 + 按序数据行），不做任何业务校验
// ==========================================

use crate::config::import_config_trait::{DEFAULT_DELIMITER, DEFAULT_SKIP_BLANK_ROWS};
use crate::domain::import::RawTable;
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
pub trait FileParser: Send + Sync {
    /// 解析文件为原始表格
    fn parse_file(&self, file_path: &Path) -> ImportResult<RawTable>;
}

fn clean_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|v| v.is_empty())
}

fn check_exists(path: &Path) -> ImportResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ImportError::FileNotFound(path.display().to_string()))
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// CSV Parser 实现
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct CsvParser {
    delimiter: u8,
    skip_blank_rows: bool,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER, DEFAULT_SKIP_BLANK_ROWS)
    }
}

impl CsvParser {
    pub fn new(delimiter: u8, skip_blank_rows: bool) -> Self {
        Self {
            delimiter,
            skip_blank_rows,
        }
    }

    /// 解析内存中的 CSV 文本（首行为表头）
    pub fn parse_text(&self, text: &str) -> ImportResult<RawTable> {
        self.parse_reader(text.as_bytes())
    }

    fn parse_reader<R: Read>(&self, source: R) -> ImportResult<RawTable> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .flexible(true) // 允许行长度不一致
            .from_reader(source);

        let header_record = reader.headers()?;
        let header_line = header_record.position().map_or(1, |p| p.line());
        let mut table = RawTable {
            headers: header_record.iter().map(clean_header).collect(),
            ..Default::default()
        };

        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let row: Vec<String> = record.iter().map(|v| v.trim().to_string()).collect();

            if self.skip_blank_rows && is_blank(&row) {
                continue;
            }
            // 行号按源文件行计算，空行也占号
            let row_number = record
                .position()
                .map_or(idx + 1, |p| p.line().saturating_sub(header_line) as usize);
            table.push_row(row_number, row);
        }

        Ok(table)
    }
}

impl FileParser for CsvParser {
    fn parse_file(&self, file_path: &Path) -> ImportResult<RawTable> {
        check_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        self.parse_reader(file)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
// 只读第一个工作表，首行为表头
#[derive(Debug, Clone, Copy)]
pub struct ExcelParser {
    skip_blank_rows: bool,
}

impl Default for ExcelParser {
    fn default() -> Self {
        Self::new(DEFAULT_SKIP_BLANK_ROWS)
    }
}

impl ExcelParser {
    pub fn new(skip_blank_rows: bool) -> Self {
        Self { skip_blank_rows }
    }
}

impl FileParser for ExcelParser {
    fn parse_file(&self, file_path: &Path) -> ImportResult<RawTable> {
        check_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows_iter = range.rows();
        let mut table = RawTable {
            headers: match rows_iter.next() {
                Some(header_row) => header_row
                    .iter()
                    .map(|cell| clean_header(&cell.to_string()))
                    .collect(),
                None => Vec::new(),
            },
            ..Default::default()
        };

        for (idx, data_row) in rows_iter.enumerate() {
            let row: Vec<String> = data_row
                .iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect();

            if self.skip_blank_rows && is_blank(&row) {
                continue;
            }
            table.push_row(idx + 1, row);
        }

        Ok(table)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct UniversalFileParser {
    csv: CsvParser,
    excel: ExcelParser,
}

impl UniversalFileParser {
    pub fn new(delimiter: u8, skip_blank_rows: bool) -> Self {
        Self {
            csv: CsvParser::new(delimiter, skip_blank_rows),
            excel: ExcelParser::new(skip_blank_rows),
        }
    }
}

impl FileParser for UniversalFileParser {
    fn parse_file(&self, file_path: &Path) -> ImportResult<RawTable> {
        match extension_of(file_path).as_str() {
            "csv" => self.csv.parse_file(file_path),
            "xlsx" | "xls" => self.excel.parse_file(file_path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}
