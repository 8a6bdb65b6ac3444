// ==========================================
// 农场地块管理系统 - 导入领域模型
// ==========================================
// 用途: 导入管道中间产物 + 汇总报告
// ==========================================

use serde::{Deserialize, Serialize};

/// 导入必需列（顺序即缺失错误的输出顺序）
pub const REQUIRED_COLUMNS: [&str; 4] = ["grower_name", "farm_name", "field_name", "area"];

/// 可选的种植户地址列
pub const GROWER_ATTRIBUTE_COLUMNS: [&str; 5] =
    ["street_addr", "city", "state", "zip_code", "country"];

// ==========================================
// ImportRow - 单行导入数据
// ==========================================
// 生命周期: 仅在导入流程内
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRow {
    pub row_number: usize, // 源文件数据行号（从 1 开始，不含表头；跳过的空行仍占号）
    pub grower_name: String,
    pub farm_name: String,
    pub field_name: String,
    pub grower_attributes: Vec<(String, String)>, // 只包含行中出现且非空的列
    pub field_attributes: Vec<(String, String)>,
}

// ==========================================
// RawTable - 文件解析结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub row_numbers: Vec<usize>, // 与 rows 一一对应；为空时按 rows 下标编号
}

impl RawTable {
    pub fn push_row(&mut self, row_number: usize, cells: Vec<String>) {
        self.row_numbers.push(row_number);
        self.rows.push(cells);
    }

    /// (源数据行号, 单元格)，按出现顺序
    pub fn numbered_rows(&self) -> impl Iterator<Item = (usize, &[String])> + '_ {
        self.rows.iter().enumerate().map(move |(idx, cells)| {
            let number = self.row_numbers.get(idx).copied().unwrap_or(idx + 1);
            (number, cells.as_slice())
        })
    }

    /// 表头中缺失的必需列
    pub fn missing_columns(&self) -> Vec<&'static str> {
        REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|col| !self.headers.iter().any(|h| h == col))
            .collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

// ==========================================
// ImportErrors - 错误收集器
// ==========================================
// 显式传递给解析器/编排器，按发现顺序累积
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportErrors {
    messages: Vec<String>,
}

impl ImportErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.messages
    }

    pub fn into_vec(self) -> Vec<String> {
        self.messages
    }
}

// ==========================================
// ImportReport - 导入汇总报告
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub records_read: usize,
    pub records_processed: usize,
    pub success: bool, // 仅当 errors 为空时为 true
    pub errors: Vec<String>,
}

impl ImportReport {
    /// 表头校验失败：不处理任何行
    pub fn rejected(errors: ImportErrors) -> Self {
        Self {
            records_read: 0,
            records_processed: 0,
            success: false,
            errors: errors.into_vec(),
        }
    }

    pub fn completed(records_read: usize, records_processed: usize, errors: ImportErrors) -> Self {
        Self {
            records_read,
            records_processed,
            success: errors.is_empty(),
            errors: errors.into_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_in_required_order() {
        let table = RawTable {
            headers: vec!["area".to_string(), "grower_name".to_string()],
            ..Default::default()
        };
        assert_eq!(table.missing_columns(), vec!["farm_name", "field_name"]);
    }

    #[test]
    fn test_numbered_rows_keep_source_positions() {
        let mut table = RawTable::default();
        table.push_row(1, vec!["a".to_string()]);
        table.push_row(4, vec!["b".to_string()]);

        let numbers: Vec<usize> = table.numbered_rows().map(|(n, _)| n).collect();
        assert_eq!(numbers, vec![1, 4]);

        let hand_built = RawTable {
            rows: vec![vec![], vec![]],
            ..Default::default()
        };
        let numbers: Vec<usize> = hand_built.numbered_rows().map(|(n, _)| n).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn test_report_success_flag() {
        let report = ImportReport::completed(2, 2, ImportErrors::new());
        assert!(report.success);

        let mut errors = ImportErrors::new();
        errors.push("Row 1: boom");
        let report = ImportReport::completed(2, 1, errors);
        assert!(!report.success);
        assert_eq!(report.errors, vec!["Row 1: boom"]);
    }

    #[test]
    fn test_rejected_report_is_empty() {
        let mut errors = ImportErrors::new();
        errors.push("Missing required column: area");
        let report = ImportReport::rejected(errors);
        assert_eq!(report.records_read, 0);
        assert_eq!(report.records_processed, 0);
        assert!(!report.success);
    }
}
