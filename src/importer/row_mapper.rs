// ==========================================
// 农场地块管理系统 - 行映射器
// ==========================================
// 职责: RawTable 数据行 → ImportRow
// 前置: 调用方已完成必需列检查（missing_columns 为空）
// ==========================================

use crate::domain::import::{ImportRow, RawTable, GROWER_ATTRIBUTE_COLUMNS};

/// 列位置缓存（每批计算一次）
#[derive(Debug, Clone)]
pub struct RowMapper {
    grower_name: Option<usize>,
    farm_name: Option<usize>,
    field_name: Option<usize>,
    area: Option<usize>,
    grower_attributes: Vec<(&'static str, usize)>,
}

impl RowMapper {
    pub fn for_table(table: &RawTable) -> Self {
        Self {
            grower_name: table.column_index("grower_name"),
            farm_name: table.column_index("farm_name"),
            field_name: table.column_index("field_name"),
            area: table.column_index("area"),
            grower_attributes: GROWER_ATTRIBUTE_COLUMNS
                .iter()
                .filter_map(|col| table.column_index(col).map(|idx| (*col, idx)))
                .collect(),
        }
    }

    /// # 参数
    /// - row_number: 数据行号（从 1 开始）
    pub fn map_row(&self, cells: &[String], row_number: usize) -> ImportRow {
        let grower_attributes = self
            .grower_attributes
            .iter()
            .filter_map(|(col, idx)| {
                let value = cell(cells, Some(*idx));
                (!value.is_empty()).then(|| (col.to_string(), value))
            })
            .collect();

        ImportRow {
            row_number,
            grower_name: cell(cells, self.grower_name),
            farm_name: cell(cells, self.farm_name),
            field_name: cell(cells, self.field_name),
            grower_attributes,
            // area 总是下发：空值由校验报 "cannot be null"
            field_attributes: vec![("area".to_string(), cell(cells, self.area))],
        }
    }
}

fn cell(cells: &[String], idx: Option<usize>) -> String {
    idx.and_then(|i| cells.get(i))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}
