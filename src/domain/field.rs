// ==========================================
// 农场地块管理系统 - 地块领域模型
// ==========================================
// 上级: Farm（级联删除）
// 约束: area 必填且 ≥ 0.0001（英亩）
// 导入时已存在的地块会被更新 area（面积随季节变化）
// ==========================================

use crate::domain::record::{AttributeSetter, Entity};
use crate::domain::types::EntityKind;
use crate::domain::validation::{check_area, check_required_text, parse_float, FieldError, ValidationErrors};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub area: Option<f64>,
    #[serde(rename = "farm")]
    pub farm_id: i64,
}

impl Field {
    pub fn new(name: impl Into<String>, farm_id: i64) -> Self {
        Self {
            name: name.into(),
            area: None,
            farm_id,
        }
    }

    pub fn with_area(mut self, area: f64) -> Self {
        self.area = Some(area);
        self
    }
}

// 空值视为未填写，由 validate 报告
fn set_area(f: &mut Field, v: &str) -> Result<(), FieldError> {
    f.area = if v.trim().is_empty() {
        None
    } else {
        Some(parse_float("area", v)?)
    };
    Ok(())
}

impl Entity for Field {
    const KIND: EntityKind = EntityKind::Field;

    const ATTRIBUTES: &'static [(&'static str, AttributeSetter<Self>)] = &[("area", set_area)];

    fn name(&self) -> &str {
        &self.name
    }

    fn parent_id(&self) -> Option<i64> {
        Some(self.farm_id)
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_required_text(&mut errors, "name", &self.name);
        check_area(&mut errors, self.area);
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::AttributeError;

    #[test]
    fn test_set_area() {
        let mut field = Field::new("F1", 1);
        field.apply_attribute("area", "12.5").unwrap();
        assert_eq!(field.area, Some(12.5));
        assert!(field.validate().is_ok());
    }

    #[test]
    fn test_set_area_not_a_number() {
        let mut field = Field::new("F1", 1).with_area(3.0);
        let err = field.apply_attribute("area", "lots").unwrap_err();
        assert_eq!(err.to_string(), "area: 'lots' value must be a float.");
        assert!(matches!(err, AttributeError::Invalid(_)));
        assert_eq!(field.area, Some(3.0));
    }

    #[test]
    fn test_blank_area_clears_value() {
        let mut field = Field::new("F1", 1).with_area(3.0);
        field.apply_attribute("area", "  ").unwrap();
        assert_eq!(field.area, None);
    }

    #[test]
    fn test_validate_missing_area() {
        let errors = Field::new("F1", 1).validate().unwrap_err();
        assert_eq!(errors.messages(), vec!["area: This field cannot be null."]);
    }

    #[test]
    fn test_validate_below_min_area() {
        let errors = Field::new("F1", 1).with_area(0.00001).validate().unwrap_err();
        assert_eq!(errors.messages(), vec!["area: Area must be at least 0.0001 acres."]);
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let errors = Field::new("", 1).with_area(0.0).validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.messages()[0], "name: This field cannot be blank.");
    }
}
