// ==========================================
// 农场地块管理系统 - 实体校验
// ==========================================
// 职责: 字段级约束（必填/长度/最小面积）
// 约束: 校验失败只返回错误列表，不 panic
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 名称/地址类字段的最大长度
pub const MAX_TEXT_LENGTH: usize = 100;

/// 地块最小面积（英亩）
pub const MIN_FIELD_AREA: f64 = 0.0001;

// ==========================================
// FieldError - 单个字段的校验错误
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

// ==========================================
// ValidationErrors - 有序错误列表
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// 按 "字段: 消息" 格式输出每条错误
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }

    /// 空列表视为校验通过
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<FieldError> for ValidationErrors {
    fn from(error: FieldError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

// ==========================================
// 通用校验函数
// ==========================================

/// 必填文本：非空白且不超长
pub fn check_required_text(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "This field cannot be blank."));
        return;
    }
    check_text_length(errors, field, value);
}

/// 可选文本：仅校验长度
pub fn check_optional_text(errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
    if let Some(v) = value {
        check_text_length(errors, field, v);
    }
}

fn check_text_length(errors: &mut ValidationErrors, field: &str, value: &str) {
    let len = value.chars().count();
    if len > MAX_TEXT_LENGTH {
        errors.push(FieldError::new(
            field,
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                MAX_TEXT_LENGTH, len
            ),
        ));
    }
}

/// 面积：必填、有限、≥ MIN_FIELD_AREA
pub fn check_area(errors: &mut ValidationErrors, area: Option<f64>) {
    match area {
        None => errors.push(FieldError::new("area", "This field cannot be null.")),
        Some(v) if !v.is_finite() => {
            errors.push(FieldError::new("area", "Area must be a finite number."))
        }
        Some(v) if v < MIN_FIELD_AREA => errors.push(FieldError::new(
            "area",
            "Area must be at least 0.0001 acres.",
        )),
        Some(_) => {}
    }
}

/// 解析浮点数属性值
pub fn parse_float(field: &str, raw: &str) -> Result<f64, FieldError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| FieldError::new(field, format!("'{}' value must be a float.", raw.trim())))
}

/// 可选文本标准化：空白视为 None
pub fn normalize_optional(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text_blank() {
        let mut errors = ValidationErrors::new();
        check_required_text(&mut errors, "name", "   ");
        assert_eq!(errors.messages(), vec!["name: This field cannot be blank."]);
    }

    #[test]
    fn test_text_too_long() {
        let mut errors = ValidationErrors::new();
        check_required_text(&mut errors, "name", &"x".repeat(101));
        assert_eq!(errors.len(), 1);
        assert!(errors.messages()[0].contains("at most 100 characters (it has 101)"));
    }

    #[test]
    fn test_area_boundaries() {
        let mut errors = ValidationErrors::new();
        check_area(&mut errors, Some(MIN_FIELD_AREA));
        assert!(errors.is_empty());

        check_area(&mut errors, Some(0.00001));
        check_area(&mut errors, None);
        check_area(&mut errors, Some(f64::NAN));
        assert_eq!(
            errors.messages(),
            vec![
                "area: Area must be at least 0.0001 acres.",
                "area: This field cannot be null.",
                "area: Area must be a finite number.",
            ]
        );
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float("area", " 12.5 ").unwrap(), 12.5);
        let err = parse_float("area", "abc").unwrap_err();
        assert_eq!(err.to_string(), "area: 'abc' value must be a float.");
    }

    #[test]
    fn test_into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());
        let errors: ValidationErrors = FieldError::new("name", "bad").into();
        assert!(errors.into_result().is_err());
    }
}
