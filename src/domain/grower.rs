// ==========================================
// 农场地块管理系统 - 种植户领域模型
// ==========================================
// 层级根节点: Grower 拥有 Farm
// 名称唯一性由导入解析器保证（schema 不约束）
// ==========================================

use crate::domain::record::{AttributeSetter, Entity};
use crate::domain::types::EntityKind;
use crate::domain::validation::{
    check_optional_text, check_required_text, normalize_optional, FieldError, ValidationErrors,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grower {
    pub name: String,
    pub street_addr: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

impl Grower {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

fn set_street_addr(g: &mut Grower, v: &str) -> Result<(), FieldError> {
    g.street_addr = normalize_optional(v);
    Ok(())
}

fn set_city(g: &mut Grower, v: &str) -> Result<(), FieldError> {
    g.city = normalize_optional(v);
    Ok(())
}

fn set_state(g: &mut Grower, v: &str) -> Result<(), FieldError> {
    g.state = normalize_optional(v);
    Ok(())
}

fn set_zip_code(g: &mut Grower, v: &str) -> Result<(), FieldError> {
    g.zip_code = normalize_optional(v);
    Ok(())
}

fn set_country(g: &mut Grower, v: &str) -> Result<(), FieldError> {
    g.country = normalize_optional(v);
    Ok(())
}

impl Entity for Grower {
    const KIND: EntityKind = EntityKind::Grower;

    const ATTRIBUTES: &'static [(&'static str, AttributeSetter<Self>)] = &[
        ("street_addr", set_street_addr),
        ("city", set_city),
        ("state", set_state),
        ("zip_code", set_zip_code),
        ("country", set_country),
    ];

    fn name(&self) -> &str {
        &self.name
    }

    fn parent_id(&self) -> Option<i64> {
        None
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_required_text(&mut errors, "name", &self.name);
        check_optional_text(&mut errors, "street_addr", self.street_addr.as_deref());
        check_optional_text(&mut errors, "city", self.city.as_deref());
        check_optional_text(&mut errors, "state", self.state.as_deref());
        check_optional_text(&mut errors, "zip_code", self.zip_code.as_deref());
        check_optional_text(&mut errors, "country", self.country.as_deref());
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::AttributeError;

    #[test]
    fn test_apply_allowed_attributes() {
        let mut grower = Grower::new("Acme");
        grower.apply_attribute("city", " Fresno ").unwrap();
        grower.apply_attribute("zip_code", "93650").unwrap();
        grower.apply_attribute("country", "").unwrap();

        assert_eq!(grower.city.as_deref(), Some("Fresno"));
        assert_eq!(grower.zip_code.as_deref(), Some("93650"));
        assert_eq!(grower.country, None);
    }

    #[test]
    fn test_reject_unknown_attribute() {
        let mut grower = Grower::new("Acme");
        let err = grower.apply_attribute("name", "Other").unwrap_err();
        assert!(matches!(err, AttributeError::Unknown { entity: EntityKind::Grower, .. }));
        assert_eq!(grower.name, "Acme");
    }

    #[test]
    fn test_validate_blank_name() {
        let errors = Grower::new("").validate().unwrap_err();
        assert_eq!(errors.messages(), vec!["name: This field cannot be blank."]);
    }

    #[test]
    fn test_validate_long_address() {
        let mut grower = Grower::new("Acme");
        grower.street_addr = Some("a".repeat(150));
        let errors = grower.validate().unwrap_err();
        assert!(errors.messages()[0].starts_with("street_addr:"));
    }
}
