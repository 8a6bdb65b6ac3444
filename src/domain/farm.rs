// ==========================================
// 农场地块管理系统 - 农场领域模型
// ==========================================
// 上级: Grower（级联删除）
// ==========================================

use crate::domain::record::{AttributeSetter, Entity};
use crate::domain::types::EntityKind;
use crate::domain::validation::{check_required_text, ValidationErrors};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Farm {
    pub name: String,
    #[serde(rename = "grower")]
    pub grower_id: i64,
}

impl Farm {
    pub fn new(name: impl Into<String>, grower_id: i64) -> Self {
        Self {
            name: name.into(),
            grower_id,
        }
    }
}

impl Entity for Farm {
    const KIND: EntityKind = EntityKind::Farm;

    // 农场除名称外无可写属性
    const ATTRIBUTES: &'static [(&'static str, AttributeSetter<Self>)] = &[];

    fn name(&self) -> &str {
        &self.name
    }

    fn parent_id(&self) -> Option<i64> {
        Some(self.grower_id)
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_required_text(&mut errors, "name", &self.name);
        errors.into_result()
    }
}
