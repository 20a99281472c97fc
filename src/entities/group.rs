// 👥 Social Entities - Groups and their members
//
// Owned by the social service. Accounting seeding back-fills
// `Group::currency_id` and `Member::account_id`; nothing else mutates them.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::query::{FieldValue, Queryable};

// ============================================================================
// GROUP
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: String,

    /// Public code, e.g. "GRP0"
    pub code: String,

    pub name: String,

    /// Currency ID, set when the accounting fixtures are seeded
    pub currency_id: Option<String>,
}

impl Group {
    pub fn attributes(&self) -> serde_json::Value {
        json!({
            "code": self.code,
            "name": self.name,
        })
    }
}

impl Queryable for Group {
    const FIELDS: &'static [&'static str] = &["id", "code", "name"];
    const SEARCH_FIELDS: &'static [&'static str] = &["code", "name"];

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::text(&self.id)),
            "code" => Some(FieldValue::text(&self.code)),
            "name" => Some(FieldValue::text(&self.name)),
            _ => None,
        }
    }
}

// ============================================================================
// MEMBER
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: String,

    pub name: String,

    /// Group ID (foreign key)
    pub group_id: String,

    /// Account ID, set when the accounting fixtures are seeded
    pub account_id: Option<String>,
}

impl Member {
    pub fn attributes(&self) -> serde_json::Value {
        json!({ "name": self.name })
    }
}

impl Queryable for Member {
    const FIELDS: &'static [&'static str] = &["id", "name", "group", "account"];
    const SEARCH_FIELDS: &'static [&'static str] = &["name"];

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::text(&self.id)),
            "name" => Some(FieldValue::text(&self.name)),
            "group" => Some(FieldValue::text(&self.group_id)),
            "account" => Some(
                self.account_id
                    .as_deref()
                    .map_or(FieldValue::Null, FieldValue::text),
            ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_without_account() {
        let member = Member {
            id: "m-1".to_string(),
            name: "Esteban Baby".to_string(),
            group_id: "g-1".to_string(),
            account_id: None,
        };
        assert_eq!(member.field("account"), Some(FieldValue::Null));
        assert_eq!(member.attributes()["name"], "Esteban Baby");
    }
}
