// 🙋 Need Entity - Something a member is asking the group for
//
// Addressed by its short `code` inside a group, not by its UUID.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::transfer::format_timestamp;
use crate::query::{FieldValue, Queryable};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Need {
    pub id: String,

    /// Short public code, unique within the group, e.g. "Et-quae-po"
    pub code: String,

    /// Free text description
    pub content: String,

    pub category: String,

    /// Member ID asking (foreign key)
    pub member_id: String,

    /// Group ID (foreign key)
    pub group_id: String,

    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl Need {
    pub fn attributes(&self) -> serde_json::Value {
        json!({
            "code": self.code,
            "content": self.content,
            "category": self.category,
            "created": format_timestamp(&self.created),
            "updated": format_timestamp(&self.updated),
            "expires": format_timestamp(&self.expires),
        })
    }
}

impl Queryable for Need {
    const FIELDS: &'static [&'static str] = &[
        "id", "code", "content", "category", "member", "group", "created", "updated", "expires",
    ];
    const SEARCH_FIELDS: &'static [&'static str] = &["content", "category"];

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::text(&self.id)),
            "code" => Some(FieldValue::text(&self.code)),
            "content" => Some(FieldValue::text(&self.content)),
            "category" => Some(FieldValue::text(&self.category)),
            "member" => Some(FieldValue::text(&self.member_id)),
            "group" => Some(FieldValue::text(&self.group_id)),
            "created" => Some(FieldValue::Time(self.created)),
            "updated" => Some(FieldValue::Time(self.updated)),
            "expires" => Some(FieldValue::Time(self.expires)),
            _ => None,
        }
    }
}
