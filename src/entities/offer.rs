// 🎁 Offer Entity - Something a member makes available to the group

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::transfer::format_timestamp;
use crate::query::{FieldValue, Queryable};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,

    /// Short public code, unique within the group
    pub code: String,

    pub name: String,
    pub content: String,
    pub category: String,

    /// Free text price, e.g. "2 hours"
    pub price: String,

    /// Member ID offering (foreign key)
    pub member_id: String,

    /// Group ID (foreign key)
    pub group_id: String,

    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl Offer {
    pub fn attributes(&self) -> serde_json::Value {
        json!({
            "code": self.code,
            "name": self.name,
            "content": self.content,
            "category": self.category,
            "price": self.price,
            "created": format_timestamp(&self.created),
            "updated": format_timestamp(&self.updated),
            "expires": format_timestamp(&self.expires),
        })
    }
}

impl Queryable for Offer {
    const FIELDS: &'static [&'static str] = &[
        "id", "code", "name", "content", "category", "price", "member", "group", "created",
        "updated", "expires",
    ];
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "content", "category"];

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::text(&self.id)),
            "code" => Some(FieldValue::text(&self.code)),
            "name" => Some(FieldValue::text(&self.name)),
            "content" => Some(FieldValue::text(&self.content)),
            "category" => Some(FieldValue::text(&self.category)),
            "price" => Some(FieldValue::text(&self.price)),
            "member" => Some(FieldValue::text(&self.member_id)),
            "group" => Some(FieldValue::text(&self.group_id)),
            "created" => Some(FieldValue::Time(self.created)),
            "updated" => Some(FieldValue::Time(self.updated)),
            "expires" => Some(FieldValue::Time(self.expires)),
            _ => None,
        }
    }
}
