// 💱 Currency Entity - Unit of account for one community
//
// A currency is identified by its code (the group code, e.g. "GRP0").
// Accounts and transfers point to it by id; it never points back.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::query::{FieldValue, Queryable};

// ============================================================================
// STATISTICS
// ============================================================================

/// Aggregate figures shown on the currency page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrencyStats {
    pub transactions: u64,
    pub exchanges: u64,
    pub circulation: u64,
}

// ============================================================================
// CURRENCY ENTITY
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Currency {
    /// Stable identity (UUID)
    pub id: String,

    /// Public code, unique across the accounting service
    pub code: String,

    /// Code type ("CEN" for community exchange network codes)
    pub code_type: String,

    /// Singular display name
    pub name: String,

    /// Plural display name
    pub name_plural: String,

    /// Display symbol
    pub symbol: String,

    /// Decimal digits shown to users
    pub decimals: u32,

    /// Value relative to the hour-based exchange unit
    pub value: i64,

    /// Amounts are stored as integers scaled by 10^scale
    pub scale: u32,

    pub stats: CurrencyStats,
}

impl Currency {
    /// Convert a stored integer amount to its display value
    ///
    /// Example: scale 4, amount 12_500 → 1.25
    pub fn to_display(&self, amount: i64) -> f64 {
        amount as f64 / 10f64.powi(self.scale as i32)
    }

    /// JSON:API attributes object
    pub fn attributes(&self) -> serde_json::Value {
        json!({
            "codeType": self.code_type,
            "code": self.code,
            "name": self.name,
            "namePlural": self.name_plural,
            "symbol": self.symbol,
            "decimals": self.decimals,
            "value": self.value,
            "scale": self.scale,
            "stats": self.stats,
        })
    }
}

impl Queryable for Currency {
    const FIELDS: &'static [&'static str] = &["id", "code", "codeType", "name", "namePlural", "symbol", "decimals", "value", "scale"];
    const SEARCH_FIELDS: &'static [&'static str] = &["code", "name", "namePlural", "symbol"];

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::text(&self.id)),
            "code" => Some(FieldValue::text(&self.code)),
            "codeType" => Some(FieldValue::text(&self.code_type)),
            "name" => Some(FieldValue::text(&self.name)),
            "namePlural" => Some(FieldValue::text(&self.name_plural)),
            "symbol" => Some(FieldValue::text(&self.symbol)),
            "decimals" => Some(FieldValue::Int(self.decimals as i64)),
            "value" => Some(FieldValue::Int(self.value)),
            "scale" => Some(FieldValue::Int(self.scale as i64)),
            _ => None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
