// 🔁 Transfer Entity - Movement of value between two accounts
//
// Lifecycle: pending → committed | rejected
// The expiry date lives inside the pending state, so a committed or
// rejected transfer cannot carry one.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::query::{FieldValue, Queryable};

// ============================================================================
// TRANSFER STATE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum TransferState {
    /// Waiting for the payer (or an administrator) to accept it
    Pending { expires: DateTime<Utc> },

    /// Accepted and applied to both balances
    Committed,

    /// Refused, never applied
    Rejected,
}

impl TransferState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Pending { .. } => "pending",
            TransferState::Committed => "committed",
            TransferState::Rejected => "rejected",
        }
    }

    pub fn expires(&self) -> Option<DateTime<Utc>> {
        match self {
            TransferState::Pending { expires } => Some(*expires),
            _ => None,
        }
    }
}

// ============================================================================
// TRANSFER ENTITY
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    /// Stable identity (UUID)
    pub id: String,

    /// Amount in scaled integer units
    pub amount: i64,

    /// Free text concept
    pub meta: String,

    pub state: TransferState,

    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,

    /// Account ID paying (foreign key, no inverse relation)
    pub payer_id: String,

    /// Account ID receiving (foreign key, no inverse relation)
    pub payee_id: String,

    /// Currency ID (foreign key)
    pub currency_id: String,
}

impl Transfer {
    pub fn expires(&self) -> Option<DateTime<Utc>> {
        self.state.expires()
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, TransferState::Pending { .. })
    }

    /// Check if the given account takes part in this transfer
    pub fn involves(&self, account_id: &str) -> bool {
        self.payer_id == account_id || self.payee_id == account_id
    }

    /// JSON:API attributes object
    pub fn attributes(&self) -> serde_json::Value {
        let mut attrs = json!({
            "amount": self.amount,
            "meta": self.meta,
            "state": self.state.as_str(),
            "created": format_timestamp(&self.created),
            "updated": format_timestamp(&self.updated),
        });
        if let Some(expires) = self.expires() {
            attrs["expires"] = json!(format_timestamp(&expires));
        }
        attrs
    }
}

/// ISO 8601 with milliseconds, the format browsers produce with `toJSON()`
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Queryable for Transfer {
    const FIELDS: &'static [&'static str] = &[
        "id", "amount", "meta", "state", "created", "updated", "expires", "payer", "payee", "currency",
    ];
    const SEARCH_FIELDS: &'static [&'static str] = &["meta"];

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::text(&self.id)),
            "amount" => Some(FieldValue::Int(self.amount)),
            "meta" => Some(FieldValue::text(&self.meta)),
            "state" => Some(FieldValue::text(self.state.as_str())),
            "created" => Some(FieldValue::Time(self.created)),
            "updated" => Some(FieldValue::Time(self.updated)),
            "expires" => Some(self.expires().map_or(FieldValue::Null, FieldValue::Time)),
            "payer" => Some(FieldValue::text(&self.payer_id)),
            "payee" => Some(FieldValue::text(&self.payee_id)),
            "currency" => Some(FieldValue::text(&self.currency_id)),
            _ => None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
