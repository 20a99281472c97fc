// 💳 Account Entity - Ledger entry point inside one currency
//
// "Account code is unique within its currency, the currency never changes"
//
// - Identity: UUID (used by transfers as payer/payee foreign key)
// - Code: public, e.g. "GRP00009" (group code + member index)
// - Relationship: currency_id → Currency entity (foreign key, fixed at creation)
// - Transfers are found through the store (payer_id / payee_id), not stored here

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::query::{FieldValue, Queryable};

/// Sentinel credit limit meaning "no limit".
pub const UNLIMITED: i64 = -1;

// ============================================================================
// ACCOUNT ENTITY
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Stable identity (UUID) - NEVER changes
    pub id: String,

    /// Account code, unique within the currency
    pub code: String,

    /// Currency ID (foreign key to Currency entity)
    currency_id: String,

    /// Current balance in scaled integer units
    pub balance: i64,

    /// Maximum positive balance (-1 = unlimited)
    pub credit_limit: i64,

    /// Maximum negative balance, as a positive number
    pub debit_limit: i64,
}

impl Account {
    /// Create new account bound to a currency
    pub fn new(
        id: String,
        code: String,
        currency_id: String,
        balance: i64,
        credit_limit: i64,
        debit_limit: i64,
    ) -> Self {
        Account {
            id,
            code,
            currency_id,
            balance,
            credit_limit,
            debit_limit,
        }
    }

    /// Currency this account belongs to
    pub fn currency_id(&self) -> &str {
        &self.currency_id
    }

    /// JSON:API attributes object
    pub fn attributes(&self) -> serde_json::Value {
        json!({
            "code": self.code,
            "balance": self.balance,
            "creditLimit": self.credit_limit,
            "debitLimit": self.debit_limit,
        })
    }
}

impl Queryable for Account {
    const FIELDS: &'static [&'static str] = &["id", "code", "currency", "balance", "creditLimit", "debitLimit"];
    const SEARCH_FIELDS: &'static [&'static str] = &["code"];

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::text(&self.id)),
            "code" => Some(FieldValue::text(&self.code)),
            "currency" => Some(FieldValue::text(&self.currency_id)),
            "balance" => Some(FieldValue::Int(self.balance)),
            "creditLimit" => Some(FieldValue::Int(self.credit_limit)),
            "debitLimit" => Some(FieldValue::Int(self.debit_limit)),
            _ => None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
