// ⚠️ Application Errors - One error type with a stable code
//
// Every failure surfaced to the user ends up as a `KError`: the code picks
// the localized message, the context keeps whatever the diagnostics need.

use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

use crate::i18n::LocaleError;
use crate::query::QueryError;

// ============================================================================
// ERROR CODES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    Unknown,

    /// Unhandled runtime error (panic, uncaught script error)
    UnknownScript,

    /// Warning raised by the UI framework
    FrameworkWarning,

    /// Failure while handling another error
    ErrorHandling,

    NotFound,

    /// Request shape the mock server does not implement
    UnexpectedRequest,

    InvalidQuery,

    LocaleLoad,

    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Unknown => "Unknown",
            ErrorCode::UnknownScript => "UnknownScript",
            ErrorCode::FrameworkWarning => "FrameworkWarning",
            ErrorCode::ErrorHandling => "ErrorHandling",
            ErrorCode::NotFound => "NotFound",
            ErrorCode::UnexpectedRequest => "UnexpectedRequest",
            ErrorCode::InvalidQuery => "InvalidQuery",
            ErrorCode::LocaleLoad => "LocaleLoad",
            ErrorCode::Internal => "Internal",
        }
    }

    /// Message key of the localized text, e.g. `error-unknown-script`
    pub fn translation_key(&self) -> String {
        let mut key = String::from("error");
        for c in self.as_str().chars() {
            if c.is_ascii_uppercase() {
                key.push('-');
            }
            key.push(c.to_ascii_lowercase());
        }
        key
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// KERROR
// ============================================================================

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct KError {
    pub code: ErrorCode,
    pub message: String,
    /// Free-form diagnostic payload
    pub context: Value,
}

impl KError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        KError {
            code,
            message: message.into(),
            context: Value::Null,
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    pub fn translation_key(&self) -> String {
        self.code.translation_key()
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        KError::new(ErrorCode::NotFound, format!("{} '{}' not found", resource, id))
            .with_context(json!({ "resource": resource, "id": id }))
    }
}

impl From<LocaleError> for KError {
    fn from(error: LocaleError) -> Self {
        KError::new(ErrorCode::LocaleLoad, error.to_string())
    }
}

impl From<QueryError> for KError {
    fn from(error: QueryError) -> Self {
        KError::new(ErrorCode::InvalidQuery, error.to_string())
    }
}
