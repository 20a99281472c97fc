// Komunitin Mock Services - Core Library
// Exposes all modules for use in the CLI, the mock server, and tests

pub mod config;
pub mod logging;
pub mod error;         // KError and error codes
pub mod dispatcher;    // Error Dispatcher: log, then notify
pub mod i18n;          // Locale Resolver
pub mod prefs;         // Persisted user preferences
pub mod query;         // filter → search → sort pipeline
pub mod entities;      // Accounting and social records
pub mod store;         // In-memory mock store
pub mod fixtures;      // Deterministic seed data

#[cfg(feature = "server")]
pub mod api;           // JSON:API mock routes

// Re-export commonly used types
pub use config::{AppConfig, ConfigError};
pub use error::{ErrorCode, KError};
pub use dispatcher::{
    Dispatch, ErrorDispatcher, ErrorSink, Notification, Notifier,
    PanicReporter, ScriptErrorEvent, Subscription, TracingNotifier, WarningEvent,
};
pub use i18n::{
    ActiveLocale, EmbeddedLoader, LocaleContext, LocaleError, LocaleLoader, Translate,
    DEFAULT_LOCALE,
};
pub use prefs::{MemoryPreferences, PreferenceStore, PrefsError, SqlitePreferences};
pub use query::{QueryError, QueryParams, Queryable};
pub use entities::{Account, Currency, Group, Member, Need, Offer, Transfer, TransferState};
pub use store::MockStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
