// 🌍 Locale Resolver - Resolution, loading and the active locale
//
// The active locale lives in a `LocaleContext` owned by the application.
// A switch loads the message bundle, the framework language pack and the
// date locale concurrently, and is committed (persisted, then made
// visible) only when all three loads succeed.
//
// Switches are serialized: the last one to acquire the lock wins.

pub mod date;
pub mod loader;

use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::prefs::{PreferenceStore, PrefsError};
pub use loader::{embedded_locales, DateLocale, EmbeddedLoader, LanguagePack, LocaleLoader, MessageBundle};

/// Used when the requested locale is not supported.
pub const DEFAULT_LOCALE: &str = "en-us";

/// Preference key of the saved locale.
pub const LOCALE_KEY: &str = "lang";

#[derive(Debug, Error)]
pub enum LocaleError {
    #[error("locale asset not found: {0}")]
    MissingAsset(String),

    #[error("invalid locale resource {path}: {detail}")]
    Parse { path: String, detail: String },

    #[error("missing message: {0}")]
    MissingMessage(String),

    #[error("failed to format message {key}: {detail}")]
    Format { key: String, detail: String },

    #[error(transparent)]
    Preferences(#[from] PrefsError),
}

/// Return `locale` if it is supported, the default locale otherwise.
///
/// Matching ignores case and falls back to the primary language
/// (`es-ES` → `es`).
pub fn normalize_locale(locale: &str, supported: &[String]) -> String {
    let lower = locale.trim().to_lowercase();
    if supported.iter().any(|s| *s == lower) {
        return lower;
    }
    if let Some((language, _)) = lower.split_once('-') {
        if supported.iter().any(|s| s == language) {
            return language.to_string();
        }
    }
    DEFAULT_LOCALE.to_string()
}

/// Date locale code for an app code: region in upper case (`en-us` → `en-US`).
pub fn date_locale_code(locale: &str) -> String {
    match locale.split_once('-') {
        Some((language, region)) => format!("{}-{}", language, region.to_uppercase()),
        None => locale.to_string(),
    }
}

/// Anything able to turn a message key into user-facing text.
pub trait Translate: Send + Sync {
    fn translate(&self, key: &str) -> Result<String, LocaleError>;
}

// ============================================================================
// Active locale
// ============================================================================

/// Everything loaded for one locale. Immutable once built.
#[derive(Debug)]
pub struct ActiveLocale {
    pub code: String,
    pub messages: Arc<MessageBundle>,
    pub language_pack: LanguagePack,
    pub date_locale: DateLocale,
}

impl ActiveLocale {
    pub fn tr(&self, key: &str) -> Result<String, LocaleError> {
        self.messages.format(key, &[])
    }

    pub fn tr_args(&self, key: &str, args: &[(&str, String)]) -> Result<String, LocaleError> {
        self.messages.format(key, args)
    }

    /// Translation, or the key itself when the message is missing
    pub fn tr_or_key(&self, key: &str, args: &[(&str, String)]) -> String {
        self.messages
            .format(key, args)
            .unwrap_or_else(|_| key.to_string())
    }

    pub fn format_relative(&self, date: DateTime<Utc>, base: DateTime<Utc>) -> String {
        date::format_relative(date, base, &self.date_locale)
    }
}

// ============================================================================
// Locale context
// ============================================================================

pub struct LocaleContext {
    loader: Arc<dyn LocaleLoader>,
    prefs: Arc<dyn PreferenceStore>,
    supported: Vec<String>,
    active: RwLock<Arc<ActiveLocale>>,
    switching: Mutex<()>,
}

impl LocaleContext {
    /// Create a context with the default locale active
    pub async fn new(
        loader: Arc<dyn LocaleLoader>,
        prefs: Arc<dyn PreferenceStore>,
        supported: Vec<String>,
    ) -> Result<Self, LocaleError> {
        let date_code = date_locale_code(DEFAULT_LOCALE);
        let (messages, language_pack, date_locale) = tokio::try_join!(
            loader.load_messages(DEFAULT_LOCALE),
            loader.load_language_pack(DEFAULT_LOCALE),
            loader.load_date_locale(&date_code),
        )?;

        let active = ActiveLocale {
            code: DEFAULT_LOCALE.to_string(),
            messages: Arc::new(messages),
            language_pack,
            date_locale,
        };

        Ok(LocaleContext {
            loader,
            prefs,
            supported,
            active: RwLock::new(Arc::new(active)),
            switching: Mutex::new(()),
        })
    }

    /// Create a context and switch to the user's locale
    ///
    /// Uses the saved preference when present, `env_locale` otherwise.
    pub async fn boot(
        loader: Arc<dyn LocaleLoader>,
        prefs: Arc<dyn PreferenceStore>,
        env_locale: Option<&str>,
    ) -> Result<Self, LocaleError> {
        let context = Self::new(loader, prefs, embedded_locales()).await?;
        let initial = context.initial_locale(env_locale)?;
        context.set_locale(&initial).await?;
        Ok(context)
    }

    pub fn supported(&self) -> &[String] {
        &self.supported
    }

    pub fn normalize(&self, locale: &str) -> String {
        normalize_locale(locale, &self.supported)
    }

    /// Locale from the previous session, or the environment one
    pub fn initial_locale(&self, env_locale: Option<&str>) -> Result<String, LocaleError> {
        if let Some(saved) = self.prefs.get(LOCALE_KEY)? {
            debug!(locale = %saved, "using saved locale");
            return Ok(self.normalize(&saved));
        }
        Ok(self.normalize(env_locale.unwrap_or(DEFAULT_LOCALE)))
    }

    /// Snapshot of the active locale
    pub fn active(&self) -> Arc<ActiveLocale> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn code(&self) -> String {
        self.active().code.clone()
    }

    /// Switch the active locale
    ///
    /// Returns the normalized code that became active. On error nothing
    /// changes: the previous locale stays active and the saved preference
    /// is left as it was.
    pub async fn set_locale(&self, requested: &str) -> Result<String, LocaleError> {
        let _switching = self.switching.lock().await;

        let lang = self.normalize(requested);
        let current = self.active();

        let messages = async {
            if current.code == lang {
                Ok(current.messages.clone())
            } else {
                self.loader.load_messages(&lang).await.map(Arc::new)
            }
        };
        let date_code = date_locale_code(&lang);

        let (messages, language_pack, date_locale) = tokio::try_join!(
            messages,
            self.loader.load_language_pack(&lang),
            self.loader.load_date_locale(&date_code),
        )?;

        self.prefs.set(LOCALE_KEY, &lang)?;

        let next = Arc::new(ActiveLocale {
            code: lang.clone(),
            messages,
            language_pack,
            date_locale,
        });
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = next;

        info!(locale = %lang, requested = %requested, "locale changed");
        Ok(lang)
    }

    pub fn format_relative(&self, date: DateTime<Utc>, base: DateTime<Utc>) -> String {
        self.active().format_relative(date, base)
    }
}

impl Translate for LocaleContext {
    fn translate(&self, key: &str) -> Result<String, LocaleError> {
        self.active().tr(key)
    }
}

// ============================================================================
// Tests
// ============================================================================
