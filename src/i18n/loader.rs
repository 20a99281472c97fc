// 📦 Locale Resources - Embedded assets and the loader seam
//
// A locale is made of three independently loaded parts:
// - the UI message bundle (`assets/i18n/<code>.ftl`, Fluent syntax)
// - the framework language pack (`assets/lang/<code>.toml`)
// - the date-formatting locale (`assets/date/<Code>.toml`)

use async_trait::async_trait;
use chrono::format::{Item, StrftimeItems};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource};
use rust_embed::RustEmbed;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use unic_langid::LanguageIdentifier;

use super::LocaleError;

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Assets;

/// App codes of every message bundle shipped in the binary, sorted.
pub fn embedded_locales() -> Vec<String> {
    let mut locales: Vec<String> = Assets::iter()
        .filter_map(|file| {
            file.strip_prefix("i18n/")
                .and_then(|name| name.strip_suffix(".ftl"))
                .map(|code| code.to_string())
        })
        .collect();
    locales.sort();
    locales
}

// ============================================================================
// Message bundle
// ============================================================================

/// Fluent bundle for one locale.
pub struct MessageBundle {
    code: String,
    bundle: FluentBundle<FluentResource>,
}

impl fmt::Debug for MessageBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBundle").field("code", &self.code).finish()
    }
}

impl MessageBundle {
    pub fn parse(code: &str, source: String) -> Result<Self, LocaleError> {
        let langid: LanguageIdentifier = code.parse().map_err(|_| LocaleError::Parse {
            path: code.to_string(),
            detail: "invalid language identifier".to_string(),
        })?;

        let resource = FluentResource::try_new(source).map_err(|(_, errors)| LocaleError::Parse {
            path: format!("i18n/{}.ftl", code),
            detail: format!("{:?}", errors),
        })?;

        let mut bundle = FluentBundle::new_concurrent(vec![langid]);
        // Plain strings, no bidi isolation marks around placeables
        bundle.set_use_isolating(false);
        bundle.add_resource(resource).map_err(|errors| LocaleError::Parse {
            path: format!("i18n/{}.ftl", code),
            detail: format!("{:?}", errors),
        })?;

        Ok(MessageBundle {
            code: code.to_string(),
            bundle,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn has_message(&self, key: &str) -> bool {
        self.bundle.has_message(key)
    }

    pub fn format(&self, key: &str, args: &[(&str, String)]) -> Result<String, LocaleError> {
        let message = self
            .bundle
            .get_message(key)
            .ok_or_else(|| LocaleError::MissingMessage(key.to_string()))?;
        let pattern = message
            .value()
            .ok_or_else(|| LocaleError::MissingMessage(key.to_string()))?;

        let mut fluent_args = FluentArgs::new();
        for (name, value) in args {
            fluent_args.set(*name, value.clone());
        }

        let mut errors = vec![];
        let value = self
            .bundle
            .format_pattern(pattern, Some(&fluent_args), &mut errors);
        if !errors.is_empty() {
            return Err(LocaleError::Format {
                key: key.to_string(),
                detail: format!("{:?}", errors),
            });
        }
        Ok(value.into_owned())
    }
}

// ============================================================================
// Language pack
// ============================================================================

/// Strings and settings of the UI framework itself.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LanguagePack {
    pub iso_name: String,
    pub native_name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl LanguagePack {
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }
}

// ============================================================================
// Date locale
// ============================================================================

/// Patterns used by [`super::date::format_relative`].
///
/// `{weekday}` and `{time}` are substituted; `time` and `date` are chrono
/// format strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DateLocale {
    pub code: String,
    /// Monday first
    pub weekdays: Vec<String>,
    pub time: String,
    pub date: String,
    pub last_week: String,
    pub yesterday: String,
    pub today: String,
    pub tomorrow: String,
    pub next_week: String,
}

impl DateLocale {
    /// Check weekday count and that `time`/`date` are valid chrono patterns
    pub fn validate(&self) -> Result<(), String> {
        if self.weekdays.len() != 7 {
            return Err(format!("expected 7 weekdays, found {}", self.weekdays.len()));
        }
        for (field, pattern) in [("time", &self.time), ("date", &self.date)] {
            if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
                return Err(format!("invalid {} pattern '{}'", field, pattern));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Loader
// ============================================================================

#[async_trait]
pub trait LocaleLoader: Send + Sync {
    async fn load_messages(&self, lang: &str) -> Result<MessageBundle, LocaleError>;

    async fn load_language_pack(&self, lang: &str) -> Result<LanguagePack, LocaleError>;

    /// `code` is the date locale code (`en-US`), not the app code
    async fn load_date_locale(&self, code: &str) -> Result<DateLocale, LocaleError>;
}

/// Loads locale resources embedded in the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedLoader;

impl EmbeddedLoader {
    fn read(path: &str) -> Result<String, LocaleError> {
        let file = Assets::get(path).ok_or_else(|| LocaleError::MissingAsset(path.to_string()))?;
        Ok(String::from_utf8_lossy(file.data.as_ref()).into_owned())
    }

    fn read_toml<T: for<'de> Deserialize<'de>>(path: &str) -> Result<T, LocaleError> {
        let content = Self::read(path)?;
        toml::from_str(&content).map_err(|e| LocaleError::Parse {
            path: path.to_string(),
            detail: e.to_string(),
        })
    }
}

#[async_trait]
impl LocaleLoader for EmbeddedLoader {
    async fn load_messages(&self, lang: &str) -> Result<MessageBundle, LocaleError> {
        let source = Self::read(&format!("i18n/{}.ftl", lang))?;
        MessageBundle::parse(lang, source)
    }

    async fn load_language_pack(&self, lang: &str) -> Result<LanguagePack, LocaleError> {
        Self::read_toml(&format!("lang/{}.toml", lang))
    }

    async fn load_date_locale(&self, code: &str) -> Result<DateLocale, LocaleError> {
        let path = format!("date/{}.toml", code);
        let locale: DateLocale = Self::read_toml(&path)?;
        locale
            .validate()
            .map_err(|detail| LocaleError::Parse { path, detail })?;
        Ok(locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_locales() {
        assert_eq!(embedded_locales(), vec!["ca", "en-us", "es"]);
    }

    #[tokio::test]
    async fn test_every_locale_has_all_parts() {
        let loader = EmbeddedLoader;
        for lang in embedded_locales() {
            let messages = loader.load_messages(&lang).await.unwrap();
            assert!(messages.has_message("error-unknown"), "{} lacks error-unknown", lang);
            let pack = loader.load_language_pack(&lang).await.unwrap();
            assert!(pack.label("ok").is_some());
            let date = loader
                .load_date_locale(&crate::i18n::date_locale_code(&lang))
                .await
                .unwrap();
            assert_eq!(date.weekdays.len(), 7);
        }
    }

    #[tokio::test]
    async fn test_missing_asset() {
        let result = EmbeddedLoader.load_language_pack("xx").await;
        assert!(matches!(result, Err(LocaleError::MissingAsset(path)) if path == "lang/xx.toml"));
    }

    #[test]
    fn test_format_with_args() {
        let bundle = MessageBundle::parse("en-us", "hello = Hello { $name }!".to_string()).unwrap();
        assert_eq!(bundle.format("hello", &[("name", "Aina".to_string())]).unwrap(), "Hello Aina!");
        assert!(matches!(bundle.format("bye", &[]), Err(LocaleError::MissingMessage(_))));
    }

    #[test]
    fn test_invalid_ftl() {
        let result = MessageBundle::parse("en-us", "= broken".to_string());
        assert!(matches!(result, Err(LocaleError::Parse { .. })));
    }

    #[test]
    fn test_date_locale_rejects_bad_patterns() {
        let valid = DateLocale {
            code: "en-US".to_string(),
            weekdays: (1..=7).map(|d| format!("day{}", d)).collect(),
            time: "%-I:%M %p".to_string(),
            date: "%m/%d/%Y".to_string(),
            last_week: "last {weekday}".to_string(),
            yesterday: "yesterday".to_string(),
            today: "today".to_string(),
            tomorrow: "tomorrow".to_string(),
            next_week: "{weekday}".to_string(),
        };
        assert!(valid.validate().is_ok());

        let broken = DateLocale { date: "%Y-%!".to_string(), ..valid.clone() };
        assert!(broken.validate().unwrap_err().contains("date"));

        let short = DateLocale { weekdays: vec!["Monday".to_string()], ..valid };
        assert!(short.validate().unwrap_err().contains("7 weekdays"));
    }
}
