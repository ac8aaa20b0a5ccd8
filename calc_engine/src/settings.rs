//! # Engine Settings
//!
//! Deployment-wide knobs that sit outside any single calculator configuration:
//! the locale used when a host sends none, extra currency/unit glyphs, and
//! per-locale separator overrides.
//!
//! Settings are read once at startup (see [`crate::file_io::load_settings`]) and
//! never mutated afterwards.
//!
//! ## Example
//!
//! ```rust
//! use calc_engine::settings::EngineSettings;
//!
//! let mut settings = EngineSettings::default();
//! settings.symbols.insert("USD".to_string(), "US$".to_string());
//!
//! let symbols = settings.symbol_table();
//! assert_eq!(symbols.symbol("USD"), "US$");
//! assert_eq!(symbols.symbol("EUR"), "€");
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::format::LocaleStyle;
use crate::units::SymbolTable;

/// Current schema version for settings files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Locale used when a request names none
    pub default_locale: String,

    /// Extra or replacement glyphs, code → glyph
    #[serde(default)]
    pub symbols: BTreeMap<String, String>,

    /// Separator/date overrides keyed by locale tag or language
    #[serde(default)]
    pub locale_styles: BTreeMap<String, LocaleStyle>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            version: SCHEMA_VERSION.to_string(),
            default_locale: "en".to_string(),
            symbols: BTreeMap::new(),
            locale_styles: BTreeMap::new(),
        }
    }
}

impl EngineSettings {
    /// Built-in glyphs extended with `symbols`.
    pub fn symbol_table(&self) -> SymbolTable {
        SymbolTable::builtin().with_overrides(self.symbols.clone())
    }

    /// Style for `locale`: an exact override, then a language override, then
    /// the built-in style.
    pub fn style_for(&self, locale: &str) -> LocaleStyle {
        let language = locale.split(['-', '_']).next().unwrap_or(locale);
        self.locale_styles
            .get(locale)
            .or_else(|| self.locale_styles.get(language))
            .cloned()
            .unwrap_or_else(|| LocaleStyle::for_locale(locale))
    }

    /// Check the overrides a settings file may carry.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` naming every locale style whose `datePattern` is not a
    /// valid strftime pattern.
    pub fn validate(&self) -> CalcResult<()> {
        let issues: Vec<String> = self
            .locale_styles
            .iter()
            .filter(|(_, style)| !style.has_valid_date_pattern())
            .map(|(locale, style)| {
                format!("localeStyles.{locale}.datePattern '{}' is not a valid pattern", style.date_pattern)
            })
            .collect();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(CalcError::invalid_config("settings", issues))
        }
    }

    /// `locale`, or the default when empty.
    pub fn locale_or_default<'a>(&'a self, locale: &'a str) -> &'a str {
        if locale.trim().is_empty() {
            &self.default_locale
        } else {
            locale
        }
    }
}
