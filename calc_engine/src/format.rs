//! # Result Formatting
//!
//! Display strings for raw result values: digit grouping, magnitude-based
//! precision, currency glyphs, units, durations and dates.
//!
//! A [`Formatter`] borrows the read-only [`SymbolTable`] built at startup, so
//! every string a calculator produces goes through one place.
//!
//! ## Example
//!
//! ```rust
//! use calc_engine::format::Formatter;
//! use calc_engine::units::SymbolTable;
//!
//! let symbols = SymbolTable::builtin();
//! let en = Formatter::new("en", &symbols);
//! assert_eq!(en.currency(24490.0, "USD"), "$24,490.00");
//!
//! let de = Formatter::new("de", &symbols);
//! assert_eq!(de.currency(24490.0, "EUR"), "€24.490,00");
//! ```

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::compute::ResultValue;
use crate::config::FormatHint;
use crate::units::{format_composite, SymbolTable};

/// Separators and date layout for one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleStyle {
    pub grouping: String,
    pub decimal: String,
    /// `chrono` strftime pattern
    pub date_pattern: String,
}

impl LocaleStyle {
    fn new(grouping: &str, decimal: &str, date_pattern: &str) -> Self {
        LocaleStyle {
            grouping: grouping.to_string(),
            decimal: decimal.to_string(),
            date_pattern: date_pattern.to_string(),
        }
    }

    /// Whether `date_pattern` parses as a strftime pattern.
    pub fn has_valid_date_pattern(&self) -> bool {
        !StrftimeItems::new(&self.date_pattern).any(|item| matches!(item, Item::Error))
    }

    /// Built-in style for a locale tag; unknown languages use English conventions.
    pub fn for_locale(locale: &str) -> Self {
        let language = locale.split(['-', '_']).next().unwrap_or(locale);
        match language {
            "de" | "nl" | "da" | "id" | "tr" => LocaleStyle::new(".", ",", "%d.%m.%Y"),
            "es" | "it" | "pt" => LocaleStyle::new(".", ",", "%d/%m/%Y"),
            "fr" | "ru" | "pl" | "sv" | "nb" | "fi" | "cs" | "uk" => LocaleStyle::new(" ", ",", "%d/%m/%Y"),
            _ => LocaleStyle::new(",", ".", "%b %-d, %Y"),
        }
    }
}

impl Default for LocaleStyle {
    fn default() -> Self {
        LocaleStyle::for_locale("en")
    }
}

/// Decimal places for a value shown without a fixed precision.
///
/// Small magnitudes get more places: `0.0042` keeps 4, `12.5` keeps 2,
/// `1234` keeps none.
pub fn auto_decimals(value: f64) -> usize {
    let magnitude = value.abs();
    if magnitude == 0.0 {
        0
    } else if magnitude < 1.0 {
        4
    } else if magnitude < 100.0 {
        2
    } else if magnitude < 1000.0 {
        1
    } else {
        0
    }
}

/// Locale-aware number and unit formatting.
#[derive(Debug, Clone)]
pub struct Formatter<'a> {
    style: LocaleStyle,
    symbols: &'a SymbolTable,
}

impl<'a> Formatter<'a> {
    pub fn new(locale: &str, symbols: &'a SymbolTable) -> Self {
        Formatter {
            style: LocaleStyle::for_locale(locale),
            symbols,
        }
    }

    pub fn with_style(style: LocaleStyle, symbols: &'a SymbolTable) -> Self {
        Formatter { style, symbols }
    }

    pub fn style(&self) -> &LocaleStyle {
        &self.style
    }

    pub fn symbols(&self) -> &'a SymbolTable {
        self.symbols
    }

    /// Fixed-precision number with grouping: `1234.5, 2` → `1,234.50`.
    pub fn number(&self, value: f64, decimals: usize) -> String {
        if !value.is_finite() {
            return "-".to_string();
        }
        let fixed = format!("{:.*}", decimals, value.abs());
        let (int_part, frac_part) = match fixed.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (fixed.as_str(), None),
        };

        let negative = value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');
        let mut out = String::with_capacity(fixed.len() + 4);
        if negative {
            out.push('-');
        }
        out.push_str(&self.group(int_part));
        if let Some(frac) = frac_part {
            out.push_str(&self.style.decimal);
            out.push_str(frac);
        }
        out
    }

    /// Number with [`auto_decimals`] precision and trailing zeros dropped.
    pub fn auto(&self, value: f64) -> String {
        let decimals = auto_decimals(value);
        let text = self.number(value, decimals);
        if decimals == 0 {
            return text;
        }
        let trimmed = text.trim_end_matches('0');
        trimmed
            .strip_suffix(self.style.decimal.as_str())
            .unwrap_or(trimmed)
            .to_string()
    }

    pub fn integer(&self, value: f64) -> String {
        self.number(value.round(), 0)
    }

    /// `$1,234.56`; codes without a glyph are spaced: `CHF 1,234.56`.
    pub fn currency(&self, value: f64, code: &str) -> String {
        self.currency_with(value, code, 2)
    }

    pub fn currency_with(&self, value: f64, code: &str, decimals: usize) -> String {
        let glyph = self.symbols.symbol(code);
        let amount = self.number(value.abs(), decimals);
        let sign = if value < 0.0 && amount.chars().any(|c| c.is_ascii_digit() && c != '0') {
            "-"
        } else {
            ""
        };
        if glyph.chars().all(|c| c.is_ascii_alphabetic()) {
            format!("{sign}{glyph} {amount}")
        } else {
            format!("{sign}{glyph}{amount}")
        }
    }

    /// `value` is already a percentage (`18` → `18%`).
    pub fn percent(&self, value: f64, decimals: Option<usize>) -> String {
        let number = match decimals {
            Some(d) => self.number(value, d),
            None => self.auto(value),
        };
        format!("{number}%")
    }

    /// `value` in `unit`, with its glyph: `150.0 lbs`, `5' 10"`.
    pub fn unit(&self, value: f64, unit: &str, decimals: Option<usize>) -> String {
        if unit == "ft_in" {
            return format_composite(value);
        }
        let number = match decimals {
            Some(d) => self.number(value, d),
            None => self.auto(value),
        };
        format!("{number} {}", self.symbols.symbol(unit))
    }

    /// Seconds as `1d 2h 3m 4s`, largest unit first, zero parts omitted.
    ///
    /// Durations under a minute keep a fractional second.
    pub fn duration(&self, seconds: f64) -> String {
        if !seconds.is_finite() || seconds < 0.0 {
            return "-".to_string();
        }
        if seconds < 60.0 {
            return format!("{} s", self.auto(seconds));
        }

        let total = seconds.round() as u64;
        let parts = [
            (total / 86_400, "d"),
            ((total % 86_400) / 3600, "h"),
            ((total % 3600) / 60, "m"),
            (total % 60, "s"),
        ];
        parts
            .iter()
            .filter(|(n, _)| *n > 0)
            .map(|(n, suffix)| format!("{n}{suffix}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Date in the locale's pattern; ISO `YYYY-MM-DD` if the pattern is broken.
    pub fn date(&self, date: NaiveDate) -> String {
        let mut out = String::new();
        if write!(out, "{}", date.format(&self.style.date_pattern)).is_err() {
            tracing::warn!(pattern = %self.style.date_pattern, "bad date pattern, using ISO");
            return date.format("%Y-%m-%d").to_string();
        }
        out
    }

    /// Format a raw result value by its declared hint.
    ///
    /// `unit` is the currency code for `Currency` and the display unit for
    /// `Weight`/`Length`/`Volume`.
    pub fn format(&self, value: &ResultValue, hint: FormatHint, decimals: Option<u8>, unit: Option<&str>) -> String {
        let decimals = decimals.map(usize::from);
        let n = match value {
            ResultValue::Number(n) => *n,
            ResultValue::Text(text) => return self.format_text(text, hint),
        };
        match hint {
            FormatHint::Currency => self.currency_with(n, unit.unwrap_or("USD"), decimals.unwrap_or(2)),
            FormatHint::Number => match decimals {
                Some(d) => self.number(n, d),
                None => self.auto(n),
            },
            FormatHint::Integer => self.integer(n),
            FormatHint::Percent => self.percent(n, decimals),
            FormatHint::Weight | FormatHint::Length | FormatHint::Volume => match unit {
                Some(unit) => self.unit(n, unit, decimals.or(Some(1))),
                None => self.number(n, decimals.unwrap_or(1)),
            },
            FormatHint::Calories => format!("{} {}", self.integer(n), self.symbols.symbol("kcal")),
            FormatHint::Duration => self.duration(n),
            FormatHint::Date | FormatHint::Text => self.auto(n),
        }
    }

    fn format_text(&self, text: &str, hint: FormatHint) -> String {
        match hint {
            FormatHint::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map(|d| self.date(d))
                .unwrap_or_else(|_| text.to_string()),
            _ => text.to_string(),
        }
    }

    fn group(&self, digits: &str) -> String {
        let len = digits.len();
        let mut out = String::with_capacity(len + len / 3 * self.style.grouping.len());
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (len - i) % 3 == 0 {
                out.push_str(&self.style.grouping);
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols() -> SymbolTable {
        SymbolTable::builtin()
    }

    #[test]
    fn test_grouping_per_locale() {
        let s = symbols();
        assert_eq!(Formatter::new("en", &s).number(1234567.891, 2), "1,234,567.89");
        assert_eq!(Formatter::new("es-MX", &s).number(1234567.891, 2), "1.234.567,89");
        assert_eq!(Formatter::new("fr", &s).number(1234.5, 1), "1 234,5");
        assert_eq!(Formatter::new("en", &s).number(999.0, 0), "999");
        assert_eq!(Formatter::new("en", &s).number(-1000.0, 0), "-1,000");
    }

    #[test]
    fn test_negative_zero_has_no_sign() {
        let s = symbols();
        let f = Formatter::new("en", &s);
        assert_eq!(f.number(-0.001, 2), "0.00");
        assert_eq!(f.currency(-0.001, "USD"), "$0.00");
    }

    #[test]
    fn test_auto_precision_by_magnitude() {
        assert_eq!(auto_decimals(0.0), 0);
        assert_eq!(auto_decimals(0.0042), 4);
        assert_eq!(auto_decimals(12.5), 2);
        assert_eq!(auto_decimals(250.0), 1);
        assert_eq!(auto_decimals(12_000.0), 0);

        let s = symbols();
        let f = Formatter::new("en", &s);
        assert_eq!(f.auto(0.0042), "0.0042");
        assert_eq!(f.auto(22.5), "22.5");
        assert_eq!(f.auto(60.0), "60");
        assert_eq!(f.auto(12_345.6), "12,346");
    }

    #[test]
    fn test_currency_glyphs() {
        let s = symbols();
        let f = Formatter::new("en", &s);
        assert_eq!(f.currency(13.5, "USD"), "$13.50");
        assert_eq!(f.currency(-42.0, "GBP"), "-£42.00");
        assert_eq!(f.currency(1000.0, "CHF"), "CHF 1,000.00");
        // unknown codes render as the code
        assert_eq!(f.currency(5.0, "XYZ"), "XYZ 5.00");
    }

    #[test]
    fn test_units_and_percent() {
        let s = symbols();
        let f = Formatter::new("en", &s);
        assert_eq!(f.unit(150.0, "lbs", Some(1)), "150.0 lbs");
        assert_eq!(f.unit(2.5, "l", None), "2.5 L");
        assert_eq!(f.unit(70.0, "ft_in", None), "5' 10\"");
        assert_eq!(f.percent(18.0, None), "18%");
        assert_eq!(f.percent(17.3333, Some(1)), "17.3%");
    }

    #[test]
    fn test_duration() {
        let s = symbols();
        let f = Formatter::new("en", &s);
        assert_eq!(f.duration(0.42), "0.42 s");
        assert_eq!(f.duration(3725.0), "1h 2m 5s");
        assert_eq!(f.duration(90_000.0), "1d 1h");
        assert_eq!(f.duration(-1.0), "-");
    }

    #[test]
    fn test_dates() {
        let s = symbols();
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(Formatter::new("en", &s).date(date), "Mar 5, 2024");
        assert_eq!(Formatter::new("es", &s).date(date), "05/03/2024");
        assert_eq!(Formatter::new("de", &s).date(date), "05.03.2024");
    }

    #[test]
    fn test_broken_date_pattern_falls_back_to_iso() {
        let s = symbols();
        let style = LocaleStyle {
            date_pattern: "%Q".to_string(),
            ..LocaleStyle::for_locale("en")
        };
        assert!(!style.has_valid_date_pattern());
        assert!(LocaleStyle::for_locale("de").has_valid_date_pattern());

        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(Formatter::with_style(style, &s).date(date), "2026-03-01");
    }

    #[test]
    fn test_format_by_hint() {
        let s = symbols();
        let f = Formatter::new("en", &s);
        let n = ResultValue::Number(1874.6);
        assert_eq!(f.format(&n, FormatHint::Calories, None, None), "1,875 kcal");
        assert_eq!(f.format(&n, FormatHint::Currency, None, Some("EUR")), "€1,874.60");
        assert_eq!(f.format(&n, FormatHint::Integer, None, None), "1,875");
        assert_eq!(f.format(&n, FormatHint::Number, Some(1), None), "1,874.6");
        assert_eq!(
            f.format(&ResultValue::Number(68.04), FormatHint::Weight, None, Some("kg")),
            "68.0 kg"
        );
        assert_eq!(
            f.format(&ResultValue::from("2024-03-05"), FormatHint::Date, None, None),
            "Mar 5, 2024"
        );
        assert_eq!(
            f.format(&ResultValue::from("Normal"), FormatHint::Text, None, None),
            "Normal"
        );
    }

    #[test]
    fn test_style_override() {
        let s = symbols().with_overrides([("USD", "US$")]);
        let style = LocaleStyle {
            grouping: "'".to_string(),
            decimal: ".".to_string(),
            date_pattern: "%Y-%m-%d".to_string(),
        };
        let f = Formatter::with_style(style, &s);
        assert_eq!(f.currency(1234.5, "USD"), "US$1'234.50");
    }
}
