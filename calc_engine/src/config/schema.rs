//! Configuration data types.
//!
//! Field names serialize in camelCase so the same JSON document feeds both this
//! engine and the host UI that renders the form.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::CalcResult;
use crate::i18n::{select_bundle, TranslationBundle, Translator};
use crate::units::UnitType;

// ============================================================================
// Input values
// ============================================================================

/// A typed scalar entered by a user or authored as a default.
///
/// Hosts post form values as strings, so reads coerce: `"18"` is a number and
/// `"true"` is a boolean when a calculator asks for one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl InputValue {
    /// Numeric reading. Text is parsed; booleans are not numbers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            InputValue::Number(n) if n.is_finite() => Some(*n),
            InputValue::Number(_) => None,
            InputValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            InputValue::Bool(_) => None,
        }
    }

    /// Boolean reading: `true`/`false`, `"true"`/`"false"`, `1`/`0`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            InputValue::Bool(b) => Some(*b),
            InputValue::Number(n) => Some(*n != 0.0),
            InputValue::Text(s) => match s.trim() {
                "true" | "1" | "yes" | "on" => Some(true),
                "false" | "0" | "no" | "off" => Some(false),
                _ => None,
            },
        }
    }

    /// Canonical key used for option matching (`18.0` and `"18"` both give `"18"`).
    pub fn key(&self) -> String {
        match self {
            InputValue::Bool(b) => b.to_string(),
            InputValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            InputValue::Number(n) => n.to_string(),
            InputValue::Text(s) => s.trim().to_string(),
        }
    }

    /// Loose equality across representations.
    pub fn matches(&self, other: &InputValue) -> bool {
        self.key() == other.key()
    }

    /// True for an empty string, which forms send for a cleared field.
    pub fn is_blank(&self) -> bool {
        matches!(self, InputValue::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl From<f64> for InputValue {
    fn from(n: f64) -> Self {
        InputValue::Number(n)
    }
}

impl From<i32> for InputValue {
    fn from(n: i32) -> Self {
        InputValue::Number(n as f64)
    }
}

impl From<bool> for InputValue {
    fn from(b: bool) -> Self {
        InputValue::Bool(b)
    }
}

impl From<&str> for InputValue {
    fn from(s: &str) -> Self {
        InputValue::Text(s.to_string())
    }
}

impl From<String> for InputValue {
    fn from(s: String) -> Self {
        InputValue::Text(s)
    }
}

// ============================================================================
// Inputs
// ============================================================================

/// Widget kind for an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Number,
    Select,
    Radio,
    Toggle,
    Stepper,
    Slider,
    Imageradio,
    /// ISO `YYYY-MM-DD`
    Date,
}

impl InputType {
    /// Inputs whose value is one of `options[]`
    pub fn is_enumerated(&self) -> bool {
        matches!(self, InputType::Select | InputType::Radio | InputType::Imageradio)
    }

    /// Inputs whose value is a free number
    pub fn is_numeric(&self) -> bool {
        matches!(self, InputType::Number | InputType::Stepper | InputType::Slider)
    }
}

/// One choice of an enumerated input. Labels live in the translation bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionDef {
    pub value: InputValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Conditional visibility: shown only while `field` equals `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowWhen {
    pub field: String,
    pub value: InputValue,
}

/// Option value → (other field → value written when that option is selected).
pub type LinkedValues = BTreeMap<String, BTreeMap<String, InputValue>>;

/// Declarative description of one form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub input_type: InputType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<InputValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_type: Option<UnitType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_units: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_when: Option<ShowWhen>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub linked_values: LinkedValues,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

impl InputDefinition {
    /// Whether this field participates in unit conversion
    pub fn is_unit_bearing(&self) -> bool {
        self.unit_type.is_some()
    }

    /// Declared option keys, in order
    pub fn option_keys(&self) -> Vec<String> {
        self.options.iter().map(|o| o.value.key()).collect()
    }

    /// Whether `value` is one of the declared options
    pub fn has_option(&self, value: &InputValue) -> bool {
        self.options.iter().any(|o| o.value.matches(value))
    }

    /// Targets written when this field currently holds `value`
    pub fn links_for(&self, value: &InputValue) -> Option<&BTreeMap<String, InputValue>> {
        self.linked_values.get(&value.key())
    }
}

/// Named bundle of input values applied in one click.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub values: BTreeMap<String, InputValue>,
}

// ============================================================================
// Results
// ============================================================================

/// Display tier of a result card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayTier {
    Primary,
    #[default]
    Secondary,
}

/// How a raw result value becomes display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatHint {
    Currency,
    #[default]
    Number,
    Integer,
    Percent,
    Weight,
    Length,
    Volume,
    Calories,
    Duration,
    Date,
    Text,
}

/// One declared result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultDefinition {
    pub id: String,
    #[serde(default)]
    pub tier: DisplayTier,
    #[serde(default)]
    pub format: FormatHint,
    /// Fixed decimals; magnitude-based precision when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
}

// ============================================================================
// Auxiliary descriptors (rendering only)
// ============================================================================

/// One plotted series of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Chart layout. The engine only fills `metadata.chartData`; drawing is the host's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    pub x_key: String,
    pub series: Vec<ChartSeries>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// One column of the detailed table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumn {
    pub key: String,
    #[serde(default)]
    pub format: FormatHint,
}

/// Detailed table layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescriptor {
    pub columns: Vec<TableColumn>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

// ============================================================================
// Calculator configuration
// ============================================================================

fn default_locale() -> String {
    "en".to_string()
}

static EMPTY_BUNDLE: Lazy<TranslationBundle> = Lazy::new(TranslationBundle::default);

/// The declarative description of one calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorConfig {
    pub id: String,
    pub version: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default = "default_locale")]
    pub default_locale: String,
    pub inputs: Vec<InputDefinition>,
    #[serde(default)]
    pub presets: Vec<Preset>,
    pub results: Vec<ResultDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_table: Option<TableDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub education_sections: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faqs: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<serde_json::Value>,
    pub t: BTreeMap<String, TranslationBundle>,
}

impl CalculatorConfig {
    /// Parse a configuration document. Does not validate; see
    /// [`crate::config::validate_config`].
    pub fn from_json(json: &str) -> CalcResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn input(&self, id: &str) -> Option<&InputDefinition> {
        self.inputs.iter().find(|i| i.id == id)
    }

    pub fn result(&self, id: &str) -> Option<&ResultDefinition> {
        self.results.iter().find(|r| r.id == id)
    }

    pub fn preset(&self, id: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// Declared locales, sorted
    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.t.keys().map(String::as_str)
    }

    /// Translator for `locale`, falling back to the default locale.
    pub fn translator<'a>(&'a self, locale: &'a str) -> Translator<'a> {
        let fallback = self.t.get(&self.default_locale).unwrap_or(&EMPTY_BUNDLE);
        match select_bundle(&self.t, locale) {
            Some((resolved, bundle)) => Translator::new(&self.id, resolved, bundle, fallback),
            None => {
                tracing::warn!(
                    calculator = %self.id,
                    locale,
                    "locale not declared, using default locale"
                );
                Translator::new(&self.id, &self.default_locale, fallback, fallback)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_value_coercion() {
        assert_eq!(InputValue::from("18").as_number(), Some(18.0));
        assert_eq!(InputValue::from(" 2.5 ").as_number(), Some(2.5));
        assert_eq!(InputValue::from("abc").as_number(), None);
        assert_eq!(InputValue::from(true).as_number(), None);
        assert_eq!(InputValue::from("true").as_bool(), Some(true));
        assert_eq!(InputValue::from(0.0).as_bool(), Some(false));
    }

    #[test]
    fn test_input_value_loose_matching() {
        assert!(InputValue::from(18.0).matches(&InputValue::from("18")));
        assert!(InputValue::from(true).matches(&InputValue::from("true")));
        assert!(!InputValue::from(18.5).matches(&InputValue::from("18")));
        assert_eq!(InputValue::from(60.0).key(), "60");
    }

    #[test]
    fn test_input_value_untagged_json() {
        let values: Vec<InputValue> = serde_json::from_str(r#"[true, 18, "good"]"#).unwrap();
        assert_eq!(
            values,
            vec![InputValue::Bool(true), InputValue::Number(18.0), InputValue::from("good")]
        );
    }

    #[test]
    fn test_input_definition_json() {
        let json = r#"{
            "id": "serviceQuality",
            "type": "select",
            "defaultValue": "good",
            "options": [{"value": "fair"}, {"value": "good"}],
            "linkedValues": {"good": {"tipPercent": 18}}
        }"#;
        let input: InputDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(input.input_type, InputType::Select);
        assert!(input.input_type.is_enumerated());
        assert!(input.has_option(&InputValue::from("good")));
        assert_eq!(
            input.links_for(&InputValue::from("good")).unwrap()["tipPercent"],
            InputValue::Number(18.0)
        );
        assert!(input.links_for(&InputValue::from("fair")).is_none());
    }

    #[test]
    fn test_translator_unknown_locale_uses_default() {
        let json = r#"{
            "id": "demo", "version": "1.0.0", "category": "misc",
            "inputs": [], "results": [],
            "t": {"en": {"title": "Demo"}, "es": {"title": "Demostración"}}
        }"#;
        let config = CalculatorConfig::from_json(json).unwrap();
        assert_eq!(config.translator("es-AR").title(), "Demostración");
        assert_eq!(config.translator("ja").title(), "Demo");
        assert_eq!(config.translator("ja").locale(), "en");
    }
}
