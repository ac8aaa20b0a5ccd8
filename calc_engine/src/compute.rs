//! # Compute Contract
//!
//! Every calculator implements [`Calculator`]: given resolved inputs it returns a
//! [`ResultsEnvelope`]. Compute functions are pure and deterministic. Identical
//! inputs serialize to byte-identical JSON because every map is a `BTreeMap`.
//!
//! Invalid user input (a missing price, a zero term) is reported with
//! [`ResultsEnvelope::invalid`], never with `Err`. `Err` is kept for authoring
//! and unit errors.
//!
//! ## Example
//!
//! ```rust,ignore
//! fn compute(&self, input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope> {
//!     or_invalid(self.id(), (|| {
//!         let bill = input.require("billAmount")?;
//!         let mut out = input.envelope().currency(input.currency_of("billAmount"));
//!         out.set("tipAmount", bill * 0.18);
//!         Ok(out.build())
//!     })())
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{CalculatorConfig, FormatHint, InputValue};
use crate::errors::{CalcError, CalcResult};
use crate::format::Formatter;
use crate::i18n::Translator;
use crate::resolve::ResolvedInputs;
use crate::units::convert_to_base;

// ============================================================================
// Calculator trait
// ============================================================================

/// One calculator: an embedded configuration plus its compute logic.
pub trait Calculator: Send + Sync {
    /// Configuration id, e.g. `"auto-loan"`
    fn id(&self) -> &'static str;

    /// The embedded JSON configuration document
    fn config_source(&self) -> &'static str;

    /// Compute results for already-resolved inputs.
    fn compute(&self, input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope>;
}

/// Map user-input errors to the invalid envelope, passing other errors through.
///
/// Lets a compute body use `?` on [`ComputeInput::require`] and friends.
pub fn or_invalid(calculator: &str, result: CalcResult<ResultsEnvelope>) -> CalcResult<ResultsEnvelope> {
    match result {
        Err(err @ (CalcError::MissingField { .. } | CalcError::InvalidInput { .. })) => {
            tracing::debug!(calculator, error = %err, "inputs not computable");
            Ok(ResultsEnvelope::invalid())
        }
        other => other,
    }
}

// ============================================================================
// Results envelope
// ============================================================================

/// A raw result: a number, or text such as a category or an ISO date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultValue {
    Number(f64),
    Text(String),
}

impl ResultValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ResultValue::Number(n) => Some(*n),
            ResultValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResultValue::Text(s) => Some(s),
            ResultValue::Number(_) => None,
        }
    }
}

impl fmt::Display for ResultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultValue::Number(n) => write!(f, "{n}"),
            ResultValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for ResultValue {
    fn from(n: f64) -> Self {
        ResultValue::Number(n)
    }
}

impl From<u32> for ResultValue {
    fn from(n: u32) -> Self {
        ResultValue::Number(f64::from(n))
    }
}

impl From<&str> for ResultValue {
    fn from(s: &str) -> Self {
        ResultValue::Text(s.to_string())
    }
}

impl From<String> for ResultValue {
    fn from(s: String) -> Self {
        ResultValue::Text(s)
    }
}

impl From<NaiveDate> for ResultValue {
    fn from(d: NaiveDate) -> Self {
        ResultValue::Text(d.format("%Y-%m-%d").to_string())
    }
}

/// One chart point or table row.
pub type DataRow = BTreeMap<String, ResultValue>;

/// Build a [`DataRow`] from `key => value` pairs.
#[macro_export]
macro_rules! row {
    ($($key:expr => $value:expr),* $(,)?) => {{
        let mut row = $crate::compute::DataRow::new();
        $( row.insert(($key).to_string(), $crate::compute::ResultValue::from($value)); )*
        row
    }};
}

/// Visualization data attached to an envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_data: Option<Vec<DataRow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_data: Option<Vec<DataRow>>,
}

impl ResultMetadata {
    pub fn is_empty(&self) -> bool {
        self.chart_data.is_none() && self.table_data.is_none()
    }
}

/// What every compute function returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsEnvelope {
    pub values: BTreeMap<String, ResultValue>,
    pub formatted: BTreeMap<String, String>,
    pub summary: String,
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "ResultMetadata::is_empty")]
    pub metadata: ResultMetadata,
}

impl ResultsEnvelope {
    /// The uniform "nothing to show" envelope for missing or out-of-range input.
    pub fn invalid() -> Self {
        ResultsEnvelope::default()
    }

    pub fn value(&self, id: &str) -> Option<f64> {
        self.values.get(id).and_then(ResultValue::as_number)
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        self.formatted.get(id).map(String::as_str)
    }

    pub fn to_json(&self) -> CalcResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> CalcResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ============================================================================
// Compute input
// ============================================================================

/// Everything a compute function may read.
#[derive(Debug, Clone)]
pub struct ComputeInput<'a> {
    pub config: &'a CalculatorConfig,
    pub inputs: &'a ResolvedInputs,
    pub t: Translator<'a>,
    pub fmt: Formatter<'a>,
}

impl<'a> ComputeInput<'a> {
    pub fn new(
        config: &'a CalculatorConfig,
        inputs: &'a ResolvedInputs,
        t: Translator<'a>,
        fmt: Formatter<'a>,
    ) -> Self {
        ComputeInput {
            config,
            inputs,
            t,
            fmt,
        }
    }

    /// Numeric value as entered (display units). `None` when absent, hidden
    /// or not a number.
    pub fn number(&self, id: &str) -> Option<f64> {
        self.inputs.get(id).and_then(|v| v.as_number())
    }

    /// Numeric value inside the input's declared `min`/`max`.
    pub fn bounded(&self, id: &str) -> Option<f64> {
        let value = self.number(id)?;
        let input = self.config.input(id)?;
        let above_min = input.min.map_or(true, |min| value >= min);
        let below_max = input.max.map_or(true, |max| value <= max);
        (above_min && below_max).then_some(value)
    }

    /// Numeric value converted to its unit type's base unit.
    ///
    /// Unitless inputs come back unchanged. `None` when missing or out of range.
    pub fn base_value(&self, id: &str) -> CalcResult<Option<f64>> {
        self.bounded(id).map(|v| self.to_base(id, v)).transpose()
    }

    /// A value the calculation cannot do without.
    ///
    /// # Errors
    ///
    /// `MissingField` when absent or hidden, `InvalidInput` when not a number
    /// or outside the declared range.
    pub fn require(&self, id: &str) -> CalcResult<f64> {
        self.optional(id)?.ok_or_else(|| CalcError::missing_field(id))
    }

    /// A value that may be left empty. Presence, not truthiness, decides:
    /// an entered `0` is `Some(0.0)`.
    pub fn optional(&self, id: &str) -> CalcResult<Option<f64>> {
        let Some(raw) = self.inputs.get(id).filter(|v| !v.is_blank()) else {
            return Ok(None);
        };
        self.check_option(id, raw)?;
        let value = raw
            .as_number()
            .ok_or_else(|| CalcError::invalid_input(id, raw.key(), "Not a number"))?;
        if let Some(def) = self.config.input(id) {
            let below = def.min.is_some_and(|min| value < min);
            let above = def.max.is_some_and(|max| value > max);
            if below || above {
                return Err(CalcError::invalid_input(id, raw.key(), "Out of range"));
            }
        }
        Ok(Some(value))
    }

    /// [`require`](Self::require), converted to the base unit.
    pub fn require_base(&self, id: &str) -> CalcResult<f64> {
        let value = self.require(id)?;
        self.to_base(id, value)
    }

    /// [`optional`](Self::optional), converted to the base unit.
    pub fn optional_base(&self, id: &str) -> CalcResult<Option<f64>> {
        self.optional(id)?.map(|v| self.to_base(id, v)).transpose()
    }

    /// Selected option key of an enumerated input.
    ///
    /// # Errors
    ///
    /// `MissingField` when absent, `InvalidInput` for a value that is not one
    /// of the declared options.
    pub fn require_choice(&self, id: &str) -> CalcResult<String> {
        let raw = self
            .inputs
            .get(id)
            .filter(|v| !v.is_blank())
            .ok_or_else(|| CalcError::missing_field(id))?;
        self.check_option(id, raw)?;
        Ok(raw.key())
    }

    /// Enumerated inputs only take their declared options.
    fn check_option(&self, id: &str, raw: &InputValue) -> CalcResult<()> {
        match self.config.input(id) {
            Some(def) if def.input_type.is_enumerated() && !def.has_option(raw) => {
                Err(CalcError::invalid_input(id, raw.key(), "Not one of the options"))
            }
            _ => Ok(()),
        }
    }

    pub fn require_date(&self, id: &str) -> CalcResult<NaiveDate> {
        let text = self.require_choice(id)?;
        NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .map_err(|_| CalcError::invalid_input(id, text, "Expected a date as YYYY-MM-DD"))
    }

    fn to_base(&self, id: &str, value: f64) -> CalcResult<f64> {
        let unit_type = self.config.input(id).and_then(|i| i.unit_type);
        match (unit_type, self.inputs.unit(id)) {
            (Some(unit_type), Some(unit)) => convert_to_base(value, unit, unit_type),
            _ => Ok(value),
        }
    }

    /// Toggle state; absent or hidden reads as `false`.
    pub fn flag(&self, id: &str) -> bool {
        self.inputs.get(id).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    /// Canonical text of the value (option keys, ISO dates).
    pub fn text(&self, id: &str) -> Option<String> {
        self.inputs.get(id).filter(|v| !v.is_blank()).map(|v| v.key())
    }

    pub fn date(&self, id: &str) -> Option<NaiveDate> {
        self.text(id)
            .and_then(|text| NaiveDate::parse_from_str(&text, "%Y-%m-%d").ok())
    }

    pub fn unit_of(&self, id: &str) -> Option<&'a str> {
        self.inputs.unit(id)
    }

    /// Currency code chosen for `id`, `USD` when none.
    pub fn currency_of(&self, id: &str) -> &'a str {
        self.unit_of(id).unwrap_or("USD")
    }

    pub fn envelope(&self) -> EnvelopeBuilder<'_, 'a> {
        EnvelopeBuilder::new(self)
    }
}

// ============================================================================
// Envelope builder
// ============================================================================

/// Collects raw results and formats each by its declared [`FormatHint`].
pub struct EnvelopeBuilder<'b, 'a> {
    input: &'b ComputeInput<'a>,
    currency: String,
    envelope: ResultsEnvelope,
    vars: BTreeMap<String, String>,
}

impl<'b, 'a> EnvelopeBuilder<'b, 'a> {
    fn new(input: &'b ComputeInput<'a>) -> Self {
        EnvelopeBuilder {
            input,
            currency: "USD".to_string(),
            envelope: ResultsEnvelope::default(),
            vars: BTreeMap::new(),
        }
    }

    /// Currency code used for `currency` results.
    pub fn currency(mut self, code: &str) -> Self {
        self.currency = code.to_string();
        self
    }

    /// Store a result and its formatted text.
    pub fn set(&mut self, id: &str, value: impl Into<ResultValue>) -> &mut Self {
        let value = value.into();
        let (hint, decimals) = self.definition(id);
        let unit = (hint == FormatHint::Currency).then_some(self.currency.as_str());
        let text = self.input.fmt.format(&value, hint, decimals, unit);
        self.insert(id, value, text)
    }

    /// Store a result measured in `unit` (`"lbs"`, `"l"`, ...).
    pub fn set_in(&mut self, id: &str, value: f64, unit: &str) -> &mut Self {
        let value = ResultValue::Number(value);
        let (hint, decimals) = self.definition(id);
        let text = self.input.fmt.format(&value, hint, decimals, Some(unit));
        self.insert(id, value, text)
    }

    /// Store a result with caller-built display text.
    pub fn set_formatted(&mut self, id: &str, value: impl Into<ResultValue>, text: impl Into<String>) -> &mut Self {
        self.insert(id, value.into(), text.into())
    }

    /// Extra `{placeholder}` for the summary template.
    pub fn var(&mut self, key: &str, text: impl Into<String>) -> &mut Self {
        self.vars.insert(key.to_string(), text.into());
        self
    }

    pub fn chart(&mut self, rows: Vec<DataRow>) -> &mut Self {
        self.envelope.metadata.chart_data = Some(rows);
        self
    }

    pub fn table(&mut self, rows: Vec<DataRow>) -> &mut Self {
        self.envelope.metadata.table_data = Some(rows);
        self
    }

    /// Finish a valid envelope, rendering `formats.summary`.
    pub fn build(mut self) -> ResultsEnvelope {
        let mut vars = self.envelope.formatted.clone();
        vars.append(&mut self.vars);
        self.envelope.summary = self.input.t.render("summary", &vars);
        self.envelope.is_valid = true;
        self.envelope
    }

    fn definition(&self, id: &str) -> (FormatHint, Option<u8>) {
        match self.input.config.result(id) {
            Some(def) => (def.format, def.decimals),
            None => (FormatHint::Number, None),
        }
    }

    fn insert(&mut self, id: &str, value: ResultValue, text: String) -> &mut Self {
        self.envelope.values.insert(id.to_string(), value);
        self.envelope.formatted.insert(id.to_string(), text);
        self
    }
}
