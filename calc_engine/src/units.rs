//! # Unit Conversion
//!
//! Converts `(value, unit, unit type)` triples to a canonical base unit per
//! [`UnitType`] and back. Calculators always compute in base units:
//!
//! | Unit type | Base unit | Units |
//! |---|---|---|
//! | `weight` | kilograms | `kg`, `g`, `lbs` (`lb`), `oz`, `st` |
//! | `height` / `length` | centimeters | `mm`, `cm`, `m`, `km`, `in`, `ft`, `ft_in`, `yd`, `mi` |
//! | `data` | bytes (decimal SI) | `B`, `KB`, `MB`, `GB`, `TB`, `PB` |
//! | `data_rate` | bits per second | `bps`, `Kbps`, `Mbps`, `Gbps` |
//! | `volume` | milliliters | `ml`, `l`, `fl_oz`, `cup` |
//! | `time` | seconds | `s`, `min`, `h`, `day` |
//! | `currency`, `percentage` | identity | any code |
//!
//! `ft_in` is a composite unit. Its scalar form is *total inches*; text such as
//! `5'10"` goes through [`parse_composite`] first.
//!
//! Currency amounts are never converted. The unit code only selects a display
//! glyph from a [`SymbolTable`].
//!
//! ## Example
//!
//! ```rust
//! use calc_engine::units::{convert_to_base, convert_from_base, UnitType};
//!
//! let kg = convert_to_base(200.0, "lbs", UnitType::Weight).unwrap();
//! assert!((kg - 90.718474).abs() < 1e-6);
//!
//! let back = convert_from_base(kg, "lbs", UnitType::Weight).unwrap();
//! assert!((back - 200.0).abs() < 1e-9);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

// ============================================================================
// Unit Types
// ============================================================================

/// Category of units sharing one base unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    Weight,
    Height,
    Length,
    Data,
    DataRate,
    Volume,
    Time,
    Currency,
    Percentage,
}

/// Physical dimension behind a unit type. `Height` and `Length` share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Dimension {
    Mass,
    Distance,
    Information,
    Throughput,
    Capacity,
    Duration,
}

impl UnitType {
    /// All unit types, in documentation order
    pub const ALL: [UnitType; 9] = [
        UnitType::Weight,
        UnitType::Height,
        UnitType::Length,
        UnitType::Data,
        UnitType::DataRate,
        UnitType::Volume,
        UnitType::Time,
        UnitType::Currency,
        UnitType::Percentage,
    ];

    /// Configuration spelling (`"data_rate"`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Weight => "weight",
            UnitType::Height => "height",
            UnitType::Length => "length",
            UnitType::Data => "data",
            UnitType::DataRate => "data_rate",
            UnitType::Volume => "volume",
            UnitType::Time => "time",
            UnitType::Currency => "currency",
            UnitType::Percentage => "percentage",
        }
    }

    /// Canonical unit values are normalized to
    pub fn base_unit(&self) -> &'static str {
        match self {
            UnitType::Weight => "kg",
            UnitType::Height | UnitType::Length => "cm",
            UnitType::Data => "B",
            UnitType::DataRate => "bps",
            UnitType::Volume => "ml",
            UnitType::Time => "s",
            UnitType::Currency => "USD",
            UnitType::Percentage => "%",
        }
    }

    /// Pass-through types carry a unit code but are never scaled.
    pub fn is_convertible(&self) -> bool {
        self.dimension().is_some()
    }

    /// Units a configuration may list for this type. Empty for pass-through types.
    pub fn units(&self) -> Vec<&'static str> {
        match self.dimension() {
            Some(dim) => UNIT_TABLE
                .iter()
                .filter(|def| def.dimension == dim)
                .map(|def| def.symbol)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Whether `unit` is acceptable for this type.
    pub fn supports(&self, unit: &str) -> bool {
        match self.dimension() {
            Some(dim) => lookup(dim, unit).is_some(),
            None => !unit.trim().is_empty(),
        }
    }

    fn dimension(&self) -> Option<Dimension> {
        match self {
            UnitType::Weight => Some(Dimension::Mass),
            UnitType::Height | UnitType::Length => Some(Dimension::Distance),
            UnitType::Data => Some(Dimension::Information),
            UnitType::DataRate => Some(Dimension::Throughput),
            UnitType::Volume => Some(Dimension::Capacity),
            UnitType::Time => Some(Dimension::Duration),
            UnitType::Currency | UnitType::Percentage => None,
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitType {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UnitType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CalcError::unknown_unit_type(s))
    }
}

// ============================================================================
// Unit Registry
// ============================================================================

/// One convertible unit: `base = value * factor`.
#[derive(Debug, Clone, Copy)]
struct UnitDefinition {
    symbol: &'static str,
    dimension: Dimension,
    factor: f64,
}

const fn unit(symbol: &'static str, dimension: Dimension, factor: f64) -> UnitDefinition {
    UnitDefinition {
        symbol,
        dimension,
        factor,
    }
}

const POUND_KG: f64 = 0.453_592_37;
const INCH_CM: f64 = 2.54;

const UNIT_TABLE: &[UnitDefinition] = &[
    // Mass (base: kg)
    unit("kg", Dimension::Mass, 1.0),
    unit("g", Dimension::Mass, 0.001),
    unit("lbs", Dimension::Mass, POUND_KG),
    unit("lb", Dimension::Mass, POUND_KG),
    unit("oz", Dimension::Mass, POUND_KG / 16.0),
    unit("st", Dimension::Mass, POUND_KG * 14.0),
    // Distance (base: cm)
    unit("mm", Dimension::Distance, 0.1),
    unit("cm", Dimension::Distance, 1.0),
    unit("m", Dimension::Distance, 100.0),
    unit("km", Dimension::Distance, 100_000.0),
    unit("in", Dimension::Distance, INCH_CM),
    unit("ft", Dimension::Distance, INCH_CM * 12.0),
    unit("ft_in", Dimension::Distance, INCH_CM),
    unit("yd", Dimension::Distance, INCH_CM * 36.0),
    unit("mi", Dimension::Distance, INCH_CM * 63_360.0),
    // Information (base: bytes, decimal SI)
    unit("B", Dimension::Information, 1.0),
    unit("KB", Dimension::Information, 1e3),
    unit("MB", Dimension::Information, 1e6),
    unit("GB", Dimension::Information, 1e9),
    unit("TB", Dimension::Information, 1e12),
    unit("PB", Dimension::Information, 1e15),
    // Throughput (base: bits/s)
    unit("bps", Dimension::Throughput, 1.0),
    unit("Kbps", Dimension::Throughput, 1e3),
    unit("Mbps", Dimension::Throughput, 1e6),
    unit("Gbps", Dimension::Throughput, 1e9),
    // Capacity (base: ml)
    unit("ml", Dimension::Capacity, 1.0),
    unit("l", Dimension::Capacity, 1000.0),
    unit("fl_oz", Dimension::Capacity, 29.573_529_562_5),
    unit("cup", Dimension::Capacity, 236.588_236_5),
    // Duration (base: s)
    unit("s", Dimension::Duration, 1.0),
    unit("min", Dimension::Duration, 60.0),
    unit("h", Dimension::Duration, 3600.0),
    unit("day", Dimension::Duration, 86_400.0),
];

/// Index over [`UNIT_TABLE`], built once on first use.
static UNIT_REGISTRY: Lazy<HashMap<(Dimension, &'static str), f64>> = Lazy::new(|| {
    UNIT_TABLE
        .iter()
        .map(|def| ((def.dimension, def.symbol), def.factor))
        .collect()
});

fn lookup(dimension: Dimension, unit: &str) -> Option<f64> {
    UNIT_REGISTRY.get(&(dimension, unit)).copied()
}

fn factor_for(unit: &str, unit_type: UnitType) -> CalcResult<Option<f64>> {
    match unit_type.dimension() {
        Some(dim) => lookup(dim, unit)
            .map(Some)
            .ok_or_else(|| CalcError::unsupported_unit(unit, unit_type.as_str())),
        None if unit.trim().is_empty() => Err(CalcError::unsupported_unit(unit, unit_type.as_str())),
        None => Ok(None),
    }
}

// ============================================================================
// Conversion
// ============================================================================

/// Convert a display value to the base unit of `unit_type`.
///
/// Pass-through types (currency, percentage) return `value` unchanged.
///
/// # Errors
///
/// `UnsupportedUnit` when `unit` is not defined for `unit_type`.
pub fn convert_to_base(value: f64, unit: &str, unit_type: UnitType) -> CalcResult<f64> {
    Ok(match factor_for(unit, unit_type)? {
        Some(factor) => value * factor,
        None => value,
    })
}

/// Convert a base-unit value to `unit` for display.
pub fn convert_from_base(value: f64, unit: &str, unit_type: UnitType) -> CalcResult<f64> {
    Ok(match factor_for(unit, unit_type)? {
        Some(factor) => value / factor,
        None => value,
    })
}

/// Convert directly between two units of the same type.
pub fn convert(value: f64, from: &str, to: &str, unit_type: UnitType) -> CalcResult<f64> {
    let base = convert_to_base(value, from, unit_type)?;
    convert_from_base(base, to, unit_type)
}

// ============================================================================
// Composite feet + inches
// ============================================================================

/// Parse a feet/inches entry into total inches.
///
/// Accepted forms: `5'10"`, `5' 10`, `5ft 10in`, `5 feet 10 inches`, `5 10`,
/// `5-10`, `6'` and a bare number (already total inches).
pub fn parse_composite(text: &str) -> CalcResult<f64> {
    let invalid = |reason: &str| CalcError::invalid_input("ft_in", text, reason);

    let normalized = text
        .trim()
        .to_lowercase()
        .replace('′', "'")
        .replace('″', "\"")
        .replace("feet", "'")
        .replace("foot", "'")
        .replace("ft", "'")
        .replace("inches", "\"")
        .replace("inch", "\"")
        .replace("in", "\"");

    if normalized.is_empty() {
        return Err(invalid("Empty height"));
    }

    let parse_part = |part: &str| -> CalcResult<f64> {
        let cleaned = part.trim().trim_end_matches('"').trim();
        if cleaned.is_empty() {
            return Ok(0.0);
        }
        let value: f64 = cleaned.parse().map_err(|_| invalid("Not a number"))?;
        if !value.is_finite() || value < 0.0 {
            return Err(invalid("Must be a non-negative number"));
        }
        Ok(value)
    };

    let (feet, inches) = if let Some((feet, rest)) = normalized.split_once('\'') {
        (parse_part(feet)?, parse_part(rest)?)
    } else {
        let parts: Vec<&str> = normalized
            .split(|c: char| c.is_whitespace() || c == '-')
            .filter(|p| !p.is_empty())
            .collect();
        match parts.as_slice() {
            [total] => (0.0, parse_part(total)?),
            [feet, inches] => (parse_part(feet)?, parse_part(inches)?),
            _ => return Err(invalid("Expected feet and inches")),
        }
    };

    Ok(feet * 12.0 + inches)
}

/// Render total inches as `5' 10"`, rounded to the nearest inch.
pub fn format_composite(total_inches: f64) -> String {
    let rounded = total_inches.max(0.0).round();
    let feet = (rounded / 12.0).floor();
    let inches = rounded - feet * 12.0;
    format!("{}' {}\"", feet as i64, inches as i64)
}

// ============================================================================
// Symbol Table
// ============================================================================

/// Read-only map from currency/unit code to display glyph.
///
/// Built once at startup and handed to the formatter; nothing mutates it
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolTable {
    symbols: BTreeMap<String, String>,
}

impl SymbolTable {
    /// Built-in currency and unit glyphs.
    pub fn builtin() -> Self {
        let pairs: &[(&str, &str)] = &[
            // Currencies
            ("USD", "$"),
            ("EUR", "€"),
            ("GBP", "£"),
            ("JPY", "¥"),
            ("CNY", "¥"),
            ("INR", "₹"),
            ("KRW", "₩"),
            ("RUB", "₽"),
            ("BRL", "R$"),
            ("CAD", "CA$"),
            ("AUD", "A$"),
            ("MXN", "MX$"),
            ("CHF", "CHF"),
            // Units
            ("kg", "kg"),
            ("g", "g"),
            ("lbs", "lbs"),
            ("lb", "lb"),
            ("oz", "oz"),
            ("st", "st"),
            ("cm", "cm"),
            ("m", "m"),
            ("in", "in"),
            ("ft", "ft"),
            ("yd", "yd"),
            ("sq_ft", "sq ft"),
            ("m2", "m²"),
            ("ml", "ml"),
            ("l", "L"),
            ("fl_oz", "fl oz"),
            ("cup", "cups"),
            ("s", "s"),
            ("min", "min"),
            ("h", "h"),
            ("%", "%"),
        ];
        SymbolTable {
            symbols: pairs
                .iter()
                .map(|(code, glyph)| (code.to_string(), glyph.to_string()))
                .collect(),
        }
    }

    /// Add or replace glyphs (from engine settings).
    pub fn with_overrides<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.symbols
            .extend(overrides.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Glyph for `code`, or the code itself when unknown.
    pub fn symbol<'a>(&'a self, code: &'a str) -> &'a str {
        self.symbols.get(code).map(String::as_str).unwrap_or(code)
    }

    /// Whether a glyph is registered for `code`.
    pub fn contains(&self, code: &str) -> bool {
        self.symbols.contains_key(code)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::builtin()
    }
}

// ============================================================================
// Base-unit newtypes
// ============================================================================

/// Mass in kilograms
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilograms(pub f64);

/// Length in centimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Centimeters(pub f64);

/// Data size in bytes
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bytes(pub f64);

/// Data rate in bits per second
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BitsPerSecond(pub f64);

/// Volume in milliliters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Milliliters(pub f64);

/// Duration in seconds
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seconds(pub f64);

impl Kilograms {
    pub fn pounds(self) -> f64 {
        self.0 / POUND_KG
    }
}

impl Centimeters {
    pub fn meters(self) -> f64 {
        self.0 / 100.0
    }

    pub fn inches(self) -> f64 {
        self.0 / INCH_CM
    }

    pub fn feet(self) -> f64 {
        self.0 / (INCH_CM * 12.0)
    }
}

impl Bytes {
    pub fn bits(self) -> f64 {
        self.0 * 8.0
    }
}

impl Milliliters {
    pub fn liters(self) -> f64 {
        self.0 / 1000.0
    }
}

impl Seconds {
    pub fn minutes(self) -> f64 {
        self.0 / 60.0
    }

    pub fn hours(self) -> f64 {
        self.0 / 3600.0
    }
}

macro_rules! impl_arithmetic {
    ($type:ty, $unit_type:expr) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw base-unit value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Convert a display value in `unit` to this base unit
            pub fn from_unit(value: f64, unit: &str) -> CalcResult<Self> {
                convert_to_base(value, unit, $unit_type).map(Self)
            }

            /// Express this value in `unit`
            pub fn to_unit(self, unit: &str) -> CalcResult<f64> {
                convert_from_base(self.0, unit, $unit_type)
            }
        }
    };
}

impl_arithmetic!(Kilograms, UnitType::Weight);
impl_arithmetic!(Centimeters, UnitType::Length);
impl_arithmetic!(Bytes, UnitType::Data);
impl_arithmetic!(BitsPerSecond, UnitType::DataRate);
impl_arithmetic!(Milliliters, UnitType::Volume);
impl_arithmetic!(Seconds, UnitType::Time);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_weight_to_base() {
        assert_relative_eq!(convert_to_base(1.0, "lbs", UnitType::Weight).unwrap(), 0.45359237, epsilon = 1e-9);
        assert_relative_eq!(convert_to_base(1.0, "st", UnitType::Weight).unwrap(), 6.35029318, epsilon = 1e-9);
        assert_relative_eq!(convert_to_base(500.0, "g", UnitType::Weight).unwrap(), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_height_and_length_share_base() {
        let h = convert_to_base(70.0, "in", UnitType::Height).unwrap();
        let l = convert_to_base(70.0, "in", UnitType::Length).unwrap();
        assert_relative_eq!(h, 177.8, epsilon = 1e-9);
        assert_relative_eq!(h, l, epsilon = 1e-9);
        assert_relative_eq!(convert_to_base(1.0, "yd", UnitType::Length).unwrap(), 91.44, epsilon = 1e-9);
    }

    #[test]
    fn test_data_is_decimal_si() {
        assert_relative_eq!(convert_to_base(1.5, "GB", UnitType::Data).unwrap(), 1.5e9, epsilon = 1e-9);
        assert_relative_eq!(convert_to_base(100.0, "Mbps", UnitType::DataRate).unwrap(), 1e8, epsilon = 1e-9);
    }

    #[test]
    fn test_currency_is_identity() {
        assert_eq!(convert_to_base(42.5, "EUR", UnitType::Currency).unwrap(), 42.5);
        assert_eq!(convert_from_base(42.5, "JPY", UnitType::Currency).unwrap(), 42.5);
    }

    #[test]
    fn test_unsupported_unit_fails() {
        let err = convert_to_base(1.0, "furlong", UnitType::Length).unwrap_err();
        assert_eq!(err, CalcError::unsupported_unit("furlong", "length"));

        // Units from a different dimension are rejected too
        assert!(convert_to_base(1.0, "kg", UnitType::Height).is_err());
        assert!(convert_to_base(1.0, "", UnitType::Currency).is_err());
    }

    #[test]
    fn test_unit_type_parsing() {
        assert_eq!("data_rate".parse::<UnitType>().unwrap(), UnitType::DataRate);
        assert_eq!(
            "temperature".parse::<UnitType>().unwrap_err().error_code(),
            "UNKNOWN_UNIT_TYPE"
        );
    }

    #[test]
    fn test_parse_composite_forms() {
        for text in ["5'10\"", "5' 10", "5ft 10in", "5 feet 10 inches", "5 10", "5-10", "70"] {
            assert_relative_eq!(parse_composite(text).unwrap(), 70.0, epsilon = 1e-9);
        }
        assert_relative_eq!(parse_composite("6'").unwrap(), 72.0, epsilon = 1e-9);
        assert_relative_eq!(parse_composite("5′ 7.5″").unwrap(), 67.5, epsilon = 1e-9);
    }

    #[test]
    fn test_parse_composite_rejects_garbage() {
        assert!(parse_composite("").is_err());
        assert!(parse_composite("tall").is_err());
        assert!(parse_composite("5 10 3").is_err());
        assert!(parse_composite("-5'2").is_err());
    }

    #[test]
    fn test_format_composite() {
        assert_eq!(format_composite(70.0), "5' 10\"");
        assert_eq!(format_composite(71.6), "6' 0\"");
        assert_eq!(format_composite(177.8 / 2.54), "5' 10\"");
    }

    #[test]
    fn test_symbol_table() {
        let table = SymbolTable::builtin().with_overrides([("CAD", "$")]);
        assert_eq!(table.symbol("USD"), "$");
        assert_eq!(table.symbol("CAD"), "$");
        assert_eq!(table.symbol("XYZ"), "XYZ");
        assert!(table.contains("EUR"));
    }

    #[test]
    fn test_newtypes() {
        let w = Kilograms::from_unit(200.0, "lbs").unwrap();
        assert_relative_eq!(w.pounds(), 200.0, epsilon = 1e-9);
        let h = Centimeters::from_unit(70.0, "ft_in").unwrap();
        assert_relative_eq!(h.inches(), 70.0, epsilon = 1e-9);
        assert_relative_eq!((h * 2.0).meters(), 3.556, epsilon = 1e-9);
        assert_relative_eq!(Bytes(1.0).bits(), 8.0, epsilon = 1e-9);
    }

    fn any_convertible_unit() -> impl Strategy<Value = (UnitType, &'static str)> {
        let pairs: Vec<(UnitType, &'static str)> = UnitType::ALL
            .iter()
            .flat_map(|t| t.units().into_iter().map(move |u| (*t, u)))
            .collect();
        proptest::sample::select(pairs)
    }

    proptest! {
        /// convert_to_base then convert_from_base reproduces the display value.
        #[test]
        fn round_trip_law((unit_type, unit) in any_convertible_unit(), value in 0.0f64..1e9) {
            let base = convert_to_base(value, unit, unit_type).unwrap();
            let back = convert_from_base(base, unit, unit_type).unwrap();
            prop_assert!((back - value).abs() <= value.abs() * 1e-12 + 1e-12);
        }

        #[test]
        fn composite_round_trip(total in 0u32..120) {
            let text = format_composite(total as f64);
            prop_assert_eq!(parse_composite(&text).unwrap(), total as f64);
        }
    }
}
