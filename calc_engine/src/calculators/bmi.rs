//! # BMI
//!
//! Body mass index (`kg / m²`), its WHO adult category and the weight range
//! that keeps BMI between 18.5 and 24.9 at the given height.

use serde::{Deserialize, Serialize};

use crate::compute::{or_invalid, Calculator, ComputeInput, DataRow, ResultsEnvelope};
use crate::errors::{CalcError, CalcResult};
use crate::row;
use crate::units::{Centimeters, Kilograms};

/// Lower and upper BMI of the normal-weight band
pub const HEALTHY_BMI: (f64, f64) = (18.5, 24.9);

/// WHO adult weight categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub const ALL: [BmiCategory; 4] = [
        BmiCategory::Underweight,
        BmiCategory::Normal,
        BmiCategory::Overweight,
        BmiCategory::Obese,
    ];

    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }

    /// Phrase key in the translation bundle
    pub fn key(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "underweight",
            BmiCategory::Normal => "normal",
            BmiCategory::Overweight => "overweight",
            BmiCategory::Obese => "obese",
        }
    }

    /// BMI bounds of the band; `None` for an open end.
    pub fn bounds(&self) -> (Option<f64>, Option<f64>) {
        match self {
            BmiCategory::Underweight => (None, Some(18.5)),
            BmiCategory::Normal => (Some(18.5), Some(24.9)),
            BmiCategory::Overweight => (Some(25.0), Some(29.9)),
            BmiCategory::Obese => (Some(30.0), None),
        }
    }
}

pub fn bmi(weight: Kilograms, height: Centimeters) -> f64 {
    let meters = height.meters();
    weight.value() / (meters * meters)
}

/// Weights with a normal BMI at `height`.
pub fn healthy_range(height: Centimeters) -> (Kilograms, Kilograms) {
    let m2 = height.meters() * height.meters();
    (Kilograms(HEALTHY_BMI.0 * m2), Kilograms(HEALTHY_BMI.1 * m2))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BmiInput {
    pub weight: Kilograms,
    pub height: Centimeters,
}

impl BmiInput {
    fn read(input: &ComputeInput<'_>) -> CalcResult<Self> {
        Ok(BmiInput {
            weight: Kilograms(input.require_base("weight")?),
            height: Centimeters(input.require_base("height")?),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BmiResult {
    pub bmi: f64,
    pub category: BmiCategory,
    pub healthy_min: Kilograms,
    pub healthy_max: Kilograms,
    pub bmi_prime: f64,
}

pub fn calculate(input: &BmiInput) -> CalcResult<BmiResult> {
    if input.height.value() <= 0.0 {
        return Err(CalcError::invalid_input("height", input.height.value().to_string(), "Height must be positive"));
    }
    let value = bmi(input.weight, input.height);
    let (healthy_min, healthy_max) = healthy_range(input.height);
    Ok(BmiResult {
        bmi: value,
        category: BmiCategory::from_bmi(value),
        healthy_min,
        healthy_max,
        bmi_prime: value / 25.0,
    })
}

fn category_table(input: &ComputeInput<'_>) -> Vec<DataRow> {
    BmiCategory::ALL
        .iter()
        .map(|category| {
            let mut row = row! { "category" => input.t.phrase(category.key()) };
            let (min, max) = category.bounds();
            if let Some(min) = min {
                row.extend(row! { "minBmi" => min });
            }
            if let Some(max) = max {
                row.extend(row! { "maxBmi" => max });
            }
            row
        })
        .collect()
}

pub struct Bmi;

impl Calculator for Bmi {
    fn id(&self) -> &'static str {
        "bmi"
    }

    fn config_source(&self) -> &'static str {
        include_str!("../../configs/bmi.json")
    }

    fn compute(&self, input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope> {
        or_invalid(self.id(), envelope(input))
    }
}

fn envelope(input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope> {
    let result = calculate(&BmiInput::read(input)?)?;
    let unit = input.unit_of("weight").unwrap_or("kg");

    let mut out = input.envelope();
    out.set("bmi", result.bmi)
        .set("category", input.t.phrase(result.category.key()))
        .set_in("healthyMin", result.healthy_min.to_unit(unit)?, unit)
        .set_in("healthyMax", result.healthy_max.to_unit(unit)?, unit)
        .set("bmiPrime", result.bmi_prime)
        .table(category_table(input));
    Ok(out.build())
}
