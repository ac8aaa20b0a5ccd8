//! # Ideal Weight
//!
//! Each formula adds a fixed weight per inch of height over five feet to a
//! base weight. Heights under five feet extrapolate the same line downward.

use serde::{Deserialize, Serialize};

use super::bmi::healthy_range;
use super::Sex;
use crate::compute::{or_invalid, Calculator, ComputeInput, DataRow, ResultsEnvelope};
use crate::errors::{CalcError, CalcResult};
use crate::row;
use crate::units::{Centimeters, Kilograms};

const FIVE_FEET_IN: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeightFormula {
    Robinson,
    Miller,
    Devine,
    Hamwi,
}

impl WeightFormula {
    pub const ALL: [WeightFormula; 4] = [
        WeightFormula::Robinson,
        WeightFormula::Miller,
        WeightFormula::Devine,
        WeightFormula::Hamwi,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            WeightFormula::Robinson => "robinson",
            WeightFormula::Miller => "miller",
            WeightFormula::Devine => "devine",
            WeightFormula::Hamwi => "hamwi",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        WeightFormula::ALL.into_iter().find(|f| f.key() == key)
    }

    /// `(base kg at five feet, kg per extra inch)`
    fn coefficients(&self, sex: Sex) -> (f64, f64) {
        match (self, sex) {
            (WeightFormula::Robinson, Sex::Male) => (52.0, 1.9),
            (WeightFormula::Robinson, Sex::Female) => (49.0, 1.7),
            (WeightFormula::Miller, Sex::Male) => (56.2, 1.41),
            (WeightFormula::Miller, Sex::Female) => (53.1, 1.36),
            (WeightFormula::Devine, Sex::Male) => (50.0, 2.3),
            (WeightFormula::Devine, Sex::Female) => (45.5, 2.3),
            (WeightFormula::Hamwi, Sex::Male) => (48.0, 2.7),
            (WeightFormula::Hamwi, Sex::Female) => (45.5, 2.2),
        }
    }

    pub fn ideal_weight(&self, sex: Sex, height: Centimeters) -> Kilograms {
        let (base, per_inch) = self.coefficients(sex);
        Kilograms(base + per_inch * (height.inches() - FIVE_FEET_IN))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdealWeightInput {
    pub sex: Sex,
    pub height: Centimeters,
    pub formula: WeightFormula,
}

impl IdealWeightInput {
    fn read(input: &ComputeInput<'_>) -> CalcResult<Self> {
        let key = input.text("formula").unwrap_or_else(|| "devine".to_string());
        let formula = WeightFormula::from_key(&key)
            .ok_or_else(|| CalcError::invalid_input("formula", key.clone(), "Unknown formula"))?;
        Ok(IdealWeightInput {
            sex: Sex::read(input, "gender")?,
            height: Centimeters(input.require_base("height")?),
            formula,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdealWeightResult {
    pub ideal: Kilograms,
    pub healthy_min: Kilograms,
    pub healthy_max: Kilograms,
    /// Every formula, in [`WeightFormula::ALL`] order
    pub comparison: Vec<(WeightFormula, Kilograms)>,
}

pub fn calculate(input: &IdealWeightInput) -> CalcResult<IdealWeightResult> {
    let ideal = input.formula.ideal_weight(input.sex, input.height);
    if ideal.value() <= 0.0 {
        return Err(CalcError::invalid_input(
            "height",
            input.height.value().to_string(),
            "Too short for the height formulas",
        ));
    }
    let (healthy_min, healthy_max) = healthy_range(input.height);
    Ok(IdealWeightResult {
        ideal,
        healthy_min,
        healthy_max,
        comparison: WeightFormula::ALL
            .iter()
            .map(|f| (*f, f.ideal_weight(input.sex, input.height)))
            .collect(),
    })
}

pub struct IdealWeight;

impl Calculator for IdealWeight {
    fn id(&self) -> &'static str {
        "ideal-weight"
    }

    fn config_source(&self) -> &'static str {
        include_str!("../../configs/ideal-weight.json")
    }

    fn compute(&self, input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope> {
        or_invalid(self.id(), envelope(input))
    }
}

fn envelope(input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope> {
    let params = IdealWeightInput::read(input)?;
    let result = calculate(&params)?;
    let unit = match input.text("weightUnit").as_deref() {
        Some("kg") => "kg",
        _ => "lbs",
    };

    let table = result
        .comparison
        .iter()
        .map(|(formula, weight)| {
            Ok(row! {
                "formula" => input.t.option_label("formula", formula.key()),
                "weight" => weight.to_unit(unit)?,
            })
        })
        .collect::<CalcResult<Vec<DataRow>>>()?;

    let mut out = input.envelope();
    out.set_in("idealWeight", result.ideal.to_unit(unit)?, unit)
        .set_in("healthyMin", result.healthy_min.to_unit(unit)?, unit)
        .set_in("healthyMax", result.healthy_max.to_unit(unit)?, unit)
        .var("formulaName", input.t.option_label("formula", params.formula.key()))
        .table(table);
    Ok(out.build())
}
