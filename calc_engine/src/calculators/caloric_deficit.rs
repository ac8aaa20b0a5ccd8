//! # Caloric Deficit
//!
//! Basal metabolic rate, maintenance calories (TDEE) and a daily target that
//! sits a chosen percentage below maintenance.
//!
//! ## BMR formulas
//!
//! | Formula | Male | Female |
//! |---|---|---|
//! | Mifflin-St Jeor | 10W + 6.25H - 5A + 5 | 10W + 6.25H - 5A - 161 |
//! | Harris-Benedict (revised) | 88.362 + 13.397W + 4.799H - 5.677A | 447.593 + 9.247W + 3.098H - 4.330A |
//! | Katch-McArdle | 370 + 21.6 LBM | same |
//!
//! W is weight in kg, H height in cm, A age in years, LBM lean body mass in kg.

use serde::{Deserialize, Serialize};

use super::Sex;
use crate::compute::{or_invalid, Calculator, ComputeInput, DataRow, ResultsEnvelope};
use crate::derive::{weight_projection, KCAL_PER_KG};
use crate::errors::{CalcError, CalcResult};
use crate::row;
use crate::units::{Centimeters, Kilograms};

/// Deficits shown in the comparison table, in percent of maintenance
pub const COMPARISON_DEFICITS: [f64; 4] = [10.0, 15.0, 20.0, 25.0];

/// Weeks covered by the projection chart
pub const PROJECTION_WEEKS: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BmrFormula {
    MifflinStJeor,
    HarrisBenedict,
    KatchMcArdle { body_fat_pct: f64 },
}

impl BmrFormula {
    pub fn bmr(&self, sex: Sex, weight: Kilograms, height: Centimeters, age: f64) -> f64 {
        let (w, h) = (weight.value(), height.value());
        match (self, sex) {
            (BmrFormula::MifflinStJeor, Sex::Male) => 10.0 * w + 6.25 * h - 5.0 * age + 5.0,
            (BmrFormula::MifflinStJeor, Sex::Female) => 10.0 * w + 6.25 * h - 5.0 * age - 161.0,
            (BmrFormula::HarrisBenedict, Sex::Male) => 88.362 + 13.397 * w + 4.799 * h - 5.677 * age,
            (BmrFormula::HarrisBenedict, Sex::Female) => 447.593 + 9.247 * w + 3.098 * h - 4.330 * age,
            (BmrFormula::KatchMcArdle { body_fat_pct }, _) => {
                370.0 + 21.6 * w * (1.0 - body_fat_pct / 100.0)
            }
        }
    }
}

/// Maintenance multiplier for an `activityLevel` option.
pub fn activity_multiplier(level: &str) -> Option<f64> {
    match level {
        "sedentary" => Some(1.2),
        "light" => Some(1.375),
        "moderate" => Some(1.55),
        "active" => Some(1.725),
        "veryActive" => Some(1.9),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeficitInput {
    pub sex: Sex,
    pub age: f64,
    pub weight: Kilograms,
    pub height: Centimeters,
    pub activity_multiplier: f64,
    pub formula: BmrFormula,
    pub deficit_pct: f64,
}

impl DeficitInput {
    fn read(input: &ComputeInput<'_>) -> CalcResult<Self> {
        let level = input.require_choice("activityLevel")?;
        let multiplier = activity_multiplier(&level)
            .ok_or_else(|| CalcError::invalid_input("activityLevel", level.clone(), "Unknown activity level"))?;
        let formula = match input.text("formula").as_deref() {
            Some("harris") => BmrFormula::HarrisBenedict,
            Some("katch") => BmrFormula::KatchMcArdle {
                body_fat_pct: input.require("bodyFat")?,
            },
            _ => BmrFormula::MifflinStJeor,
        };
        Ok(DeficitInput {
            sex: Sex::read(input, "gender")?,
            age: input.require("age")?,
            weight: Kilograms(input.require_base("weight")?),
            height: Centimeters(input.require_base("height")?),
            activity_multiplier: multiplier,
            formula,
            deficit_pct: input.require("deficitPercent")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeficitResult {
    pub bmr: f64,
    pub tdee: f64,
    pub target_calories: f64,
    pub daily_deficit: f64,
    /// Expected loss per week
    pub weekly_loss: Kilograms,
    /// Target below the usual minimum intake for `sex`
    pub below_minimum: bool,
}

pub fn calculate(input: &DeficitInput) -> CalcResult<DeficitResult> {
    let bmr = input.formula.bmr(input.sex, input.weight, input.height, input.age);
    if bmr <= 0.0 {
        return Err(CalcError::invalid_input("weight", input.weight.value().to_string(), "No positive BMR"));
    }
    let tdee = bmr * input.activity_multiplier;
    let daily_deficit = tdee * input.deficit_pct / 100.0;
    let target_calories = tdee - daily_deficit;
    Ok(DeficitResult {
        bmr,
        tdee,
        target_calories,
        daily_deficit,
        weekly_loss: Kilograms(daily_deficit * 7.0 / KCAL_PER_KG),
        below_minimum: target_calories < input.sex.minimum_intake(),
    })
}

/// Target, deficit and weekly loss for each of [`COMPARISON_DEFICITS`].
pub fn deficit_comparison(input: &DeficitInput, weight_unit: &str) -> CalcResult<Vec<DataRow>> {
    COMPARISON_DEFICITS
        .iter()
        .map(|&pct| {
            let result = calculate(&DeficitInput {
                deficit_pct: pct,
                ..input.clone()
            })?;
            Ok(row! {
                "deficitPercent" => pct,
                "targetCalories" => result.target_calories,
                "dailyDeficit" => result.daily_deficit,
                "weeklyLoss" => result.weekly_loss.to_unit(weight_unit)?,
            })
        })
        .collect()
}

/// Weekly weight over [`PROJECTION_WEEKS`], in `weight_unit`.
pub fn projection_chart(start: Kilograms, daily_deficit: f64, weight_unit: &str) -> CalcResult<Vec<DataRow>> {
    weight_projection(start.value(), daily_deficit, PROJECTION_WEEKS)
        .into_iter()
        .map(|(week, kg)| {
            Ok(row! {
                "week" => week,
                "weight" => Kilograms(kg).to_unit(weight_unit)?,
            })
        })
        .collect()
}

pub struct CaloricDeficit;

impl Calculator for CaloricDeficit {
    fn id(&self) -> &'static str {
        "caloric-deficit"
    }

    fn config_source(&self) -> &'static str {
        include_str!("../../configs/caloric-deficit.json")
    }

    fn compute(&self, input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope> {
        or_invalid(self.id(), envelope(input))
    }
}

fn envelope(input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope> {
    let params = DeficitInput::read(input)?;
    let result = calculate(&params)?;
    let unit = input.unit_of("weight").unwrap_or("kg");

    let note = if result.below_minimum {
        "belowMinimum"
    } else {
        "withinGuidelines"
    };

    let mut out = input.envelope();
    out.set("targetCalories", result.target_calories)
        .set("bmr", result.bmr)
        .set("tdee", result.tdee)
        .set("dailyDeficit", result.daily_deficit)
        .set_in("weeklyLoss", result.weekly_loss.to_unit(unit)?, unit)
        .set("safetyNote", input.t.phrase(note))
        .chart(projection_chart(params.weight, result.daily_deficit, unit)?)
        .table(deficit_comparison(&params, unit)?);
    Ok(out.build())
}
