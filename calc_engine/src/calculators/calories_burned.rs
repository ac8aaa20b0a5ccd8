//! # Calories Burned
//!
//! `kcal = MET × weight (kg) × hours`. MET values follow the Compendium of
//! Physical Activities.

use serde::{Deserialize, Serialize};

use crate::compute::{or_invalid, Calculator, ComputeInput, DataRow, ResultsEnvelope};
use crate::errors::{CalcError, CalcResult};
use crate::row;
use crate::units::{Kilograms, Seconds};

/// `(activity option, MET)`
pub const ACTIVITIES: [(&str, f64); 9] = [
    ("walking", 3.5),
    ("briskWalking", 5.0),
    ("running", 9.8),
    ("cycling", 8.0),
    ("swimming", 7.0),
    ("yoga", 2.5),
    ("weightLifting", 5.0),
    ("hiit", 8.0),
    ("dancing", 5.5),
];

pub fn met_for(activity: &str) -> Option<f64> {
    ACTIVITIES.iter().find(|(key, _)| *key == activity).map(|(_, met)| *met)
}

pub fn calories(met: f64, weight: Kilograms, duration: Seconds) -> f64 {
    met * weight.value() * duration.hours()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnInput {
    pub activity: String,
    pub weight: Kilograms,
    pub duration: Seconds,
}

impl BurnInput {
    fn read(input: &ComputeInput<'_>) -> CalcResult<Self> {
        Ok(BurnInput {
            activity: input.require_choice("activity")?,
            weight: Kilograms(input.require_base("weight")?),
            duration: Seconds(input.require_base("duration")?),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurnResult {
    pub met: f64,
    pub calories: f64,
    pub per_minute: f64,
}

pub fn calculate(input: &BurnInput) -> CalcResult<BurnResult> {
    let met = met_for(&input.activity)
        .ok_or_else(|| CalcError::invalid_input("activity", input.activity.clone(), "Unknown activity"))?;
    if input.duration.value() <= 0.0 {
        return Err(CalcError::invalid_input(
            "duration",
            input.duration.value().to_string(),
            "Duration must be positive",
        ));
    }
    let kcal = calories(met, input.weight, input.duration);
    Ok(BurnResult {
        met,
        calories: kcal,
        per_minute: kcal / input.duration.minutes(),
    })
}

/// Every activity at the same weight and duration.
pub fn activity_comparison(input: &ComputeInput<'_>, params: &BurnInput) -> Vec<DataRow> {
    ACTIVITIES
        .iter()
        .map(|(key, met)| {
            row! {
                "activity" => input.t.option_label("activity", key),
                "met" => *met,
                "calories" => calories(*met, params.weight, params.duration),
            }
        })
        .collect()
}

pub struct CaloriesBurned;

impl Calculator for CaloriesBurned {
    fn id(&self) -> &'static str {
        "calories-burned"
    }

    fn config_source(&self) -> &'static str {
        include_str!("../../configs/calories-burned.json")
    }

    fn compute(&self, input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope> {
        or_invalid(self.id(), envelope(input))
    }
}

fn envelope(input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope> {
    let params = BurnInput::read(input)?;
    let result = calculate(&params)?;

    let mut out = input.envelope();
    out.set("caloriesBurned", result.calories)
        .set("caloriesPerMinute", result.per_minute)
        .set("met", result.met)
        .var("activityName", input.t.option_label("activity", &params.activity))
        .var("durationText", input.fmt.duration(params.duration.value()))
        .table(activity_comparison(input, &params));
    Ok(out.build())
}
