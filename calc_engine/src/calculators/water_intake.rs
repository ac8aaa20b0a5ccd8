//! # Water Intake
//!
//! Daily water need: 35 ml per kg of body weight, plus allowances for
//! exercise, climate, pregnancy and breastfeeding. All arithmetic is in
//! milliliters; results are shown in the unit picked by `volumeUnit`.

use serde::{Deserialize, Serialize};

use super::Sex;
use crate::compute::{or_invalid, Calculator, ComputeInput, ResultsEnvelope};
use crate::errors::{CalcError, CalcResult};
use crate::units::{Kilograms, Milliliters};

pub const ML_PER_KG: f64 = 35.0;
/// About 350 ml for every 30 minutes of exercise
pub const ML_PER_EXERCISE_MINUTE: f64 = 12.0;
pub const PREGNANCY_ML: f64 = 300.0;
pub const BREASTFEEDING_ML: f64 = 700.0;
pub const GLASS_ML: f64 = 250.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Climate {
    Cold,
    Temperate,
    Hot,
    Humid,
}

impl Climate {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "cold" => Some(Climate::Cold),
            "temperate" => Some(Climate::Temperate),
            "hot" => Some(Climate::Hot),
            "humid" => Some(Climate::Humid),
            _ => None,
        }
    }

    /// Extra daily intake, ml
    pub fn allowance(&self) -> f64 {
        match self {
            Climate::Cold | Climate::Temperate => 0.0,
            Climate::Hot => 500.0,
            Climate::Humid => 750.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterInput {
    pub weight: Kilograms,
    pub exercise_minutes: f64,
    pub climate: Climate,
    pub sex: Sex,
    pub pregnant: bool,
    pub breastfeeding: bool,
}

impl WaterInput {
    fn read(input: &ComputeInput<'_>) -> CalcResult<Self> {
        let key = input.text("climate").unwrap_or_else(|| "temperate".to_string());
        let climate =
            Climate::from_key(&key).ok_or_else(|| CalcError::invalid_input("climate", key.clone(), "Unknown climate"))?;
        Ok(WaterInput {
            weight: Kilograms(input.require_base("weight")?),
            exercise_minutes: input.optional("exerciseMinutes")?.unwrap_or(0.0),
            climate,
            sex: Sex::read(input, "gender")?,
            // hidden for male, so these read false
            pregnant: input.flag("pregnant"),
            breastfeeding: input.flag("breastfeeding"),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterResult {
    pub base: Milliliters,
    pub exercise: Milliliters,
    pub climate: Milliliters,
    pub life_stage: Milliliters,
    pub total: Milliliters,
    pub glasses: f64,
}

pub fn calculate(input: &WaterInput) -> CalcResult<WaterResult> {
    if input.weight.value() <= 0.0 {
        return Err(CalcError::invalid_input("weight", input.weight.value().to_string(), "Weight must be positive"));
    }
    let base = Milliliters(input.weight.value() * ML_PER_KG);
    let exercise = Milliliters(input.exercise_minutes.max(0.0) * ML_PER_EXERCISE_MINUTE);
    let climate = Milliliters(input.climate.allowance());
    let life_stage = match input.sex {
        Sex::Female => Milliliters(
            if input.pregnant { PREGNANCY_ML } else { 0.0 } + if input.breastfeeding { BREASTFEEDING_ML } else { 0.0 },
        ),
        Sex::Male => Milliliters(0.0),
    };
    let total = base + exercise + climate + life_stage;
    Ok(WaterResult {
        base,
        exercise,
        climate,
        life_stage,
        total,
        glasses: (total.value() / GLASS_ML).ceil(),
    })
}

pub struct WaterIntake;

impl Calculator for WaterIntake {
    fn id(&self) -> &'static str {
        "water-intake"
    }

    fn config_source(&self) -> &'static str {
        include_str!("../../configs/water-intake.json")
    }

    fn compute(&self, input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope> {
        or_invalid(self.id(), envelope(input))
    }
}

fn envelope(input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope> {
    let result = calculate(&WaterInput::read(input)?)?;
    let unit = input.text("volumeUnit").unwrap_or_else(|| "l".to_string());

    let mut out = input.envelope();
    out.set_in("dailyIntake", result.total.to_unit(&unit)?, &unit)
        .set("glasses", result.glasses)
        .set_in("baseIntake", result.base.to_unit(&unit)?, &unit)
        .set_in("exerciseExtra", result.exercise.to_unit(&unit)?, &unit)
        .set_in("climateExtra", result.climate.to_unit(&unit)?, &unit);
    if result.life_stage.value() > 0.0 {
        out.set_in("lifeStageExtra", result.life_stage.to_unit(&unit)?, &unit);
    }
    Ok(out.build())
}
