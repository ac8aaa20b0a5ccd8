//! # Roofing
//!
//! Roof surface from the building footprint: plan area times the pitch
//! multiplier `sqrt(1 + (rise/12)²)`, plus a waste allowance. Material is
//! counted in roofing squares (100 sq ft) of three shingle bundles each.

use serde::{Deserialize, Serialize};

use crate::compute::{or_invalid, Calculator, ComputeInput, ResultsEnvelope};
use crate::errors::{CalcError, CalcResult};
use crate::units::Centimeters;

pub const SQUARE_FT: f64 = 100.0;
pub const BUNDLES_PER_SQUARE: f64 = 3.0;

const SQ_FT_CM2: f64 = 30.48 * 30.48;

/// Multiplier from plan area to sloped area for `rise` inches per 12.
pub fn pitch_factor(rise: f64) -> f64 {
    (1.0 + (rise / 12.0).powi(2)).sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoofInput {
    pub length: Centimeters,
    pub width: Centimeters,
    /// Rise per 12 of run
    pub pitch: f64,
    pub waste_pct: f64,
    pub price_per_square: Option<f64>,
}

impl RoofInput {
    fn read(input: &ComputeInput<'_>) -> CalcResult<Self> {
        Ok(RoofInput {
            length: Centimeters(input.require_base("length")?),
            width: Centimeters(input.require_base("width")?),
            pitch: input.optional("pitch")?.unwrap_or(0.0),
            waste_pct: input.optional("wastePercent")?.unwrap_or(0.0),
            price_per_square: input.optional("pricePerSquare")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoofResult {
    /// Footprint, sq ft
    pub plan_area: f64,
    pub pitch_factor: f64,
    /// Sloped area with waste, sq ft
    pub roof_area: f64,
    pub squares: f64,
    pub bundles: f64,
    pub cost: Option<f64>,
}

pub fn calculate(input: &RoofInput) -> CalcResult<RoofResult> {
    if input.pitch < 0.0 {
        return Err(CalcError::invalid_input("pitch", input.pitch.to_string(), "Pitch cannot be negative"));
    }
    let plan_area = input.length.value() * input.width.value() / SQ_FT_CM2;
    let factor = pitch_factor(input.pitch);
    let roof_area = plan_area * factor * (1.0 + input.waste_pct / 100.0);
    let squares = roof_area / SQUARE_FT;
    Ok(RoofResult {
        plan_area,
        pitch_factor: factor,
        roof_area,
        squares,
        // 36.000000001 bundles is 36
        bundles: ((squares * BUNDLES_PER_SQUARE * 1e6).round() / 1e6).ceil(),
        cost: input.price_per_square.map(|price| squares * price),
    })
}

pub struct Roofing;

impl Calculator for Roofing {
    fn id(&self) -> &'static str {
        "roofing"
    }

    fn config_source(&self) -> &'static str {
        include_str!("../../configs/roofing.json")
    }

    fn compute(&self, input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope> {
        or_invalid(self.id(), envelope(input))
    }
}

fn envelope(input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope> {
    let result = calculate(&RoofInput::read(input)?)?;

    // areas follow the length unit
    let (area_unit, per_sq_ft) = match input.unit_of("length") {
        Some("m") => ("m2", SQ_FT_CM2 / 10_000.0),
        _ => ("sq_ft", 1.0),
    };
    let roof_area = result.roof_area * per_sq_ft;
    let plan_area = result.plan_area * per_sq_ft;

    let mut out = input.envelope().currency(input.currency_of("pricePerSquare"));
    out.set_formatted("roofArea", roof_area, input.fmt.unit(roof_area, area_unit, Some(0)))
        .set("squares", result.squares)
        .set("bundles", result.bundles)
        .set_formatted("planArea", plan_area, input.fmt.unit(plan_area, area_unit, Some(0)))
        .set("pitchFactor", result.pitch_factor);
    if let Some(cost) = result.cost {
        out.set("estimatedCost", cost);
    }
    Ok(out.build())
}
