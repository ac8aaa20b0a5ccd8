//! # Transfer Time
//!
//! `seconds = bytes × 8 / (rate × (1 - overhead))`. Sizes use decimal SI
//! prefixes (1 GB = 10^9 bytes), matching how connection speeds are sold.

use serde::{Deserialize, Serialize};

use crate::compute::{or_invalid, Calculator, ComputeInput, DataRow, ResultsEnvelope};
use crate::errors::{CalcError, CalcResult};
use crate::row;
use crate::units::{BitsPerSecond, Bytes, Seconds};

/// Connections shown in the comparison table: `(value, rate unit)`
pub const REFERENCE_SPEEDS: [(f64, &str); 6] = [
    (56.0, "Kbps"),
    (10.0, "Mbps"),
    (100.0, "Mbps"),
    (500.0, "Mbps"),
    (1.0, "Gbps"),
    (10.0, "Gbps"),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransferInput {
    pub size: Bytes,
    pub rate: BitsPerSecond,
    pub overhead_pct: f64,
}

impl TransferInput {
    fn read(input: &ComputeInput<'_>) -> CalcResult<Self> {
        Ok(TransferInput {
            size: Bytes(input.require_base("fileSize")?),
            rate: BitsPerSecond(input.require_base("speed")?),
            overhead_pct: input.optional("overhead")?.unwrap_or(0.0),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransferResult {
    pub duration: Seconds,
    /// Rate left after overhead
    pub effective_rate: BitsPerSecond,
}

pub fn transfer_seconds(size: Bytes, rate: BitsPerSecond, overhead_pct: f64) -> Seconds {
    Seconds(size.bits() / (rate.value() * (1.0 - overhead_pct / 100.0)))
}

pub fn calculate(input: &TransferInput) -> CalcResult<TransferResult> {
    if input.rate.value() <= 0.0 {
        return Err(CalcError::invalid_input("speed", input.rate.value().to_string(), "Speed must be positive"));
    }
    if !(0.0..100.0).contains(&input.overhead_pct) {
        return Err(CalcError::invalid_input(
            "overhead",
            input.overhead_pct.to_string(),
            "Overhead must be below 100%",
        ));
    }
    Ok(TransferResult {
        duration: transfer_seconds(input.size, input.rate, input.overhead_pct),
        effective_rate: input.rate * (1.0 - input.overhead_pct / 100.0),
    })
}

/// The same file over each of [`REFERENCE_SPEEDS`].
pub fn speed_comparison(input: &ComputeInput<'_>, params: &TransferInput) -> CalcResult<Vec<DataRow>> {
    REFERENCE_SPEEDS
        .iter()
        .map(|&(value, unit)| {
            let rate = BitsPerSecond::from_unit(value, unit)?;
            Ok(row! {
                "connection" => input.fmt.unit(value, unit, None),
                "seconds" => transfer_seconds(params.size, rate, params.overhead_pct).value(),
            })
        })
        .collect()
}

pub struct TransferTime;

impl Calculator for TransferTime {
    fn id(&self) -> &'static str {
        "transfer-time"
    }

    fn config_source(&self) -> &'static str {
        include_str!("../../configs/transfer-time.json")
    }

    fn compute(&self, input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope> {
        or_invalid(self.id(), envelope(input))
    }
}

fn envelope(input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope> {
    let params = TransferInput::read(input)?;
    let result = calculate(&params)?;
    let rate_unit = input.unit_of("speed").unwrap_or("Mbps");
    let size_unit = input.unit_of("fileSize").unwrap_or("GB");

    let effective = result.effective_rate.to_unit(rate_unit)?;
    let size = params.size.to_unit(size_unit)?;

    let mut out = input.envelope();
    out.set("transferTime", result.duration.value())
        .set_formatted("effectiveSpeed", effective, input.fmt.unit(effective, rate_unit, Some(2)))
        .set("totalSeconds", result.duration.value())
        .var("fileSizeText", input.fmt.unit(size, size_unit, None))
        .table(speed_comparison(input, &params)?);
    Ok(out.build())
}
