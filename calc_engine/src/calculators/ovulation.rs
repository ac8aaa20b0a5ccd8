//! # Ovulation
//!
//! Calendar method: ovulation falls one luteal phase before the next period,
//! and the fertile window spans the five days before ovulation through the
//! day after. Dates are projected from the last period, never from today, so
//! the result depends only on the inputs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::compute::{or_invalid, Calculator, ComputeInput, DataRow, ResultsEnvelope};
use crate::derive::{due_date, fertility_cycles, CycleDates};
use crate::errors::{CalcError, CalcResult};
use crate::row;

/// Cycles listed in the table
pub const PROJECTED_CYCLES: usize = 6;

pub const DEFAULT_LUTEAL_DAYS: u32 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvulationInput {
    pub last_period: NaiveDate,
    pub cycle_days: u32,
    pub luteal_days: u32,
}

impl OvulationInput {
    fn read(input: &ComputeInput<'_>) -> CalcResult<Self> {
        Ok(OvulationInput {
            last_period: input.require_date("lastPeriod")?,
            cycle_days: input.require("cycleLength")?.round() as u32,
            luteal_days: input
                .optional("lutealPhase")?
                .map_or(DEFAULT_LUTEAL_DAYS, |d| d.round() as u32),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvulationResult {
    /// The cycle starting at the last period
    pub current: CycleDates,
    pub due_date: NaiveDate,
    pub cycles: Vec<CycleDates>,
}

pub fn calculate(input: &OvulationInput) -> CalcResult<OvulationResult> {
    if input.luteal_days + 5 >= input.cycle_days {
        return Err(CalcError::invalid_input(
            "lutealPhase",
            input.luteal_days.to_string(),
            "Luteal phase too long for the cycle",
        ));
    }
    let out_of_range = || CalcError::invalid_input("lastPeriod", input.last_period.to_string(), "Date out of range");

    let cycles = fertility_cycles(input.last_period, input.cycle_days, input.luteal_days, PROJECTED_CYCLES);
    let current = cycles.first().copied().ok_or_else(out_of_range)?;
    Ok(OvulationResult {
        current,
        due_date: due_date(input.last_period, input.cycle_days).ok_or_else(out_of_range)?,
        cycles,
    })
}

pub fn cycle_table(cycles: &[CycleDates]) -> Vec<DataRow> {
    cycles
        .iter()
        .map(|c| {
            row! {
                "cycle" => c.cycle,
                "periodStart" => c.period_start,
                "fertileStart" => c.fertile_start,
                "ovulation" => c.ovulation,
                "fertileEnd" => c.fertile_end,
            }
        })
        .collect()
}

pub struct Ovulation;

impl Calculator for Ovulation {
    fn id(&self) -> &'static str {
        "ovulation"
    }

    fn config_source(&self) -> &'static str {
        include_str!("../../configs/ovulation.json")
    }

    fn compute(&self, input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope> {
        or_invalid(self.id(), envelope(input))
    }
}

fn envelope(input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope> {
    let result = calculate(&OvulationInput::read(input)?)?;

    let mut out = input.envelope();
    out.set("nextOvulation", result.current.ovulation)
        .set("fertileStart", result.current.fertile_start)
        .set("fertileEnd", result.current.fertile_end)
        .set("nextPeriod", result.current.next_period)
        .set("dueDate", result.due_date)
        .table(cycle_table(&result.cycles));
    Ok(out.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn regular() -> OvulationInput {
        OvulationInput {
            last_period: date(2026, 3, 1),
            cycle_days: 28,
            luteal_days: 14,
        }
    }

    #[test]
    fn test_regular_cycle() {
        let result = calculate(&regular()).unwrap();
        assert_eq!(result.current.ovulation, date(2026, 3, 15));
        assert_eq!(result.current.fertile_start, date(2026, 3, 10));
        assert_eq!(result.current.fertile_end, date(2026, 3, 16));
        assert_eq!(result.current.next_period, date(2026, 3, 29));
        assert_eq!(result.due_date, date(2026, 12, 6));
    }

    #[test]
    fn test_long_cycle_shifts_ovulation_and_due_date() {
        let input = OvulationInput {
            cycle_days: 32,
            ..regular()
        };
        let result = calculate(&input).unwrap();
        assert_eq!(result.current.ovulation, date(2026, 3, 19));
        assert_eq!(result.due_date, date(2026, 12, 10));
    }

    #[test]
    fn test_six_cycles_chain() {
        let result = calculate(&regular()).unwrap();
        assert_eq!(result.cycles.len(), PROJECTED_CYCLES);
        for pair in result.cycles.windows(2) {
            assert_eq!(pair[0].next_period, pair[1].period_start);
        }
        let table = cycle_table(&result.cycles);
        assert_eq!(table[1]["periodStart"].as_text(), Some("2026-03-29"));
    }

    #[test]
    fn test_luteal_longer_than_cycle_is_invalid() {
        let input = OvulationInput {
            cycle_days: 20,
            luteal_days: 17,
            ..regular()
        };
        assert!(matches!(calculate(&input), Err(CalcError::InvalidInput { .. })));
    }
}
