//! # Retirement
//!
//! Yearly compounding of current savings plus end-of-year contributions until
//! retirement age. The employer match is a percentage of the employee's
//! contribution, capped at a yearly limit. Income at retirement applies the
//! withdrawal rate to the final balance.

use serde::{Deserialize, Serialize};

use crate::compute::{or_invalid, Calculator, ComputeInput, DataRow, ResultsEnvelope};
use crate::derive::{compound_growth, GrowthRow, MAX_GROWTH_YEARS};
use crate::errors::{CalcError, CalcResult};
use crate::row;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmployerMatch {
    pub percent: f64,
    pub yearly_limit: f64,
}

impl EmployerMatch {
    pub fn amount(&self, contribution: f64) -> f64 {
        (contribution * self.percent / 100.0).min(self.yearly_limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetirementInput {
    pub current_age: u32,
    pub retirement_age: u32,
    pub savings: f64,
    pub contribution: f64,
    pub employer_match: Option<EmployerMatch>,
    pub return_pct: f64,
    pub withdrawal_pct: f64,
}

impl RetirementInput {
    fn read(input: &ComputeInput<'_>) -> CalcResult<Self> {
        let employer_match = if input.flag("employerMatch") {
            Some(EmployerMatch {
                percent: input.optional("matchPercent")?.unwrap_or(0.0),
                yearly_limit: input.optional("matchLimit")?.unwrap_or(f64::INFINITY),
            })
        } else {
            None
        };
        Ok(RetirementInput {
            current_age: input.require("currentAge")?.floor() as u32,
            retirement_age: input.require("retirementAge")?.floor() as u32,
            savings: input.optional("currentSavings")?.unwrap_or(0.0),
            contribution: input.optional("annualContribution")?.unwrap_or(0.0),
            employer_match,
            return_pct: input.require("annualReturn")?,
            withdrawal_pct: input.optional("withdrawalRate")?.unwrap_or(4.0),
        })
    }

    pub fn years(&self) -> u32 {
        self.retirement_age.saturating_sub(self.current_age)
    }

    /// Employee plus employer money added each year
    pub fn yearly_deposit(&self) -> f64 {
        self.contribution + self.employer_match.map_or(0.0, |m| m.amount(self.contribution))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetirementResult {
    pub years: u32,
    pub balance: f64,
    /// Starting savings plus every deposit
    pub contributions: f64,
    pub employer_contributions: f64,
    pub growth: f64,
    pub monthly_income: f64,
    pub schedule: Vec<GrowthRow>,
}

pub fn calculate(input: &RetirementInput) -> CalcResult<RetirementResult> {
    if input.retirement_age <= input.current_age {
        return Err(CalcError::invalid_input(
            "retirementAge",
            input.retirement_age.to_string(),
            "Retirement age must be after current age",
        ));
    }
    let years = input.years().min(MAX_GROWTH_YEARS);
    let schedule = compound_growth(input.savings, input.yearly_deposit(), input.return_pct, years);
    let (balance, contributions) = schedule
        .last()
        .map_or((input.savings, input.savings), |row| (row.balance, row.contributions));
    let employer_yearly = input.yearly_deposit() - input.contribution;

    Ok(RetirementResult {
        years,
        balance,
        contributions,
        employer_contributions: employer_yearly * f64::from(years),
        growth: balance - contributions,
        monthly_income: balance * input.withdrawal_pct / 100.0 / 12.0,
        schedule,
    })
}

/// One chart point per age, starting with today's savings.
pub fn balance_chart(input: &RetirementInput, schedule: &[GrowthRow]) -> Vec<DataRow> {
    let start = row! {
        "age" => input.current_age,
        "contributions" => input.savings,
        "growth" => 0.0,
        "balance" => input.savings,
    };
    std::iter::once(start)
        .chain(schedule.iter().map(|year| {
            row! {
                "age" => input.current_age + year.year,
                "contributions" => year.contributions,
                "growth" => year.growth,
                "balance" => year.balance,
            }
        }))
        .collect()
}

pub struct Retirement;

impl Calculator for Retirement {
    fn id(&self) -> &'static str {
        "retirement"
    }

    fn config_source(&self) -> &'static str {
        include_str!("../../configs/retirement.json")
    }

    fn compute(&self, input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope> {
        or_invalid(self.id(), envelope(input))
    }
}

fn envelope(input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope> {
    let params = RetirementInput::read(input)?;
    let result = calculate(&params)?;

    let mut out = input.envelope().currency(input.currency_of("currentSavings"));
    out.set("projectedBalance", result.balance)
        .set("monthlyIncome", result.monthly_income)
        .set("totalContributions", result.contributions)
        .set("totalGrowth", result.growth)
        .set("yearsToRetirement", result.years)
        .chart(balance_chart(&params, &result.schedule));
    if params.employer_match.is_some() {
        out.set("employerContributions", result.employer_contributions);
    }
    Ok(out.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::future_value;
    use approx::assert_relative_eq;

    fn saver() -> RetirementInput {
        RetirementInput {
            current_age: 30,
            retirement_age: 65,
            savings: 25_000.0,
            contribution: 6_000.0,
            employer_match: None,
            return_pct: 7.0,
            withdrawal_pct: 4.0,
        }
    }

    #[test]
    fn test_projected_balance() {
        let result = calculate(&saver()).unwrap();
        assert_eq!(result.years, 35);
        assert_relative_eq!(result.balance, 1_096_335.81, epsilon = 0.01);
        assert_relative_eq!(result.contributions, 25_000.0 + 35.0 * 6_000.0, epsilon = 1e-6);
        assert_relative_eq!(result.monthly_income, result.balance * 0.04 / 12.0);
    }

    #[test]
    fn test_employer_match_capped() {
        let input = RetirementInput {
            employer_match: Some(EmployerMatch {
                percent: 100.0,
                yearly_limit: 3_000.0,
            }),
            ..saver()
        };
        let result = calculate(&input).unwrap();
        assert_relative_eq!(result.balance, 1_511_046.44, epsilon = 0.01);
        assert_relative_eq!(result.employer_contributions, 105_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_final_chart_point_matches_balance() {
        let input = saver();
        let result = calculate(&input).unwrap();
        let chart = balance_chart(&input, &result.schedule);
        assert_eq!(chart.len(), 36);
        let last = chart.last().unwrap();
        assert_eq!(last["age"].as_number(), Some(65.0));
        assert_eq!(last["balance"].as_number(), Some(result.balance));
        assert_relative_eq!(
            result.balance,
            future_value(input.savings, input.contribution, input.return_pct, 35),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_retirement_age_must_follow_current_age() {
        let input = RetirementInput {
            retirement_age: 30,
            ..saver()
        };
        assert!(matches!(calculate(&input), Err(CalcError::InvalidInput { .. })));
    }
}
