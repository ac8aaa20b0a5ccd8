//! # Derivation Helpers
//!
//! Shared arithmetic used by both top-line results and the chart/table data of
//! a calculator. Charts must agree with headline numbers, so both come from the
//! same function here: the last amortization row's cumulative interest is the
//! loan's total interest, and the last growth row's balance is the projected
//! balance.
//!
//! All loops are bounded: [`MAX_LOAN_MONTHS`], [`MAX_GROWTH_YEARS`],
//! [`MAX_CYCLES`].

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Longest amortization schedule generated (50 years)
pub const MAX_LOAN_MONTHS: u32 = 600;

/// Longest savings projection generated
pub const MAX_GROWTH_YEARS: u32 = 100;

/// Most fertility cycles projected
pub const MAX_CYCLES: usize = 12;

/// Energy in one kilogram of body fat
pub const KCAL_PER_KG: f64 = 7700.0;

// ============================================================================
// Loans
// ============================================================================

/// Level monthly payment for a fully amortizing loan.
///
/// `annual_rate_pct` is a percentage (`5.9` for 5.9%). A zero rate divides the
/// principal evenly. Returns 0 for a zero term.
pub fn monthly_payment(principal: f64, annual_rate_pct: f64, months: u32) -> f64 {
    if months == 0 {
        return 0.0;
    }
    let n = f64::from(months);
    let r = annual_rate_pct / 100.0 / 12.0;
    if r == 0.0 {
        return principal / n;
    }
    principal * r / (1.0 - (1.0 + r).powf(-n))
}

/// Interest paid over the life of the loan.
pub fn total_interest(principal: f64, annual_rate_pct: f64, months: u32) -> f64 {
    monthly_payment(principal, annual_rate_pct, months) * f64::from(months) - principal
}

/// One month of an amortization schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationRow {
    pub month: u32,
    pub payment: f64,
    pub principal: f64,
    pub interest: f64,
    pub balance: f64,
    pub cumulative_interest: f64,
}

/// Month-by-month schedule, capped at [`MAX_LOAN_MONTHS`].
pub fn amortization_schedule(principal: f64, annual_rate_pct: f64, months: u32) -> Vec<AmortizationRow> {
    let months = months.min(MAX_LOAN_MONTHS);
    let payment = monthly_payment(principal, annual_rate_pct, months);
    let r = annual_rate_pct / 100.0 / 12.0;

    let mut balance = principal;
    let mut cumulative_interest = 0.0;
    let mut rows = Vec::with_capacity(months as usize);
    for month in 1..=months {
        let interest = balance * r;
        let principal_part = payment - interest;
        balance -= principal_part;
        cumulative_interest += interest;
        rows.push(AmortizationRow {
            month,
            payment,
            principal: principal_part,
            interest,
            // float residue on the last row
            balance: if balance.abs() < 1e-6 { 0.0 } else { balance },
            cumulative_interest,
        });
    }
    rows
}

/// A year of amortization, for charts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSummary {
    pub year: u32,
    pub principal: f64,
    pub interest: f64,
    pub balance: f64,
}

/// Fold monthly rows into calendar years of the loan (months 1-12 are year 1).
pub fn yearly_summary(rows: &[AmortizationRow]) -> Vec<YearSummary> {
    rows.chunks(12)
        .enumerate()
        .map(|(i, chunk)| YearSummary {
            year: i as u32 + 1,
            principal: chunk.iter().map(|r| r.principal).sum(),
            interest: chunk.iter().map(|r| r.interest).sum(),
            balance: chunk.last().map_or(0.0, |r| r.balance),
        })
        .collect()
}

// ============================================================================
// Savings growth
// ============================================================================

/// One year of a savings projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthRow {
    pub year: u32,
    pub contributions: f64,
    pub growth: f64,
    pub balance: f64,
}

/// Yearly compounding with end-of-year contributions.
///
/// Row `y` is the balance after `y` years; the last row is the projected
/// balance. Capped at [`MAX_GROWTH_YEARS`].
pub fn compound_growth(
    starting_balance: f64,
    annual_contribution: f64,
    annual_rate_pct: f64,
    years: u32,
) -> Vec<GrowthRow> {
    let rate = annual_rate_pct / 100.0;
    let mut balance = starting_balance;
    let mut contributions = starting_balance;
    let mut rows = Vec::with_capacity(years.min(MAX_GROWTH_YEARS) as usize);
    for year in 1..=years.min(MAX_GROWTH_YEARS) {
        balance = balance * (1.0 + rate) + annual_contribution;
        contributions += annual_contribution;
        rows.push(GrowthRow {
            year,
            contributions,
            growth: balance - contributions,
            balance,
        });
    }
    rows
}

/// Closed form of [`compound_growth`]'s final balance.
pub fn future_value(starting_balance: f64, annual_contribution: f64, annual_rate_pct: f64, years: u32) -> f64 {
    let n = f64::from(years.min(MAX_GROWTH_YEARS));
    let r = annual_rate_pct / 100.0;
    if r == 0.0 {
        return starting_balance + annual_contribution * n;
    }
    let factor = (1.0 + r).powf(n);
    starting_balance * factor + annual_contribution * (factor - 1.0) / r
}

// ============================================================================
// Body weight
// ============================================================================

/// Expected weight (kg) at the end of each week of a steady daily deficit.
///
/// Row 0 is the starting weight.
pub fn weight_projection(start_kg: f64, daily_deficit_kcal: f64, weeks: u32) -> Vec<(u32, f64)> {
    let weekly_loss = daily_deficit_kcal * 7.0 / KCAL_PER_KG;
    (0..=weeks)
        .map(|week| (week, (start_kg - weekly_loss * f64::from(week)).max(0.0)))
        .collect()
}

// ============================================================================
// Fertility calendar
// ============================================================================

/// Key dates of one menstrual cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleDates {
    pub cycle: u32,
    pub period_start: NaiveDate,
    pub fertile_start: NaiveDate,
    pub ovulation: NaiveDate,
    pub fertile_end: NaiveDate,
    pub next_period: NaiveDate,
}

fn add_days(date: NaiveDate, days: u32) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(u64::from(days)))
}

fn sub_days(date: NaiveDate, days: u32) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(days)))
}

/// Project `count` cycles from the first day of the last period.
///
/// Ovulation falls `luteal_days` before the next period; the fertile window runs
/// from five days before ovulation to the day after. Returns fewer rows if a
/// date overflows the calendar. Capped at [`MAX_CYCLES`].
pub fn fertility_cycles(last_period: NaiveDate, cycle_days: u32, luteal_days: u32, count: usize) -> Vec<CycleDates> {
    let mut cycles = Vec::new();
    let mut period_start = last_period;
    for cycle in 1..=count.min(MAX_CYCLES) as u32 {
        let Some(dates) = cycle_from(cycle, period_start, cycle_days, luteal_days) else {
            break;
        };
        period_start = dates.next_period;
        cycles.push(dates);
    }
    cycles
}

fn cycle_from(cycle: u32, period_start: NaiveDate, cycle_days: u32, luteal_days: u32) -> Option<CycleDates> {
    let next_period = add_days(period_start, cycle_days)?;
    let ovulation = sub_days(next_period, luteal_days)?;
    Some(CycleDates {
        cycle,
        period_start,
        fertile_start: sub_days(ovulation, 5)?,
        ovulation,
        fertile_end: add_days(ovulation, 1)?,
        next_period,
    })
}

/// Naegele's rule adjusted for cycle length: 280 days from the last period,
/// shifted by the difference from a 28-day cycle.
pub fn due_date(last_period: NaiveDate, cycle_days: u32) -> Option<NaiveDate> {
    let shift = i64::from(cycle_days) - 28;
    let base = add_days(last_period, 280)?;
    if shift >= 0 {
        base.checked_add_days(Days::new(shift.unsigned_abs()))
    } else {
        base.checked_sub_days(Days::new(shift.unsigned_abs()))
    }
}
