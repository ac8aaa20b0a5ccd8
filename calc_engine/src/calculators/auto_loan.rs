//! # Auto Loan
//!
//! Amount financed, level monthly payment and total cost of a vehicle loan.
//!
//! ## Assumptions
//!
//! - Sales tax is charged on the price less the trade-in value (the rule in most
//!   US states); without a trade-in it is charged on the full price
//! - Sales tax is always financed; fees are financed when `feesFinanced` is on
//! - A trade-in worth less than its payoff adds the difference to the loan
//! - Interest compounds monthly at `APR / 12`
//!
//! ## Example
//!
//! ```rust
//! use calc_engine::calculators::auto_loan::{calculate, AutoLoanInput};
//!
//! let input = AutoLoanInput {
//!     vehicle_price: 35_000.0,
//!     down_payment: 5_000.0,
//!     trade_in: Some((8_000.0, 0.0)),
//!     sales_tax_pct: 7.0,
//!     fees: 600.0,
//!     fees_financed: true,
//!     apr_pct: 5.9,
//!     term_months: 60,
//! };
//! let result = calculate(&input).unwrap();
//! assert_eq!(result.loan_amount, 24_490.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::compute::{or_invalid, Calculator, ComputeInput, DataRow, ResultsEnvelope};
use crate::derive::{amortization_schedule, monthly_payment, total_interest, yearly_summary, MAX_LOAN_MONTHS};
use crate::errors::{CalcError, CalcResult};
use crate::row;

/// Terms shown in the comparison table, in months
pub const COMPARISON_TERMS: [u32; 5] = [36, 48, 60, 72, 84];

/// Loan parameters in the selected currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoLoanInput {
    pub vehicle_price: f64,
    pub down_payment: f64,
    /// `(trade-in value, amount still owed)` when trading in
    pub trade_in: Option<(f64, f64)>,
    pub sales_tax_pct: f64,
    pub fees: f64,
    pub fees_financed: bool,
    pub apr_pct: f64,
    pub term_months: u32,
}

impl AutoLoanInput {
    fn read(input: &ComputeInput<'_>) -> CalcResult<Self> {
        let trade_in = if input.flag("includeTradein") {
            Some((
                input.optional("tradeInValue")?.unwrap_or(0.0),
                input.optional("amountOwed")?.unwrap_or(0.0),
            ))
        } else {
            None
        };
        let term = input.require("loanTerm")?;
        if term < 1.0 || term.fract() != 0.0 {
            return Err(CalcError::invalid_input("loanTerm", term.to_string(), "Term must be whole months"));
        }
        Ok(AutoLoanInput {
            vehicle_price: input.require("vehiclePrice")?,
            down_payment: input.optional("downPayment")?.unwrap_or(0.0),
            trade_in,
            sales_tax_pct: input.optional("salesTaxRate")?.unwrap_or(0.0),
            fees: input.optional("fees")?.unwrap_or(0.0),
            fees_financed: input.flag("feesFinanced"),
            apr_pct: input.require("interestRate")?,
            term_months: term as u32,
        })
    }

    /// Price the sales tax is charged on.
    pub fn taxable_amount(&self) -> f64 {
        match self.trade_in {
            Some((value, _)) => (self.vehicle_price - value).max(0.0),
            None => self.vehicle_price,
        }
    }
}

/// Top-line loan figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoLoanResult {
    pub loan_amount: f64,
    pub sales_tax: f64,
    pub monthly_payment: f64,
    pub total_interest: f64,
    /// Price + sales tax + fees + interest
    pub total_cost: f64,
    /// Down payment plus any fees paid in cash
    pub upfront_payment: f64,
}

/// Compute the loan.
///
/// # Errors
///
/// `InvalidInput` when the down payment and trade-in cover the whole purchase,
/// leaving nothing to finance, or when the term is outside 1..=[`MAX_LOAN_MONTHS`].
pub fn calculate(input: &AutoLoanInput) -> CalcResult<AutoLoanResult> {
    if input.term_months == 0 || input.term_months > MAX_LOAN_MONTHS {
        return Err(CalcError::invalid_input(
            "loanTerm",
            input.term_months.to_string(),
            "Term out of range",
        ));
    }
    let sales_tax = input.taxable_amount() * input.sales_tax_pct / 100.0;
    let trade_equity = input.trade_in.map_or(0.0, |(value, owed)| value - owed);
    let financed_fees = if input.fees_financed { input.fees } else { 0.0 };

    let loan_amount = input.vehicle_price - input.down_payment - trade_equity + sales_tax + financed_fees;
    if loan_amount <= 0.0 {
        return Err(CalcError::invalid_input(
            "downPayment",
            input.down_payment.to_string(),
            "Nothing left to finance",
        ));
    }

    let interest = total_interest(loan_amount, input.apr_pct, input.term_months);
    Ok(AutoLoanResult {
        loan_amount,
        sales_tax,
        monthly_payment: monthly_payment(loan_amount, input.apr_pct, input.term_months),
        total_interest: interest,
        total_cost: input.vehicle_price + sales_tax + input.fees + interest,
        upfront_payment: input.down_payment + (input.fees - financed_fees),
    })
}

/// The same loan over each of [`COMPARISON_TERMS`].
pub fn term_comparison(input: &AutoLoanInput) -> CalcResult<Vec<DataRow>> {
    COMPARISON_TERMS
        .iter()
        .map(|&term| {
            let result = calculate(&AutoLoanInput {
                term_months: term,
                ..input.clone()
            })?;
            Ok(row! {
                "term" => term,
                "monthlyPayment" => result.monthly_payment,
                "totalInterest" => result.total_interest,
                "totalCost" => result.total_cost,
            })
        })
        .collect()
}

/// Principal and interest per loan year.
pub fn yearly_chart(loan_amount: f64, apr_pct: f64, term_months: u32) -> Vec<DataRow> {
    yearly_summary(&amortization_schedule(loan_amount, apr_pct, term_months))
        .into_iter()
        .map(|year| {
            row! {
                "year" => year.year,
                "principal" => year.principal,
                "interest" => year.interest,
                "balance" => year.balance,
            }
        })
        .collect()
}

pub struct AutoLoan;

impl Calculator for AutoLoan {
    fn id(&self) -> &'static str {
        "auto-loan"
    }

    fn config_source(&self) -> &'static str {
        include_str!("../../configs/auto-loan.json")
    }

    fn compute(&self, input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope> {
        or_invalid(self.id(), envelope(input))
    }
}

fn envelope(input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope> {
    let params = AutoLoanInput::read(input)?;
    let result = calculate(&params)?;

    let mut out = input.envelope().currency(input.currency_of("vehiclePrice"));
    out.set("monthlyPayment", result.monthly_payment)
        .set("loanAmount", result.loan_amount)
        .set("totalInterest", result.total_interest)
        .set("totalCost", result.total_cost)
        .set("salesTax", result.sales_tax)
        .set("upfrontPayment", result.upfront_payment)
        .var("interestRate", input.fmt.percent(params.apr_pct, None))
        .var("loanTerm", params.term_months.to_string())
        .chart(yearly_chart(result.loan_amount, params.apr_pct, params.term_months))
        .table(term_comparison(&params)?);
    Ok(out.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scenario() -> AutoLoanInput {
        AutoLoanInput {
            vehicle_price: 35_000.0,
            down_payment: 5_000.0,
            trade_in: Some((8_000.0, 0.0)),
            sales_tax_pct: 7.0,
            fees: 600.0,
            fees_financed: true,
            apr_pct: 5.9,
            term_months: 60,
        }
    }

    #[test]
    fn test_trade_in_reduces_tax_basis() {
        let result = calculate(&scenario()).unwrap();
        assert_relative_eq!(result.sales_tax, 1_890.0, epsilon = 1e-9);
        assert_relative_eq!(result.loan_amount, 24_490.0, epsilon = 1e-9);
        assert_relative_eq!(result.monthly_payment, 472.32, epsilon = 0.01);
        assert_relative_eq!(result.total_interest, 3_849.34, epsilon = 0.01);
        assert_relative_eq!(result.total_cost, 35_000.0 + 1_890.0 + 600.0 + result.total_interest);
    }

    #[test]
    fn test_without_trade_in_taxes_full_price() {
        let input = AutoLoanInput {
            trade_in: None,
            ..scenario()
        };
        let result = calculate(&input).unwrap();
        assert_relative_eq!(result.sales_tax, 2_450.0, epsilon = 1e-9);
        assert_relative_eq!(result.loan_amount, 33_050.0, epsilon = 1e-9);
    }

    #[test]
    fn test_negative_equity_rolls_into_loan() {
        let input = AutoLoanInput {
            trade_in: Some((8_000.0, 10_000.0)),
            ..scenario()
        };
        let result = calculate(&input).unwrap();
        assert_relative_eq!(result.loan_amount, 24_490.0 + 10_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fees_paid_in_cash() {
        let input = AutoLoanInput {
            fees_financed: false,
            ..scenario()
        };
        let result = calculate(&input).unwrap();
        assert_relative_eq!(result.loan_amount, 23_890.0, epsilon = 1e-9);
        assert_relative_eq!(result.upfront_payment, 5_600.0);
    }

    #[test]
    fn test_nothing_to_finance_is_invalid_input() {
        let input = AutoLoanInput {
            down_payment: 40_000.0,
            ..scenario()
        };
        let err = calculate(&input).unwrap_err();
        assert!(matches!(err, CalcError::InvalidInput { .. }));
    }

    #[test]
    fn test_term_beyond_schedule_limit_is_invalid_input() {
        let input = AutoLoanInput {
            term_months: MAX_LOAN_MONTHS + 1,
            ..scenario()
        };
        assert!(matches!(calculate(&input), Err(CalcError::InvalidInput { .. })));
    }

    #[test]
    fn test_comparison_and_chart_agree_with_top_line() {
        let input = scenario();
        let result = calculate(&input).unwrap();

        let table = term_comparison(&input).unwrap();
        assert_eq!(table.len(), COMPARISON_TERMS.len());
        let sixty = &table[2];
        assert_eq!(sixty["term"].as_number(), Some(60.0));
        assert_relative_eq!(sixty["monthlyPayment"].as_number().unwrap(), result.monthly_payment);

        let chart = yearly_chart(result.loan_amount, input.apr_pct, input.term_months);
        assert_eq!(chart.len(), 5);
        let interest: f64 = chart.iter().filter_map(|r| r["interest"].as_number()).sum();
        assert_relative_eq!(interest, result.total_interest, epsilon = 1e-6);
    }
}
