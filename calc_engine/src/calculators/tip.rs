//! # Tip
//!
//! Tip, total and per-person share of a restaurant bill.
//!
//! Rounding up works on each person's share: the share is raised to the next
//! whole currency unit, and the tip absorbs the difference. The effective rate
//! is then derived back from the rounded tip.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::compute::{or_invalid, Calculator, ComputeInput, ResultsEnvelope};
use crate::errors::{CalcError, CalcResult};

/// What the tip percentage applies to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TipBasis {
    /// The whole bill, tax included
    PostTax,
    /// The bill less the tax it contains
    PreTax { tax: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipInput {
    pub bill: f64,
    pub basis: TipBasis,
    pub tip_pct: f64,
    /// 1 when the bill is not split
    pub people: u32,
    pub round_up: bool,
}

impl TipInput {
    fn read(input: &ComputeInput<'_>) -> CalcResult<Self> {
        let basis = match input.text("tipCalculation").as_deref() {
            Some("preTax") => TipBasis::PreTax {
                tax: input.optional("taxAmount")?.unwrap_or(0.0),
            },
            _ => TipBasis::PostTax,
        };
        let people = if input.flag("splitBill") {
            input.require("numberOfPeople")?.floor().max(1.0) as u32
        } else {
            1
        };
        Ok(TipInput {
            bill: input.require("billAmount")?,
            basis,
            tip_pct: input.require("tipPercent")?,
            people,
            round_up: input.flag("roundUp"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipResult {
    /// Amount the percentage was applied to
    pub tip_base: f64,
    pub tip: f64,
    pub total: f64,
    pub per_person: f64,
    /// Tip as a percentage of `tip_base`, after rounding
    pub effective_rate: f64,
}

/// Compute the tip.
///
/// # Errors
///
/// `InvalidInput` for an empty bill or a tax larger than the bill.
pub fn calculate(input: &TipInput) -> CalcResult<TipResult> {
    if input.bill <= 0.0 {
        return Err(CalcError::invalid_input("billAmount", input.bill.to_string(), "Bill must be positive"));
    }
    let tip_base = match input.basis {
        TipBasis::PostTax => input.bill,
        TipBasis::PreTax { tax } if tax < input.bill => input.bill - tax,
        TipBasis::PreTax { tax } => {
            return Err(CalcError::invalid_input("taxAmount", tax.to_string(), "Tax exceeds the bill"));
        }
    };

    let people = f64::from(input.people.max(1));
    let mut tip = tip_base * input.tip_pct / 100.0;
    let mut per_person = (input.bill + tip) / people;

    if input.round_up {
        // cents first: 60.000000001 must stay 60
        per_person = round_cents(per_person).ceil();
        tip = per_person * people - input.bill;
    }

    Ok(TipResult {
        tip_base,
        tip,
        total: input.bill + tip,
        per_person,
        effective_rate: tip / tip_base * 100.0,
    })
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct Tip;

impl Calculator for Tip {
    fn id(&self) -> &'static str {
        "tip"
    }

    fn config_source(&self) -> &'static str {
        include_str!("../../configs/tip.json")
    }

    fn compute(&self, input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope> {
        or_invalid(self.id(), envelope(input))
    }
}

fn envelope(input: &ComputeInput<'_>) -> CalcResult<ResultsEnvelope> {
    let params = TipInput::read(input)?;
    let result = calculate(&params)?;

    let mut out = input.envelope().currency(input.currency_of("billAmount"));
    out.set("tipAmount", result.tip)
        .set("totalAmount", result.total)
        .set("effectiveRate", result.effective_rate);
    if matches!(params.basis, TipBasis::PreTax { .. }) {
        out.set("tipBase", result.tip_base);
    }

    if params.people > 1 {
        out.set("perPerson", result.per_person);
        let per_person = input.fmt.currency(result.per_person, input.currency_of("billAmount"));
        let vars: BTreeMap<String, String> = [
            ("perPerson".to_string(), per_person),
            ("people".to_string(), params.people.to_string()),
        ]
        .into_iter()
        .collect();
        out.var("splitNote", input.t.render("splitNote", &vars));
    } else {
        out.var("splitNote", "");
    }
    Ok(out.build())
}
