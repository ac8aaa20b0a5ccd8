//! End-to-end runs through the built-in registry: resolve, compute, format.

use approx::assert_relative_eq;
use calc_engine::{CalcError, CalculatorRegistry, InputRequest, ResultsEnvelope};

fn run(id: &str, request: &InputRequest) -> ResultsEnvelope {
    CalculatorRegistry::builtin().unwrap().run(id, request, "en").unwrap()
}

#[test]
fn test_auto_loan_defaults() {
    let results = run("auto-loan", &InputRequest::new());
    assert!(results.is_valid);
    assert_relative_eq!(results.value("loanAmount").unwrap(), 24_490.0, epsilon = 0.01);
    assert_eq!(results.text("loanAmount"), Some("$24,490.00"));
    assert_relative_eq!(results.value("monthlyPayment").unwrap(), 472.32, epsilon = 0.01);
}

#[test]
fn test_auto_loan_without_trade_in() {
    let results = run("auto-loan", &InputRequest::new().value("includeTradein", false));
    assert!(results.is_valid);
    assert_relative_eq!(results.value("loanAmount").unwrap(), 33_050.0, epsilon = 0.01);
}

#[test]
fn test_auto_loan_term_outside_options() {
    let results = run("auto-loan", &InputRequest::new().value("loanTerm", 1000.0));
    assert!(!results.is_valid);
    assert!(results.values.is_empty());

    let results = run("auto-loan", &InputRequest::new().value("loanTerm", 72.0));
    assert!(results.is_valid);
    let chart = results.metadata.chart_data.as_ref().unwrap();
    let interest: f64 = chart.iter().filter_map(|r| r["interest"].as_number()).sum();
    assert_relative_eq!(interest, results.value("totalInterest").unwrap(), epsilon = 1e-6);
}

#[test]
fn test_tip_good_service() {
    let request = InputRequest::new()
        .value("billAmount", 75.0)
        .value("serviceQuality", "good");
    let results = run("tip", &request);
    assert_eq!(results.text("tipAmount"), Some("$13.50"));
    assert_eq!(results.text("totalAmount"), Some("$88.50"));
}

#[test]
fn test_tip_pre_tax_split_with_manual_percent() {
    let request = InputRequest::new()
        .value("billAmount", 200.0)
        .value("tipCalculation", "preTax")
        .value("taxAmount", 16.0)
        .value("splitBill", true)
        .value("numberOfPeople", 4.0)
        .edit("tipPercent", 20.0);
    let results = run("tip", &request);
    assert_relative_eq!(results.value("tipBase").unwrap(), 184.0, epsilon = 1e-9);
    assert_eq!(results.text("tipAmount"), Some("$36.80"));
    assert_eq!(results.text("perPerson"), Some("$59.20"));
}

#[test]
fn test_link_wins_over_typed_value_without_edit() {
    let request = InputRequest::new()
        .value("serviceQuality", "excellent")
        .value("tipPercent", 12.0);
    let inputs = CalculatorRegistry::builtin().unwrap().resolve("tip", &request).unwrap();
    assert_eq!(inputs.get("tipPercent").and_then(|v| v.as_number()), Some(25.0));
}

#[test]
fn test_caloric_deficit_imperial_male() {
    let request = InputRequest::new()
        .value("weight", 200.0)
        .unit("weight", "lbs")
        .value("height", "5'10\"")
        .unit("height", "ft_in");
    let results = run("caloric-deficit", &request);
    assert!(results.is_valid);
    assert_relative_eq!(results.value("bmr").unwrap(), 1875.0, epsilon = 5.0);
    assert_relative_eq!(results.value("tdee").unwrap(), 2906.0, epsilon = 5.0);
    assert_relative_eq!(results.value("targetCalories").unwrap(), 2325.0, epsilon = 5.0);
}

#[test]
fn test_hidden_fields_are_dropped() {
    let registry = CalculatorRegistry::builtin().unwrap();

    let tip = registry
        .resolve("tip", &InputRequest::new().value("taxAmount", 10.0))
        .unwrap();
    assert!(!tip.contains("taxAmount"));
    assert!(!tip.contains("numberOfPeople"));

    let water = registry
        .resolve("water-intake", &InputRequest::new().value("pregnant", true))
        .unwrap();
    assert!(!water.contains("pregnant"));
    let results = registry
        .run("water-intake", &InputRequest::new().value("pregnant", true), "en")
        .unwrap();
    assert!(results.value("lifeStageExtra").is_none());
}

#[test]
fn test_retirement_chart_ends_at_projected_balance() {
    let results = run("retirement", &InputRequest::new());
    let chart = results.metadata.chart_data.as_ref().unwrap();
    let last = chart.last().unwrap();
    assert_relative_eq!(
        last["balance"].as_number().unwrap(),
        results.value("projectedBalance").unwrap(),
        epsilon = 1e-6
    );
}

#[test]
fn test_ovulation_needs_last_period() {
    let results = run("ovulation", &InputRequest::new());
    assert!(!results.is_valid);
    assert!(results.values.is_empty());

    let results = run("ovulation", &InputRequest::new().value("lastPeriod", "2026-03-01"));
    assert!(results.is_valid);
    assert_eq!(results.values["nextOvulation"].as_text(), Some("2026-03-15"));
    assert_eq!(results.values["dueDate"].as_text(), Some("2026-12-06"));
}

#[test]
fn test_malformed_date_is_rejected() {
    let err = CalculatorRegistry::builtin()
        .unwrap()
        .run("ovulation", &InputRequest::new().value("lastPeriod", "03/01/2026"), "en")
        .unwrap_err();
    assert!(matches!(err, CalcError::InvalidInput { .. }));
}

#[test]
fn test_unit_outside_allowed_list() {
    let err = CalculatorRegistry::builtin()
        .unwrap()
        .run("bmi", &InputRequest::new().unit("weight", "oz"), "en")
        .unwrap_err();
    assert!(matches!(err, CalcError::UnsupportedUnit { .. }));
}

#[test]
fn test_unknown_preset_and_calculator() {
    let registry = CalculatorRegistry::builtin().unwrap();
    assert!(matches!(
        registry.run("tip", &InputRequest::new().preset("brunch"), "en"),
        Err(CalcError::UnknownPreset { .. })
    ));
    assert!(matches!(
        registry.run("mortgage", &InputRequest::new(), "en"),
        Err(CalcError::UnknownCalculator { .. })
    ));
}

#[test]
fn test_preset_then_values() {
    let request = InputRequest::new().preset("dinner").value("billAmount", 100.0);
    let results = run("tip", &request);
    // dinner sets great service (20%) and a bill the explicit value replaces
    assert_relative_eq!(results.value("tipAmount").unwrap(), 20.0, epsilon = 1e-9);
}

#[test]
fn test_spanish_formatting() {
    let request = InputRequest::new()
        .value("billAmount", 75.0)
        .value("serviceQuality", "good");
    let results = CalculatorRegistry::builtin().unwrap().run("tip", &request, "es").unwrap();
    assert_eq!(results.text("tipAmount"), Some("$13,50"));
    assert!(!results.summary.is_empty());
}
