//! Authoring-time checks for calculator configurations.
//!
//! A configuration that fails here is a bug in the calculator, not bad user
//! input. The built-in registry refuses to load and the test suite fails, so a
//! broken configuration never reaches a live request.

use std::collections::BTreeSet;

use super::graph::DependencyGraph;
use super::schema::{CalculatorConfig, InputDefinition, InputType};
use crate::errors::{CalcError, CalcResult};

/// Validate `config`, reporting every problem at once.
///
/// # Errors
///
/// `CalcError::InvalidConfig` listing each issue.
pub fn validate_config(config: &CalculatorConfig) -> CalcResult<()> {
    let issues = collect_issues(config);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(CalcError::invalid_config(&config.id, issues))
    }
}

/// All problems with `config`, in a stable order. Empty when valid.
pub fn collect_issues(config: &CalculatorConfig) -> Vec<String> {
    let mut issues = Vec::new();

    if config.id.trim().is_empty() {
        issues.push("calculator id is empty".to_string());
    }

    check_unique_ids(config, &mut issues);
    for input in &config.inputs {
        check_input(input, &mut issues);
    }
    check_links(config, &mut issues);
    if let Err(graph_issues) = DependencyGraph::build(config) {
        issues.extend(graph_issues);
    }
    check_presets(config, &mut issues);
    check_translations(config, &mut issues);
    check_auxiliary(config, &mut issues);

    issues
}

fn check_unique_ids(config: &CalculatorConfig, issues: &mut Vec<String>) {
    let mut seen = BTreeSet::new();
    for input in &config.inputs {
        if !seen.insert(input.id.as_str()) {
            issues.push(format!("duplicate input id '{}'", input.id));
        }
    }
    let mut seen = BTreeSet::new();
    for result in &config.results {
        if !seen.insert(result.id.as_str()) {
            issues.push(format!("duplicate result id '{}'", result.id));
        }
    }
}

fn check_input(input: &InputDefinition, issues: &mut Vec<String>) {
    let id = &input.id;

    if let (Some(min), Some(max)) = (input.min, input.max) {
        if min > max {
            issues.push(format!("input '{id}': min {min} is greater than max {max}"));
        }
    }
    if let Some(step) = input.step {
        if step <= 0.0 {
            issues.push(format!("input '{id}': step must be positive, got {step}"));
        }
    }

    if input.input_type.is_numeric() {
        if let Some(default) = &input.default_value {
            match default.as_number() {
                Some(n) => {
                    if input.min.is_some_and(|min| n < min) || input.max.is_some_and(|max| n > max) {
                        issues.push(format!(
                            "input '{id}': default {n} outside [{}, {}]",
                            fmt_bound(input.min),
                            fmt_bound(input.max)
                        ));
                    }
                }
                None if default.is_blank() => {}
                None => issues.push(format!("input '{id}': default '{default}' is not a number")),
            }
        }
    }

    if input.input_type.is_enumerated() {
        if input.options.is_empty() {
            issues.push(format!("input '{id}': {:?} input declares no options", input.input_type));
        }
        let mut seen = BTreeSet::new();
        for key in input.option_keys() {
            if !seen.insert(key.clone()) {
                issues.push(format!("input '{id}': duplicate option '{key}'"));
            }
        }
        if let Some(default) = &input.default_value {
            if !input.has_option(default) {
                issues.push(format!("input '{id}': default '{default}' is not one of its options"));
            }
        }
    }

    if input.input_type == InputType::Toggle {
        if let Some(default) = &input.default_value {
            if default.as_bool().is_none() {
                issues.push(format!("input '{id}': toggle default '{default}' is not a boolean"));
            }
        }
    }

    if input.input_type == InputType::Date {
        if let Some(default) = &input.default_value {
            if !default.is_blank() && chrono::NaiveDate::parse_from_str(&default.key(), "%Y-%m-%d").is_err() {
                issues.push(format!("input '{id}': date default '{default}' is not YYYY-MM-DD"));
            }
        }
    }

    check_units(input, issues);
}

fn fmt_bound(bound: Option<f64>) -> String {
    bound.map_or_else(|| "-".to_string(), |b| b.to_string())
}

fn check_units(input: &InputDefinition, issues: &mut Vec<String>) {
    let id = &input.id;
    let Some(unit_type) = input.unit_type else {
        if input.default_unit.is_some() || !input.allowed_units.is_empty() {
            issues.push(format!("input '{id}': units declared without a unitType"));
        }
        return;
    };

    let Some(default_unit) = &input.default_unit else {
        issues.push(format!("input '{id}': unitType '{unit_type}' needs a defaultUnit"));
        return;
    };

    if !input.allowed_units.is_empty() && !input.allowed_units.contains(default_unit) {
        issues.push(format!(
            "input '{id}': defaultUnit '{default_unit}' is not in allowedUnits"
        ));
    }
    for unit in input.allowed_units.iter().chain(std::iter::once(default_unit)) {
        if !unit_type.supports(unit) {
            issues.push(format!(
                "input '{id}': unit '{unit}' is not supported for unitType '{unit_type}'"
            ));
        }
    }
}

fn check_links(config: &CalculatorConfig, issues: &mut Vec<String>) {
    for input in config.inputs.iter().filter(|i| !i.linked_values.is_empty()) {
        let id = &input.id;
        if !input.input_type.is_enumerated() && input.input_type != InputType::Toggle {
            issues.push(format!(
                "input '{id}': linkedValues on a {:?} input (needs select, radio, imageradio or toggle)",
                input.input_type
            ));
            continue;
        }
        for key in input.linked_values.keys() {
            let declared = if input.input_type == InputType::Toggle {
                key == "true" || key == "false"
            } else {
                input.option_keys().contains(key)
            };
            if !declared {
                issues.push(format!("input '{id}': linkedValues key '{key}' is not one of its options"));
            }
        }
    }
}

fn check_presets(config: &CalculatorConfig, issues: &mut Vec<String>) {
    let mut seen = BTreeSet::new();
    for preset in &config.presets {
        if !seen.insert(preset.id.as_str()) {
            issues.push(format!("duplicate preset id '{}'", preset.id));
        }
        for field in preset.values.keys() {
            if config.input(field).is_none() {
                issues.push(format!(
                    "preset '{}': '{field}' is not a declared input",
                    preset.id
                ));
            }
        }
    }
}

fn check_translations(config: &CalculatorConfig, issues: &mut Vec<String>) {
    if config.t.is_empty() {
        issues.push("no locales declared in t".to_string());
        return;
    }
    if !config.t.contains_key(&config.default_locale) {
        issues.push(format!(
            "defaultLocale '{}' has no bundle in t",
            config.default_locale
        ));
    }
    for (locale, bundle) in &config.t {
        for result in &config.results {
            let has_label = bundle
                .results
                .get(&result.id)
                .is_some_and(|text| !text.label.trim().is_empty());
            if !has_label {
                issues.push(format!(
                    "locale '{locale}': missing t.{locale}.results.{}.label",
                    result.id
                ));
            }
        }
    }
}

fn check_auxiliary(config: &CalculatorConfig, issues: &mut Vec<String>) {
    if let Some(chart) = &config.chart {
        if chart.x_key.trim().is_empty() {
            issues.push("chart: xKey is empty".to_string());
        }
        if chart.series.is_empty() {
            issues.push("chart: no series declared".to_string());
        }
    }
    if let Some(table) = &config.detailed_table {
        if table.columns.is_empty() {
            issues.push("detailedTable: no columns declared".to_string());
        }
    }
}
