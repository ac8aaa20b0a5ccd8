//! # Input Resolution
//!
//! Turns a host's raw form state into the [`ResolvedInputs`] a compute function
//! reads. The steps run in a fixed order:
//!
//! 1. every input's `defaultValue`
//! 2. the chosen preset, then the user's `values`
//! 3. `linkedValues`, walking the dependency graph controllers-first
//! 4. ordered `edits`, each re-applying the edited field's links (last write wins)
//! 5. `showWhen`: hidden fields are removed, and hiding a controller hides its
//!    dependents
//! 6. units: the user's choice or `defaultUnit`, checked against `allowedUnits`;
//!    `ft_in` text is parsed to total inches and `date` text must be ISO
//!
//! Ids the configuration does not declare are logged and ignored.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{CalculatorConfig, DependencyGraph, InputType, InputValue};
use crate::errors::{CalcError, CalcResult};
use crate::units::parse_composite;

/// Composite feet + inches unit code
pub const FT_IN: &str = "ft_in";

/// One assignment made after the initial form state, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEdit {
    pub field: String,
    pub value: InputValue,
}

/// Raw form state posted by a host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    #[serde(default)]
    pub values: BTreeMap<String, InputValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edits: Vec<FieldEdit>,
    #[serde(default)]
    pub field_units: BTreeMap<String, String>,
}

impl InputRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preset(mut self, id: impl Into<String>) -> Self {
        self.preset = Some(id.into());
        self
    }

    pub fn value(mut self, id: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.values.insert(id.into(), value.into());
        self
    }

    pub fn unit(mut self, id: impl Into<String>, unit: impl Into<String>) -> Self {
        self.field_units.insert(id.into(), unit.into());
        self
    }

    pub fn edit(mut self, id: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.edits.push(FieldEdit {
            field: id.into(),
            value: value.into(),
        });
        self
    }
}

/// Normalized inputs for one invocation.
///
/// `values` holds visible fields only. `field_units` has an entry for every
/// visible unit-bearing field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedInputs {
    pub values: BTreeMap<String, InputValue>,
    pub field_units: BTreeMap<String, String>,
}

impl ResolvedInputs {
    pub fn get(&self, id: &str) -> Option<&InputValue> {
        self.values.get(id)
    }

    /// Whether `id` is visible and has a value
    pub fn contains(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    pub fn unit(&self, id: &str) -> Option<&str> {
        self.field_units.get(id).map(String::as_str)
    }
}

/// Resolve `request` against `config`.
///
/// # Errors
///
/// - `InvalidConfig` if the configuration's dependency graph is broken
/// - `UnknownPreset` for a preset the configuration does not declare
/// - `UnsupportedUnit` for a unit outside the field's `allowedUnits`
/// - `InvalidInput` for a `date` value that is not `YYYY-MM-DD`
pub fn resolve_inputs(config: &CalculatorConfig, request: &InputRequest) -> CalcResult<ResolvedInputs> {
    let graph = DependencyGraph::build(config).map_err(|issues| CalcError::invalid_config(&config.id, issues))?;
    resolve_with_graph(config, &graph, request)
}

/// [`resolve_inputs`] over a graph already built from `config`.
pub fn resolve_with_graph(
    config: &CalculatorConfig,
    graph: &DependencyGraph,
    request: &InputRequest,
) -> CalcResult<ResolvedInputs> {
    // 1. defaults
    let mut values: BTreeMap<String, InputValue> = config
        .inputs
        .iter()
        .filter_map(|input| input.default_value.clone().map(|v| (input.id.clone(), v)))
        .collect();

    // 2. preset, then user values
    if let Some(preset_id) = &request.preset {
        let preset = config
            .preset(preset_id)
            .ok_or_else(|| CalcError::unknown_preset(&config.id, preset_id))?;
        tracing::debug!(calculator = %config.id, preset = %preset_id, "applying preset");
        overlay(config, &mut values, &preset.values, "preset");
    }
    overlay(config, &mut values, &request.values, "values");

    // 3. links, controllers first
    for id in graph.order() {
        apply_links(config, &mut values, id);
    }

    // 4. edits replayed in order
    for edit in &request.edits {
        if config.input(&edit.field).is_none() {
            tracing::warn!(calculator = %config.id, field = %edit.field, "ignoring edit to undeclared input");
            continue;
        }
        values.insert(edit.field.clone(), edit.value.clone());
        cascade_links(config, &mut values, &edit.field);
    }

    // 5. visibility
    let hidden = hidden_fields(config, graph, &values);
    for id in &hidden {
        values.remove(id);
    }
    if !hidden.is_empty() {
        tracing::debug!(calculator = %config.id, ?hidden, "hid inputs");
    }

    // 6. units and typed text
    let field_units = resolve_units(config, request, &mut values, &hidden)?;
    check_dates(config, &values)?;

    Ok(ResolvedInputs { values, field_units })
}

fn overlay(
    config: &CalculatorConfig,
    values: &mut BTreeMap<String, InputValue>,
    source: &BTreeMap<String, InputValue>,
    origin: &str,
) {
    for (id, value) in source {
        if config.input(id).is_some() {
            values.insert(id.clone(), value.clone());
        } else {
            tracing::warn!(calculator = %config.id, field = %id, origin, "ignoring undeclared input");
        }
    }
}

/// Write the targets linked to `id`'s current value. Returns the targets written.
fn apply_links(config: &CalculatorConfig, values: &mut BTreeMap<String, InputValue>, id: &str) -> Vec<String> {
    let Some(input) = config.input(id) else {
        return Vec::new();
    };
    let Some(writes) = values.get(id).and_then(|current| input.links_for(current)) else {
        return Vec::new();
    };
    let writes = writes.clone();
    for (target, value) in &writes {
        tracing::debug!(calculator = %config.id, from = id, to = %target, %value, "linked value");
        values.insert(target.clone(), value.clone());
    }
    writes.into_keys().collect()
}

/// Re-apply links starting at `id`, then through every target it writes.
///
/// Terminates because the graph is acyclic.
fn cascade_links(config: &CalculatorConfig, values: &mut BTreeMap<String, InputValue>, id: &str) {
    let mut pending = vec![id.to_string()];
    while let Some(next) = pending.pop() {
        pending.extend(apply_links(config, values, &next));
    }
}

fn hidden_fields(
    config: &CalculatorConfig,
    graph: &DependencyGraph,
    values: &BTreeMap<String, InputValue>,
) -> BTreeSet<String> {
    let mut hidden = BTreeSet::new();
    for id in graph.order() {
        let Some(show_when) = config.input(id).and_then(|i| i.show_when.as_ref()) else {
            continue;
        };
        let controller_shown = !hidden.contains(&show_when.field)
            && values
                .get(&show_when.field)
                .is_some_and(|v| v.matches(&show_when.value));
        if !controller_shown {
            hidden.insert(id.clone());
        }
    }
    hidden
}

fn resolve_units(
    config: &CalculatorConfig,
    request: &InputRequest,
    values: &mut BTreeMap<String, InputValue>,
    hidden: &BTreeSet<String>,
) -> CalcResult<BTreeMap<String, String>> {
    for id in request.field_units.keys() {
        match config.input(id) {
            None => tracing::warn!(calculator = %config.id, field = %id, "ignoring unit for undeclared input"),
            Some(input) if !input.is_unit_bearing() => {
                tracing::warn!(calculator = %config.id, field = %id, "ignoring unit for unitless input")
            }
            Some(_) => {}
        }
    }

    let mut field_units = BTreeMap::new();
    for input in config.inputs.iter().filter(|i| !hidden.contains(&i.id)) {
        let Some(unit_type) = input.unit_type else {
            continue;
        };
        let unit = request
            .field_units
            .get(&input.id)
            .or(input.default_unit.as_ref())
            .ok_or_else(|| CalcError::unsupported_unit("", unit_type.as_str()))?;

        let allowed = input.allowed_units.is_empty() || input.allowed_units.contains(unit);
        if !allowed || !unit_type.supports(unit) {
            return Err(CalcError::unsupported_unit(unit, unit_type.as_str()));
        }

        if unit == FT_IN {
            if let Some(InputValue::Text(text)) = values.get(&input.id) {
                // A bad composite stays as text; the compute reads it as missing.
                if let Ok(inches) = parse_composite(text) {
                    values.insert(input.id.clone(), InputValue::Number(inches));
                }
            }
        }
        field_units.insert(input.id.clone(), unit.clone());
    }
    Ok(field_units)
}

fn check_dates(config: &CalculatorConfig, values: &BTreeMap<String, InputValue>) -> CalcResult<()> {
    for input in config.inputs.iter().filter(|i| i.input_type == InputType::Date) {
        let Some(value) = values.get(&input.id) else {
            continue;
        };
        if value.is_blank() {
            continue;
        }
        let text = value.key();
        NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .map_err(|_| CalcError::invalid_input(&input.id, &text, "Expected a date as YYYY-MM-DD"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tip_config() -> CalculatorConfig {
        CalculatorConfig::from_json(
            r#"{
            "id": "tip", "version": "1.0.0", "category": "finance",
            "inputs": [
                {"id": "billAmount", "type": "number", "defaultValue": 50, "min": 0,
                 "unitType": "currency", "defaultUnit": "USD", "allowedUnits": ["USD", "EUR"]},
                {"id": "serviceQuality", "type": "select", "defaultValue": "good",
                 "options": [{"value": "poor"}, {"value": "good"}, {"value": "excellent"}],
                 "linkedValues": {"poor": {"tipPercent": 10}, "good": {"tipPercent": 18},
                                  "excellent": {"tipPercent": 22}}},
                {"id": "tipPercent", "type": "slider", "defaultValue": 15, "min": 0, "max": 50},
                {"id": "splitBill", "type": "toggle", "defaultValue": false},
                {"id": "numberOfPeople", "type": "stepper", "defaultValue": 2, "min": 1,
                 "showWhen": {"field": "splitBill", "value": true}},
                {"id": "roundUp", "type": "toggle", "defaultValue": false,
                 "showWhen": {"field": "splitBill", "value": true}},
                {"id": "roundTo", "type": "select", "defaultValue": "1",
                 "options": [{"value": "1"}, {"value": "5"}],
                 "showWhen": {"field": "roundUp", "value": true}},
                {"id": "height", "type": "number", "unitType": "height", "defaultUnit": "cm",
                 "allowedUnits": ["cm", "ft_in"]},
                {"id": "visitDate", "type": "date"}
            ],
            "presets": [{"id": "bigParty", "values": {"splitBill": true, "numberOfPeople": 8}}],
            "results": [],
            "t": {"en": {}}
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_and_links() {
        let resolved = resolve_inputs(&tip_config(), &InputRequest::new()).unwrap();
        // "good" links 18 over the slider default of 15
        assert_eq!(resolved.get("tipPercent"), Some(&InputValue::Number(18.0)));
        assert_eq!(resolved.get("billAmount"), Some(&InputValue::Number(50.0)));
        assert_eq!(resolved.unit("billAmount"), Some("USD"));
        assert_eq!(resolved.unit("height"), Some("cm"));
    }

    #[test]
    fn test_hidden_fields_are_removed() {
        let resolved = resolve_inputs(&tip_config(), &InputRequest::new()).unwrap();
        assert!(!resolved.contains("numberOfPeople"));
        assert!(!resolved.contains("roundUp"));
        assert!(!resolved.contains("roundTo"));
    }

    #[test]
    fn test_hidden_controller_hides_dependents() {
        // roundUp is true, but splitBill hides it, so roundTo goes too
        let request = InputRequest::new().value("roundUp", true);
        let resolved = resolve_inputs(&tip_config(), &request).unwrap();
        assert!(!resolved.contains("roundUp"));
        assert!(!resolved.contains("roundTo"));

        let request = request.value("splitBill", "true");
        let resolved = resolve_inputs(&tip_config(), &request).unwrap();
        assert!(resolved.contains("roundTo"));
        assert_eq!(resolved.get("numberOfPeople"), Some(&InputValue::Number(2.0)));
    }

    #[test]
    fn test_edit_after_link_wins() {
        let request = InputRequest::new()
            .value("serviceQuality", "excellent")
            .edit("tipPercent", 25);
        let resolved = resolve_inputs(&tip_config(), &request).unwrap();
        assert_eq!(resolved.get("tipPercent"), Some(&InputValue::Number(25.0)));

        // re-selecting a quality re-applies its link
        let request = request.edit("serviceQuality", "poor");
        let resolved = resolve_inputs(&tip_config(), &request).unwrap();
        assert_eq!(resolved.get("tipPercent"), Some(&InputValue::Number(10.0)));
        assert_eq!(resolved.get("serviceQuality"), Some(&InputValue::from("poor")));
    }

    #[test]
    fn test_user_value_on_link_target_is_overridden_by_link() {
        let request = InputRequest::new().value("tipPercent", 30);
        let resolved = resolve_inputs(&tip_config(), &request).unwrap();
        assert_eq!(resolved.get("tipPercent"), Some(&InputValue::Number(18.0)));
    }

    #[test]
    fn test_preset_then_values() {
        let request = InputRequest::new().preset("bigParty").value("numberOfPeople", 6);
        let resolved = resolve_inputs(&tip_config(), &request).unwrap();
        assert_eq!(resolved.get("splitBill"), Some(&InputValue::Bool(true)));
        assert_eq!(resolved.get("numberOfPeople"), Some(&InputValue::Number(6.0)));

        let err = resolve_inputs(&tip_config(), &InputRequest::new().preset("nope")).unwrap_err();
        assert!(matches!(err, CalcError::UnknownPreset { .. }));
    }

    #[test]
    fn test_undeclared_ids_are_ignored() {
        let request = InputRequest::new()
            .value("ghost", 1)
            .edit("phantom", 2)
            .unit("spooky", "kg");
        let resolved = resolve_inputs(&tip_config(), &request).unwrap();
        assert!(!resolved.contains("ghost"));
        assert!(!resolved.contains("phantom"));
        assert!(resolved.unit("spooky").is_none());
    }

    #[test]
    fn test_disallowed_unit_is_an_error() {
        let err = resolve_inputs(&tip_config(), &InputRequest::new().unit("height", "in")).unwrap_err();
        assert_eq!(
            err,
            CalcError::UnsupportedUnit {
                unit: "in".to_string(),
                unit_type: "height".to_string()
            }
        );
        let err = resolve_inputs(&tip_config(), &InputRequest::new().unit("billAmount", "GBP")).unwrap_err();
        assert!(matches!(err, CalcError::UnsupportedUnit { .. }));
    }

    #[test]
    fn test_composite_height_parsed_to_inches() {
        let request = InputRequest::new().value("height", "5'10\"").unit("height", "ft_in");
        let resolved = resolve_inputs(&tip_config(), &request).unwrap();
        assert_eq!(resolved.get("height"), Some(&InputValue::Number(70.0)));

        let request = InputRequest::new().value("height", "tall").unit("height", "ft_in");
        let resolved = resolve_inputs(&tip_config(), &request).unwrap();
        assert_eq!(resolved.get("height"), Some(&InputValue::from("tall")));
    }

    #[test]
    fn test_dates_must_be_iso() {
        let ok = InputRequest::new().value("visitDate", "2024-03-01");
        assert!(resolve_inputs(&tip_config(), &ok).is_ok());

        let bad = InputRequest::new().value("visitDate", "03/01/2024");
        let err = resolve_inputs(&tip_config(), &bad).unwrap_err();
        assert!(matches!(err, CalcError::InvalidInput { .. }));
    }

    #[test]
    fn test_request_json_shape() {
        let request: InputRequest = serde_json::from_str(
            r#"{"values": {"billAmount": "75"}, "edits": [{"field": "tipPercent", "value": 20}],
                "fieldUnits": {"billAmount": "EUR"}}"#,
        )
        .unwrap();
        let resolved = resolve_inputs(&tip_config(), &request).unwrap();
        assert_eq!(resolved.get("billAmount").and_then(InputValue::as_number), Some(75.0));
        assert_eq!(resolved.get("tipPercent"), Some(&InputValue::Number(20.0)));
        assert_eq!(resolved.unit("billAmount"), Some("EUR"));
    }

    proptest! {
        #[test]
        fn prop_resolution_is_deterministic(
            bill in 0.0f64..10_000.0,
            quality in prop::sample::select(vec!["poor", "good", "excellent"]),
            split in any::<bool>(),
            round_up in any::<bool>(),
            edit in prop::option::of(0.0f64..50.0),
        ) {
            let mut request = InputRequest::new()
                .value("billAmount", bill)
                .value("serviceQuality", quality)
                .value("splitBill", split)
                .value("roundUp", round_up);
            if let Some(tip) = edit {
                request = request.edit("tipPercent", tip);
            }
            let config = tip_config();
            let first = resolve_inputs(&config, &request).unwrap();
            let second = resolve_inputs(&config, &request).unwrap();
            prop_assert_eq!(
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap()
            );
            // hidden fields never leak through
            prop_assert_eq!(first.contains("numberOfPeople"), split);
            prop_assert_eq!(first.contains("roundTo"), split && round_up);
        }
    }
}
