//! Checks over every built-in calculator and the settings file round trip.

use std::collections::BTreeMap;
use std::path::Path;

use calc_engine::calculators;
use calc_engine::{
    load_config_file, load_settings, save_settings, validate_config, CalculatorRegistry, EngineSettings, InputRequest,
};
use proptest::prelude::*;
use tempfile::tempdir;

const EN: &str = "en";

#[test]
fn test_builtin_configs_validate() {
    let registry = CalculatorRegistry::builtin().unwrap();
    assert_eq!(registry.ids().count(), calculators::builtin().len());
    for config in registry.list() {
        validate_config(config).unwrap();
        assert!(config.t.contains_key(EN), "{} has no English bundle", config.id);
    }
}

#[test]
fn test_config_files_load_from_disk() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs");
    let registry = CalculatorRegistry::builtin().unwrap();
    for id in registry.ids() {
        let config = load_config_file(&dir.join(format!("{id}.json"))).unwrap();
        assert_eq!(config.id, id);
    }
}

#[test]
fn test_defaults_compute_in_every_locale() {
    let registry = CalculatorRegistry::builtin().unwrap();
    for config in registry.list() {
        let request = if config.id == "ovulation" {
            InputRequest::new().value("lastPeriod", "2026-03-01")
        } else {
            InputRequest::new()
        };
        for locale in config.t.keys() {
            let results = registry.run(&config.id, &request, locale).unwrap();
            assert!(results.is_valid, "{} defaults invalid in {locale}", config.id);
            assert!(!results.formatted.is_empty());
        }
    }
}

#[test]
fn test_every_preset_resolves() {
    let registry = CalculatorRegistry::builtin().unwrap();
    for config in registry.list() {
        for preset in &config.presets {
            let request = InputRequest::new().preset(preset.id.clone());
            registry
                .run(&config.id, &request, EN)
                .unwrap_or_else(|e| panic!("{}/{}: {e}", config.id, preset.id));
        }
    }
}

#[test]
fn test_settings_round_trip_and_symbol_override() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");

    let mut settings = EngineSettings::default();
    settings.default_locale = "es".to_string();
    settings.symbols = BTreeMap::from([("USD".to_string(), "US$".to_string())]);
    save_settings(&settings, &path).unwrap();

    let loaded = load_settings(&path).unwrap();
    assert_eq!(loaded, settings);

    let registry = CalculatorRegistry::new(calculators::builtin(), loaded).unwrap();
    let request = InputRequest::new().value("billAmount", 75.0);
    // empty locale falls back to the settings default
    let results = registry.run("tip", &request, "").unwrap();
    assert_eq!(results.text("tipAmount"), Some("US$13,50"));
}

proptest! {
    #[test]
    fn prop_identical_requests_give_identical_json(
        bill in 1.0f64..10_000.0,
        tip in 0u32..=50,
        people in 1u32..=20,
    ) {
        let registry = CalculatorRegistry::builtin().unwrap();
        let request = InputRequest::new()
            .value("billAmount", bill)
            .value("splitBill", true)
            .value("numberOfPeople", f64::from(people))
            .edit("tipPercent", f64::from(tip));
        let first = registry.run("tip", &request, EN).unwrap().to_json().unwrap();
        let second = registry.run("tip", &request, EN).unwrap().to_json().unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_tip_total_is_bill_plus_tip(bill in 1.0f64..10_000.0, tip in 0u32..=50) {
        let registry = CalculatorRegistry::builtin().unwrap();
        let request = InputRequest::new()
            .value("billAmount", bill)
            .edit("tipPercent", f64::from(tip));
        let results = registry.run("tip", &request, EN).unwrap();
        let total = results.value("totalAmount").unwrap();
        let tip_amount = results.value("tipAmount").unwrap();
        prop_assert!((total - bill - tip_amount).abs() < 1e-6);
    }
}
