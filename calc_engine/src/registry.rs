//! # Calculator Registry
//!
//! Owns every calculator with its parsed, validated configuration, plus the
//! read-only [`SymbolTable`] and [`EngineSettings`] shared by all of them.
//!
//! The built-in registry is created once on first use and shared across
//! threads. Creating it fails if any embedded configuration is invalid, which
//! the test suite exercises on every run.
//!
//! ## Example
//!
//! ```rust
//! use calc_engine::registry::CalculatorRegistry;
//! use calc_engine::resolve::InputRequest;
//!
//! let registry = CalculatorRegistry::builtin()?;
//! let request = InputRequest::new().value("billAmount", 75.0);
//! let envelope = registry.run("tip", &request, "en")?;
//! assert!(envelope.is_valid);
//! assert_eq!(envelope.text("tipAmount"), Some("$13.50"));
//! # Ok::<(), calc_engine::errors::CalcError>(())
//! ```

use std::collections::BTreeMap;

use once_cell::sync::OnceCell;

use crate::calculators;
use crate::compute::{Calculator, ComputeInput, ResultsEnvelope};
use crate::config::{validate_config, CalculatorConfig, DependencyGraph};
use crate::errors::{CalcError, CalcResult};
use crate::format::Formatter;
use crate::resolve::{resolve_with_graph, InputRequest, ResolvedInputs};
use crate::settings::EngineSettings;
use crate::units::SymbolTable;

static BUILTIN: OnceCell<CalculatorRegistry> = OnceCell::new();

struct Entry {
    config: CalculatorConfig,
    graph: DependencyGraph,
    calculator: Box<dyn Calculator>,
}

/// Calculators by id, ready to run.
pub struct CalculatorRegistry {
    entries: BTreeMap<&'static str, Entry>,
    settings: EngineSettings,
    symbols: SymbolTable,
}

impl std::fmt::Debug for CalculatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalculatorRegistry")
            .field("calculators", &self.entries.keys().collect::<Vec<_>>())
            .field("settings", &self.settings)
            .finish()
    }
}

impl CalculatorRegistry {
    /// The shared registry of built-in calculators with default settings.
    pub fn builtin() -> CalcResult<&'static CalculatorRegistry> {
        BUILTIN.get_or_try_init(|| CalculatorRegistry::new(calculators::builtin(), EngineSettings::default()))
    }

    /// Build a registry, parsing and validating every configuration.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for settings that fail [`EngineSettings::validate`], or
    /// for the first calculator whose configuration is broken, whose id
    /// disagrees with its configuration, or that is registered twice.
    pub fn new(calculators: Vec<Box<dyn Calculator>>, settings: EngineSettings) -> CalcResult<Self> {
        settings.validate()?;
        let mut entries = BTreeMap::new();
        for calculator in calculators {
            let id = calculator.id();
            let config = CalculatorConfig::from_json(calculator.config_source())
                .map_err(|e| CalcError::invalid_config(id, vec![e.to_string()]))?;
            if config.id != id {
                return Err(CalcError::invalid_config(
                    id,
                    vec![format!("configuration id '{}' does not match calculator id", config.id)],
                ));
            }
            validate_config(&config)?;
            let graph = DependencyGraph::build(&config).map_err(|issues| CalcError::invalid_config(id, issues))?;
            let entry = Entry {
                config,
                graph,
                calculator,
            };
            if entries.insert(id, entry).is_some() {
                return Err(CalcError::invalid_config(id, vec!["registered twice".to_string()]));
            }
        }

        let symbols = settings.symbol_table();
        tracing::info!(
            calculators = entries.len(),
            default_locale = %settings.default_locale,
            "calculator registry loaded"
        );
        Ok(CalculatorRegistry {
            entries,
            settings,
            symbols,
        })
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// All configurations, sorted by id
    pub fn list(&self) -> impl Iterator<Item = &CalculatorConfig> {
        self.entries.values().map(|e| &e.config)
    }

    pub fn get(&self, id: &str) -> CalcResult<&CalculatorConfig> {
        self.entry(id).map(|e| &e.config)
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Formatter for `locale` honoring settings overrides.
    pub fn formatter(&self, locale: &str) -> Formatter<'_> {
        let locale = self.settings.locale_or_default(locale);
        Formatter::with_style(self.settings.style_for(locale), &self.symbols)
    }

    /// Resolve a request without computing.
    pub fn resolve(&self, id: &str, request: &InputRequest) -> CalcResult<ResolvedInputs> {
        let entry = self.entry(id)?;
        resolve_with_graph(&entry.config, &entry.graph, request)
    }

    /// Evaluation order and edges, built once at load.
    pub fn graph(&self, id: &str) -> CalcResult<&DependencyGraph> {
        Ok(&self.entry(id)?.graph)
    }

    /// Compute over already-resolved inputs.
    pub fn compute(&self, id: &str, inputs: &ResolvedInputs, locale: &str) -> CalcResult<ResultsEnvelope> {
        let entry = self.entry(id)?;
        let locale = self.settings.locale_or_default(locale);
        let input = ComputeInput::new(&entry.config, inputs, entry.config.translator(locale), self.formatter(locale));
        entry.calculator.compute(&input)
    }

    /// Resolve `request` and compute, in `locale`.
    ///
    /// # Errors
    ///
    /// `UnknownCalculator`, plus anything [`resolve_inputs`] or the compute
    /// function reports. Invalid user input is a valid `Ok` envelope with
    /// `is_valid == false`.
    pub fn run(&self, id: &str, request: &InputRequest, locale: &str) -> CalcResult<ResultsEnvelope> {
        let inputs = self.resolve(id, request)?;
        tracing::debug!(calculator = id, locale, inputs = inputs.values.len(), "computing");
        self.compute(id, &inputs, locale)
    }

    fn entry(&self, id: &str) -> CalcResult<&Entry> {
        self.entries.get(id).ok_or_else(|| CalcError::unknown_calculator(id))
    }
}
