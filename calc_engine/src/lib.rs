//! # calc_engine - Declarative Calculator Engine
//!
//! `calc_engine` runs calculators whose inputs, presets, results and
//! translations are declared in JSON configuration documents. A host supplies
//! raw values, a unit per field and a locale; the engine resolves defaults,
//! presets, linked values and visibility, normalizes units, runs the
//! calculator's compute function and returns a serializable [`ResultsEnvelope`].
//!
//! ## Design Philosophy
//!
//! - **Stateless**: compute functions are pure; identical inputs give
//!   byte-identical JSON
//! - **JSON-First**: configurations and envelopes implement Serialize/Deserialize
//! - **Rich Errors**: structured [`CalcError`] values, never bare strings
//! - **Fail Fast on Authoring**: every built-in configuration is validated when
//!   the registry is built
//!
//! ## Quick Start
//!
//! ```rust
//! use calc_engine::{CalculatorRegistry, InputRequest};
//!
//! let registry = CalculatorRegistry::builtin().unwrap();
//! let request = InputRequest::new()
//!     .value("billAmount", 75.0)
//!     .value("serviceQuality", "good");
//!
//! let results = registry.run("tip", &request, "en").unwrap();
//! assert!(results.is_valid);
//! assert_eq!(results.text("tipAmount"), Some("$13.50"));
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Configuration schema, dependency graph and validation
//! - [`resolve`] - Defaults, presets, links, visibility and unit normalization
//! - [`compute`] - The [`Calculator`] trait and the results envelope
//! - [`calculators`] - The built-in catalogue
//! - [`registry`] - Lookup and the run pipeline
//! - [`units`] - Unit types, conversion and display symbols
//! - [`format`] - Locale-aware number, currency, unit and date formatting
//! - [`i18n`] - Translation bundles and template interpolation
//! - [`derive`] - Shared arithmetic behind results, charts and tables
//! - [`settings`] / [`file_io`] - Engine settings and file loading
//! - [`errors`] - Structured error types

pub mod calculators;
pub mod compute;
pub mod config;
pub mod derive;
pub mod errors;
pub mod file_io;
pub mod format;
pub mod i18n;
pub mod registry;
pub mod resolve;
pub mod settings;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use compute::{Calculator, ComputeInput, DataRow, ResultValue, ResultsEnvelope};
pub use config::{validate_config, CalculatorConfig, InputValue};
pub use errors::{CalcError, CalcResult};
pub use file_io::{load_config_file, load_settings, save_settings};
pub use format::Formatter;
pub use registry::CalculatorRegistry;
pub use resolve::{resolve_inputs, InputRequest, ResolvedInputs};
pub use settings::EngineSettings;
pub use units::{SymbolTable, UnitType};
