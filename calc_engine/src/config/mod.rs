//! Declarative calculator configurations.
//!
//! - [`schema`]: the serde data model (inputs, presets, results, translations)
//! - [`graph`]: `showWhen` / `linkedValues` dependency graph
//! - [`validation`]: authoring checks run before a configuration is served

pub mod graph;
pub mod schema;
pub mod validation;

pub use graph::{Dependency, DependencyGraph, DependencyKind};
pub use schema::{
    CalculatorConfig, ChartDescriptor, ChartSeries, DisplayTier, FormatHint, InputDefinition,
    InputType, InputValue, LinkedValues, OptionDef, Preset, ResultDefinition, ShowWhen,
    TableColumn, TableDescriptor,
};
pub use validation::{collect_issues, validate_config};
