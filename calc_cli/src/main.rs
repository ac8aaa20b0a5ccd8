//! # calc CLI
//!
//! Terminal front end for the calculator engine.
//!
//! ## Usage
//!
//! ```bash
//! # What is available
//! calc list
//! calc show auto-loan
//!
//! # Run with defaults, a preset, or explicit values and units
//! calc run tip --set billAmount=75 --set serviceQuality=good
//! calc run caloric-deficit --set weight=90 --unit weight=kg --locale es
//! calc run auto-loan --preset usedCar --json
//!
//! # Authoring
//! calc validate drafts/my-calculator.json
//! calc init-settings calc-settings.json
//! ```
//!
//! Logging goes to stderr. `CALC_LOG` (or `RUST_LOG`) sets the filter and
//! `CALC_LOG_FORMAT=json` switches to JSON lines.

use std::path::PathBuf;
use std::process::ExitCode;

use calc_engine::calculators;
use calc_engine::{
    load_config_file, load_settings, save_settings, CalcResult, CalculatorConfig, CalculatorRegistry,
    EngineSettings, InputRequest, InputValue, ResultsEnvelope,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "calc")]
#[command(version, about = "Run declarative calculators from the terminal", long_about = None)]
struct Cli {
    /// Engine settings file (default locale, symbols, locale styles)
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    /// Locale for labels and formatting; settings default when omitted
    #[arg(short, long, global = true, default_value = "")]
    locale: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every calculator
    List,

    /// Print a calculator's configuration as JSON
    Show { id: String },

    /// Resolve inputs and compute
    Run {
        id: String,

        /// Preset applied before explicit values
        #[arg(short, long)]
        preset: Option<String>,

        /// Input value, `id=value` (repeatable)
        #[arg(long = "set", value_parser = parse_pair)]
        values: Vec<(String, String)>,

        /// Unit for a field, `id=unit` (repeatable)
        #[arg(long = "unit", value_parser = parse_pair)]
        units: Vec<(String, String)>,

        /// Edit replayed after links, `id=value` (repeatable, in order)
        #[arg(long = "edit", value_parser = parse_pair)]
        edits: Vec<(String, String)>,

        /// Print the full results envelope as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a configuration document
    Validate { path: PathBuf },

    /// Write a default settings file
    InitSettings { path: PathBuf },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.trim().to_string())),
        _ => Err(format!("expected id=value, got '{raw}'")),
    }
}

/// `true`/`false` become toggles, numbers become numbers, the rest stays text.
fn parse_value(raw: &str) -> InputValue {
    match raw {
        "true" => InputValue::from(true),
        "false" => InputValue::from(false),
        _ => raw
            .parse::<f64>()
            .map(InputValue::from)
            .unwrap_or_else(|_| InputValue::from(raw)),
    }
}

fn init_tracing() {
    let format = std::env::var("CALC_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_env("CALC_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("calc_engine=warn,calc_cli=info"));

    let registry = tracing_subscriber::registry().with(filter);
    match format.as_str() {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.error_code(), "{e}");
            eprintln!("Error: {e}");
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!("{json}");
            }
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> CalcResult<()> {
    let settings = match &cli.settings {
        Some(path) => load_settings(path)?,
        None => EngineSettings::default(),
    };
    let registry = || CalculatorRegistry::new(calculators::builtin(), settings.clone());

    match cli.command {
        Commands::List => {
            let registry = registry()?;
            list(&registry, registry.settings().locale_or_default(&cli.locale));
        }
        Commands::Show { id } => {
            println!("{}", serde_json::to_string_pretty(registry()?.get(&id)?)?);
        }
        Commands::Run {
            id,
            preset,
            values,
            units,
            edits,
            json,
        } => {
            let mut request = InputRequest::new();
            if let Some(preset) = preset {
                request = request.preset(preset);
            }
            for (field, raw) in values {
                request = request.value(field, parse_value(&raw));
            }
            for (field, unit) in units {
                request = request.unit(field, unit);
            }
            for (field, raw) in edits {
                request = request.edit(field, parse_value(&raw));
            }

            let registry = registry()?;
            let locale = registry.settings().locale_or_default(&cli.locale);
            let envelope = registry.run(&id, &request, locale)?;
            if json {
                println!("{}", envelope.to_json_pretty()?);
            } else {
                print_results(registry.get(&id)?, locale, &envelope);
            }
        }
        Commands::Validate { path } => {
            let config = load_config_file(&path)?;
            println!(
                "{} {}: OK ({} inputs, {} results)",
                config.id,
                config.version,
                config.inputs.len(),
                config.results.len()
            );
        }
        Commands::InitSettings { path } => {
            save_settings(&settings, &path)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn list(registry: &CalculatorRegistry, locale: &str) {
    for config in registry.list() {
        let t = config.translator(locale);
        println!("{:<18} {:<12} {}", config.id, config.category, t.title());
    }
}

fn print_results(config: &CalculatorConfig, locale: &str, envelope: &ResultsEnvelope) {
    let t = config.translator(locale);

    println!("{}", t.title());
    println!("{}", "=".repeat(t.title().chars().count()));
    if !envelope.is_valid {
        println!("Inputs are incomplete or out of range.");
        return;
    }

    let rows: Vec<(String, &str)> = config
        .results
        .iter()
        .filter_map(|r| envelope.text(&r.id).map(|text| (t.result_label(&r.id), text)))
        .collect();
    let width = rows.iter().map(|(label, _)| label.chars().count()).max().unwrap_or(0);
    for (label, text) in &rows {
        println!("  {label:<width$}  {text}");
    }
    if !envelope.summary.is_empty() {
        println!();
        println!("{}", envelope.summary);
    }
}
