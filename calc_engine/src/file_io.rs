//! # File I/O Module
//!
//! The only filesystem surface of the engine, used at startup and by authoring
//! tools. Nothing on the compute path touches files.
//!
//! - **Settings**: [`load_settings`] checks schema compatibility;
//!   [`save_settings`] writes atomically (write `.tmp`, sync, rename)
//! - **Configurations**: [`load_config_file`] parses and validates a calculator
//!   configuration document, so authors can check a draft before embedding it
//!
//! ## Example
//!
//! ```rust,no_run
//! use calc_engine::file_io::{load_settings, save_settings};
//! use calc_engine::settings::EngineSettings;
//! use std::path::Path;
//!
//! let path = Path::new("calc-settings.json");
//! save_settings(&EngineSettings::default(), path)?;
//! let settings = load_settings(path)?;
//! assert_eq!(settings.default_locale, "en");
//! # Ok::<(), calc_engine::errors::CalcError>(())
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::config::{validate_config, CalculatorConfig};
use crate::errors::{CalcError, CalcResult};
use crate::settings::{EngineSettings, SCHEMA_VERSION};

fn read_to_string(path: &Path) -> CalcResult<String> {
    fs::read_to_string(path).map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))
}

/// Save settings with atomic write semantics.
///
/// 1. Serialize to pretty JSON
/// 2. Write to a sibling `.tmp` file and fsync it
/// 3. Rename over `path`
pub fn save_settings(settings: &EngineSettings, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(settings)?;
    let tmp_path = path.with_extension("json.tmp");

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    tmp_file.sync_all().map_err(|e| {
        CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    tracing::debug!(path = %path.display(), "saved settings");
    Ok(())
}

/// Load settings from a JSON file.
///
/// # Errors
///
/// * `FileError` - I/O failure
/// * `SerializationError` - invalid JSON
/// * `VersionMismatch` - written by an incompatible version
/// * `InvalidConfig` - a locale style with a broken date pattern
pub fn load_settings(path: &Path) -> CalcResult<EngineSettings> {
    let contents = read_to_string(path)?;
    let settings: EngineSettings = serde_json::from_str(&contents)
        .map_err(|e| CalcError::serialization(format!("Invalid JSON in {}: {}", path.display(), e)))?;

    validate_version(&settings.version)?;
    settings.validate()?;

    tracing::info!(path = %path.display(), locale = %settings.default_locale, "loaded settings");
    Ok(settings)
}

/// Load and validate a calculator configuration document.
///
/// # Errors
///
/// `InvalidConfig` listing every problem, besides the I/O and JSON errors of
/// [`load_settings`].
pub fn load_config_file(path: &Path) -> CalcResult<CalculatorConfig> {
    let contents = read_to_string(path)?;
    let config = CalculatorConfig::from_json(&contents)
        .map_err(|e| CalcError::serialization(format!("Invalid configuration in {}: {}", path.display(), e)))?;
    validate_config(&config)?;
    Ok(config)
}

/// A file version is compatible when its major version matches; in 0.x the
/// file's minor version may not be newer than ours.
fn validate_version(file_version: &str) -> CalcResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };
    let parse = |v: &str| -> Vec<u32> { v.split('.').filter_map(|p| p.parse().ok()).collect() };
    let file_parts = parse(file_version);
    let current_parts = parse(SCHEMA_VERSION);

    let (Some(file_major), Some(current_major)) = (file_parts.first(), current_parts.first()) else {
        return Err(mismatch());
    };
    if file_major != current_major {
        return Err(mismatch());
    }
    if *current_major == 0 {
        if let (Some(file_minor), Some(current_minor)) = (file_parts.get(1), current_parts.get(1)) {
            if file_minor > current_minor {
                return Err(mismatch());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = EngineSettings::default();
        settings.default_locale = "es".to_string();
        settings.symbols.insert("MXN".to_string(), "$".to_string());
        save_settings(&settings, &path).unwrap();

        let loaded = load_settings(&path).unwrap();
        assert_eq!(loaded, settings);
        // temp file is gone after the rename
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_load_rejects_newer_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"version": "0.9.0", "defaultLocale": "en"}"#).unwrap();

        let err = load_settings(&path).unwrap_err();
        assert_eq!(err.error_code(), "VERSION_MISMATCH");
    }

    #[test]
    fn test_load_rejects_bad_date_pattern() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"version": "0.1.0", "defaultLocale": "en",
                "localeStyles": {"en": {"grouping": ",", "decimal": ".", "datePattern": "%Q"}}}"#,
        )
        .unwrap();

        let err = load_settings(&path).unwrap_err();
        assert!(matches!(err, CalcError::InvalidConfig { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_settings(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CalcError::FileError { .. }));
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.5").is_ok());
        assert!(validate_version("0.0.9").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("latest").is_err());
    }

    #[test]
    fn test_load_config_file_reports_issues() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("draft.json");
        fs::write(
            &path,
            r#"{"id": "draft", "version": "0.1.0", "category": "misc",
                "inputs": [{"id": "a", "type": "number", "showWhen": {"field": "b", "value": 1}}],
                "results": [{"id": "out"}],
                "t": {"en": {"results": {}}}}"#,
        )
        .unwrap();

        match load_config_file(&path).unwrap_err() {
            CalcError::InvalidConfig { calculator, issues } => {
                assert_eq!(calculator, "draft");
                assert_eq!(issues.len(), 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_load_config_file_bad_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, CalcError::SerializationError { .. }));
    }
}
