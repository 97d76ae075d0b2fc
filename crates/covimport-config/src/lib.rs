//! Configuration parsing and management for covimport.
//!
//! This crate provides:
//! - Configuration types (`Config`, `Mode`, `ReportEntry`)
//! - TOML parsing
//! - Precedence handling (overrides > config file > defaults)

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value.
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

// ============================================================================
// Configuration Types
// ============================================================================

/// Coverage flavor the import run records measures under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Record measures under the base (unit-test) metrics.
    #[default]
    Unit,
    /// Redirect measures to their integration-test metric variants.
    Integration,
}

/// One configured report source entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReportEntry {
    /// Report format label (opaque to the core, e.g. "opencover").
    pub format: String,
    /// Wildcard pattern locating the report files.
    pub pattern: String,
}

/// Path normalization configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NormalizeConfig {
    /// Prefixes to strip from report file paths before lookup.
    #[serde(default)]
    pub path_strip: Vec<String>,
}

/// Full configuration for covimport.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Language key of the files to measure.
    #[serde(default)]
    pub language: Option<String>,

    /// Coverage flavor to record measures under.
    #[serde(default)]
    pub mode: Option<Mode>,

    /// Configured report sources.
    #[serde(default)]
    pub reports: Vec<ReportEntry>,

    /// Path normalization configuration.
    #[serde(default)]
    pub normalize: NormalizeConfig,
}

// ============================================================================
// Effective Configuration
// ============================================================================

/// Effective configuration with all values resolved.
///
/// This represents the final configuration after applying:
/// 1. Defaults
/// 2. Config file values
/// 3. Overrides
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub language_key: String,
    pub mode: Mode,
    pub reports: Vec<ReportEntry>,
    pub path_strip: Vec<String>,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            language_key: "cs".to_string(),
            mode: Mode::Unit,
            reports: vec![],
            path_strip: vec![],
        }
    }
}

// ============================================================================
// Configuration Loading
// ============================================================================

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load configuration from a TOML string.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if let Some(language) = &config.language {
        if language.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "language must not be empty".to_string(),
            ));
        }
    }
    for entry in &config.reports {
        if entry.format.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "report entry format must not be empty".to_string(),
            ));
        }
        if entry.pattern.trim().is_empty() {
            return Err(ConfigError::InvalidValue(format!(
                "report entry pattern must not be empty (format '{}')",
                entry.format
            )));
        }
    }
    Ok(())
}

/// Try to find and load configuration from the standard location.
///
/// Searches for `covimport.toml` in the current directory and parent
/// directories.
pub fn discover_config() -> Option<(std::path::PathBuf, Config)> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join("covimport.toml");
        if config_path.exists() {
            if let Ok(config) = load_config(&config_path) {
                return Some((config_path, config));
            }
        }

        if !current.pop() {
            break;
        }
    }

    None
}

// ============================================================================
// Precedence Resolution
// ============================================================================

/// Caller-supplied override options.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub language: Option<String>,
    pub mode: Option<Mode>,
    pub reports: Option<Vec<ReportEntry>>,
    pub path_strip: Option<Vec<String>>,
}

/// Resolve effective configuration from config file and overrides.
///
/// Precedence: overrides > config file > defaults
pub fn resolve_config(config: Option<&Config>, overrides: &Overrides) -> EffectiveConfig {
    let mut effective = EffectiveConfig::default();

    // Apply config file values
    if let Some(config) = config {
        if let Some(language) = &config.language {
            effective.language_key = language.clone();
        }
        if let Some(mode) = config.mode {
            effective.mode = mode;
        }
        effective.reports = config.reports.clone();
        effective.path_strip = config.normalize.path_strip.clone();
    }

    // Apply overrides
    if let Some(language) = &overrides.language {
        effective.language_key = language.clone();
    }
    if let Some(mode) = overrides.mode {
        effective.mode = mode;
    }
    if let Some(reports) = &overrides.reports {
        effective.reports = reports.clone();
    }
    if let Some(path_strip) = &overrides.path_strip {
        effective.path_strip = path_strip.clone();
    }

    effective
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config = parse_config("").unwrap();
        assert!(config.language.is_none());
        assert!(config.mode.is_none());
        assert!(config.reports.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
language = "vbnet"
mode = "integration"

[[reports]]
format = "opencover"
pattern = "coverage/**/*.xml"

[[reports]]
format = "ncover3"
pattern = "reports/project.nccov"

[normalize]
path_strip = ["/agent/_work/1/s/"]
"#;
        let config = parse_config(toml).unwrap();

        assert_eq!(config.language.as_deref(), Some("vbnet"));
        assert_eq!(config.mode, Some(Mode::Integration));
        assert_eq!(config.reports.len(), 2);
        assert_eq!(config.reports[0].format, "opencover");
        assert_eq!(config.reports[1].pattern, "reports/project.nccov");
        assert_eq!(config.normalize.path_strip, vec!["/agent/_work/1/s/"]);
    }

    #[test]
    fn test_invalid_empty_language() {
        let result = parse_config("language = \"\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_empty_report_pattern() {
        let toml = r#"
[[reports]]
format = "opencover"
pattern = ""
"#;
        let result = parse_config(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_mode_rejected() {
        let result = parse_config("mode = \"e2e\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_effective_config_defaults() {
        let effective = EffectiveConfig::default();
        assert_eq!(effective.language_key, "cs");
        assert_eq!(effective.mode, Mode::Unit);
        assert!(effective.reports.is_empty());
        assert!(effective.path_strip.is_empty());
    }

    #[test]
    fn test_resolve_config_no_config() {
        let effective = resolve_config(None, &Overrides::default());
        assert_eq!(effective.language_key, "cs");
        assert_eq!(effective.mode, Mode::Unit);
    }

    #[test]
    fn test_resolve_config_file_values() {
        let config = parse_config("language = \"vbnet\"\nmode = \"integration\"").unwrap();
        let effective = resolve_config(Some(&config), &Overrides::default());

        assert_eq!(effective.language_key, "vbnet");
        assert_eq!(effective.mode, Mode::Integration);
    }

    #[test]
    fn test_resolve_config_overrides_win() {
        let config = parse_config("language = \"vbnet\"").unwrap();
        let overrides = Overrides {
            language: Some("cs".to_string()),
            mode: Some(Mode::Integration),
            ..Default::default()
        };

        let effective = resolve_config(Some(&config), &overrides);

        assert_eq!(effective.language_key, "cs");
        assert_eq!(effective.mode, Mode::Integration);
    }

    #[test]
    fn test_resolve_config_override_reports() {
        let toml = r#"
[[reports]]
format = "opencover"
pattern = "coverage/*.xml"
"#;
        let config = parse_config(toml).unwrap();
        let overrides = Overrides {
            reports: Some(vec![ReportEntry {
                format: "vscoveragexml".to_string(),
                pattern: "TestResults/**/*.coveragexml".to_string(),
            }]),
            ..Default::default()
        };

        let effective = resolve_config(Some(&config), &overrides);

        assert_eq!(effective.reports.len(), 1);
        assert_eq!(effective.reports[0].format, "vscoveragexml");
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("covimport.toml");
        std::fs::write(&path, "language = \"cs\"\nmode = \"unit\"").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.language.as_deref(), Some("cs"));
        assert_eq!(config.mode, Some(Mode::Unit));
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(&dir.path().join("covimport.toml"));
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_load_config_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("covimport.toml");
        std::fs::write(&path, "language = [not toml").unwrap();

        let result = load_config(&path);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
