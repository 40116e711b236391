//! Converter configuration.
//!
//! Handles loading, validating, and merging `config.toml`. A user file is
//! sparse: it is merged over the stock defaults, so it only needs the keys it
//! wants to change. Without `--config` the stock defaults are used as-is.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [defaults]
//! format = "png"              # Target format a session starts with
//! quality = 90                # JPEG/WebP quality (10-100)
//!
//! [limits]
//! max_file_size = 52428800    # Largest accepted source file, in bytes
//!
//! [svg]
//! fallback_width = 800        # Raster size for SVGs with no intrinsic size
//! fallback_height = 600
//!
//! [progress]
//! completion_delay_ms = 0     # Pause after reaching 100%
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::formats::TargetFormat;
use crate::imaging::{Quality, SvgFallback};
use crate::session::SessionDefaults;
use crate::validation::{FormatValidator, MAX_FILE_SIZE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Converter configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// Session defaults, restored on reset.
    pub defaults: DefaultsConfig,
    /// Admission limits.
    pub limits: LimitsConfig,
    /// SVG rasterization.
    pub svg: SvgConfig,
    /// Progress reporting.
    pub progress: ProgressConfig,
}

impl ConverterConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(Quality::MIN..=Quality::MAX).contains(&self.defaults.quality) {
            return Err(ConfigError::Validation(format!(
                "defaults.quality must be {}-{}",
                Quality::MIN,
                Quality::MAX
            )));
        }
        if self.limits.max_file_size == 0 {
            return Err(ConfigError::Validation(
                "limits.max_file_size must be non-zero".into(),
            ));
        }
        if self.svg.fallback_width == 0 || self.svg.fallback_height == 0 {
            return Err(ConfigError::Validation(
                "svg fallback dimensions must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub fn session_defaults(&self) -> SessionDefaults {
        SessionDefaults {
            target: self.defaults.format,
            quality: Quality::new(self.defaults.quality),
        }
    }

    pub fn validator(&self) -> FormatValidator {
        FormatValidator::new(self.limits.max_file_size)
    }

    pub fn svg_fallback(&self) -> SvgFallback {
        SvgFallback {
            width: self.svg.fallback_width,
            height: self.svg.fallback_height,
        }
    }

    pub fn completion_delay(&self) -> Duration {
        Duration::from_millis(self.progress.completion_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Target format selected when a session starts or resets.
    pub format: TargetFormat,
    /// Quality for lossy targets (10 = smallest, 100 = best).
    pub quality: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            format: TargetFormat::Png,
            quality: Quality::default().value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Largest accepted source file in bytes.
    pub max_file_size: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
        }
    }
}

/// Raster size for SVGs that declare neither width/height nor a viewBox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SvgConfig {
    pub fallback_width: u32,
    pub fallback_height: u32,
}

impl Default for SvgConfig {
    fn default() -> Self {
        let fallback = SvgFallback::default();
        Self {
            fallback_width: fallback.width,
            fallback_height: fallback.height,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProgressConfig {
    /// Pause after the final milestone, in milliseconds. Zero disables it.
    pub completion_delay_ms: u64,
}

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ConverterConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ConverterConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ConverterConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config: stock defaults, overridden by `path` if given.
///
/// An explicitly named file that does not exist is an error.
pub fn load_config(path: Option<&Path>) -> Result<ConverterConfig, ConfigError> {
    let overlay = path.map(load_raw_config).transpose()?;
    if let Some(path) = path {
        tracing::debug!(path = %path.display(), "loaded config file");
    }
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgshift Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Pass the file with `imgshift --config <path> ...`.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Session defaults (restored on reset)
# ---------------------------------------------------------------------------
[defaults]
# Target format: "png", "jpeg", "webp", "gif" or "bmp".
format = "png"

# Quality for JPEG and WebP output (10 = smallest, 100 = best).
# Ignored for PNG, GIF and BMP.
quality = 90

# ---------------------------------------------------------------------------
# Admission limits
# ---------------------------------------------------------------------------
[limits]
# Largest accepted source file, in bytes (50 MiB).
max_file_size = 52428800

# ---------------------------------------------------------------------------
# SVG rasterization
# ---------------------------------------------------------------------------
[svg]
# Raster size used when an SVG declares no width/height and no viewBox.
fallback_width = 800
fallback_height = 600

# ---------------------------------------------------------------------------
# Progress reporting
# ---------------------------------------------------------------------------
[progress]
# Pause after reaching 100%, in milliseconds, so fast conversions stay
# visible. 0 disables the pause.
completion_delay_ms = 0
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = ConverterConfig::default();
        assert_eq!(config.defaults.format, TargetFormat::Png);
        assert_eq!(config.defaults.quality, 90);
        assert_eq!(config.limits.max_file_size, 52_428_800);
        assert_eq!(config.svg.fallback_width, 800);
        assert_eq!(config.svg.fallback_height, 600);
        assert_eq!(config.progress.completion_delay_ms, 0);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[defaults]
format = "webp"
"#;
        let config: ConverterConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.defaults.format, TargetFormat::WebP);
        // Default values preserved
        assert_eq!(config.defaults.quality, 90);
        assert_eq!(config.svg.fallback_width, 800);
    }

    #[test]
    fn jpg_alias_is_accepted() {
        let config: ConverterConfig = toml::from_str("[defaults]\nformat = \"jpg\"").unwrap();
        assert_eq!(config.defaults.format, TargetFormat::Jpeg);
    }

    #[test]
    fn derived_settings() {
        let mut config = ConverterConfig::default();
        config.defaults.quality = 75;
        config.svg.fallback_width = 320;
        config.progress.completion_delay_ms = 250;

        assert_eq!(config.session_defaults().quality.value(), 75);
        assert_eq!(config.session_defaults().target, TargetFormat::Png);
        assert_eq!(config.svg_fallback().width, 320);
        assert_eq!(config.svg_fallback().height, 600);
        assert_eq!(config.completion_delay(), Duration::from_millis(250));
        assert_eq!(config.validator().max_file_size(), MAX_FILE_SIZE);
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_without_path_is_stock() {
        let config = load_config(None).unwrap();
        assert_eq!(config, ConverterConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("imgshift.toml");
        fs::write(
            &path,
            r#"
[defaults]
quality = 60

[limits]
max_file_size = 1024
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.defaults.quality, 60);
        assert_eq!(config.limits.max_file_size, 1024);
        // Unspecified values should be defaults
        assert_eq!(config.defaults.format, TargetFormat::Png);
        assert_eq!(config.svg.fallback_height, 600);
    }

    #[test]
    fn load_config_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(&tmp.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();

        let result = load_config(Some(&path));
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("typo.toml");
        fs::write(&path, "[defaults]\nqualty = 50\n").unwrap();

        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn unknown_format_is_rejected() {
        let result: Result<ConverterConfig, _> = toml::from_str("[defaults]\nformat = \"avif\"");
        assert!(result.is_err());
    }

    // =========================================================================
    // validate tests
    // =========================================================================

    #[test]
    fn validate_quality_range() {
        let mut config = ConverterConfig::default();
        config.defaults.quality = 5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(ref m)) if m.contains("defaults.quality")
        ));
        config.defaults.quality = 101;
        assert!(config.validate().is_err());
        config.defaults.quality = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_zero_limit() {
        let mut config = ConverterConfig::default();
        config.limits.max_file_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_zero_svg_fallback() {
        let mut config = ConverterConfig::default();
        config.svg.fallback_height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn resolve_config_validates_after_merge() {
        let overlay: toml::Value = toml::from_str("[defaults]\nquality = 0").unwrap();
        let result = resolve_config(stock_defaults_value(), Some(overlay));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_overrides_leaf_and_keeps_siblings() {
        let base: toml::Value =
            toml::from_str("[svg]\nfallback_width = 800\nfallback_height = 600").unwrap();
        let overlay: toml::Value = toml::from_str("[svg]\nfallback_width = 1024").unwrap();

        let merged = merge_toml(base, overlay);
        assert_eq!(merged["svg"]["fallback_width"].as_integer(), Some(1024));
        assert_eq!(merged["svg"]["fallback_height"].as_integer(), Some(600));
    }

    #[test]
    fn merge_adds_new_tables() {
        let base: toml::Value = toml::from_str("[a]\nx = 1").unwrap();
        let overlay: toml::Value = toml::from_str("[b]\ny = 2").unwrap();

        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["b"]["y"].as_integer(), Some(2));
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_matches_defaults() {
        let parsed: ConverterConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(parsed, ConverterConfig::default());
    }

    #[test]
    fn stock_config_toml_is_commented() {
        let content = stock_config_toml();
        assert!(content.contains("# imgshift Configuration"));
        assert!(content.contains("[progress]"));
    }
}
