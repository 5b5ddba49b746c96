//! Alert Configuration - every rule threshold as an operator-tunable TOML value
//!
//! Each section implements `Default` with the values the dashboard ships with,
//! so an empty or partial file behaves exactly like no file at all.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Environment variable holding the path of the config file.
pub const CONFIG_ENV_VAR: &str = "FLEET_ALERTS_CONFIG";

/// Config file looked up in the working directory when the env var is unset.
pub const LOCAL_CONFIG_FILE: &str = "alert_config.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for the alert engine.
///
/// Load with `AlertConfig::load()` which searches:
/// 1. `$FLEET_ALERTS_CONFIG`
/// 2. `./alert_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Tank minimums and product-family totals
    #[serde(default)]
    pub stock: StockThresholds,

    /// Per-asset fuel consumption deviation
    #[serde(default)]
    pub consumption: ConsumptionThresholds,

    /// Hour-meter deviation and data-quality rules
    #[serde(default)]
    pub hour_meter: HourMeterThresholds,

    /// Zeroed hour-meter rows
    #[serde(default)]
    pub zero_readings: ZeroReadingThresholds,

    /// Odometer deviation rules
    #[serde(default)]
    pub odometer: OdometerThresholds,
}

impl AlertConfig {
    /// Load configuration using the standard search order, falling back to
    /// defaults when a file is missing or invalid.
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded alert config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load alert config, falling back");
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        // 2. Check ./alert_config.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded alert config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        // 3. Defaults
        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        for w in super::validation::validate_unknown_keys(&contents) {
            warn!("{}", w);
        }

        let config = Self::from_toml_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document without validating it.
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Alert config saved");
        Ok(())
    }

    /// Validate all thresholds for internal consistency.
    ///
    /// Rules:
    /// - Every numeric value must be finite
    /// - Critical-low stock totals must be <= warning-low totals
    /// - Ratios must sit in the range that gives the rule meaning
    /// - Minimum sample counts must be > 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let s = &self.stock;
        Self::check_finite(s.critical_ratio, "stock.critical_ratio", &mut errors);
        if !(s.critical_ratio > 0.0 && s.critical_ratio <= 1.0) {
            errors.push(format!(
                "stock.critical_ratio ({:.2}) must be in (0, 1]",
                s.critical_ratio
            ));
        }
        Self::check_low_escalation(
            s.diesel_critical_low,
            s.diesel_warning_low,
            "stock.diesel",
            &mut errors,
        );
        Self::check_low_escalation(
            s.arla_critical_low,
            s.arla_warning_low,
            "stock.arla",
            &mut errors,
        );
        if s.diesel_keywords.iter().all(|k| k.trim().is_empty()) {
            errors.push("stock.diesel_keywords must contain at least one keyword".to_string());
        }
        if s.arla_keywords.iter().all(|k| k.trim().is_empty()) {
            errors.push("stock.arla_keywords must contain at least one keyword".to_string());
        }

        let c = &self.consumption;
        if c.min_events == 0 {
            errors.push("consumption.min_events must be > 0".to_string());
        }
        Self::check_finite(c.high_ratio, "consumption.high_ratio", &mut errors);
        Self::check_finite(c.low_ratio, "consumption.low_ratio", &mut errors);
        Self::check_finite(c.critical_deviation, "consumption.critical_deviation", &mut errors);
        Self::check_finite(c.low_alert_min_mean, "consumption.low_alert_min_mean", &mut errors);
        if c.high_ratio <= 1.0 {
            errors.push(format!(
                "consumption.high_ratio ({:.2}) must be > 1.0",
                c.high_ratio
            ));
        }
        if !(c.low_ratio > 0.0 && c.low_ratio < 1.0) {
            errors.push(format!(
                "consumption.low_ratio ({:.2}) must be in (0, 1)",
                c.low_ratio
            ));
        }
        if c.critical_deviation <= 0.0 {
            errors.push("consumption.critical_deviation must be > 0".to_string());
        }

        let h = &self.hour_meter;
        if h.min_deltas == 0 {
            errors.push("hour_meter.min_deltas must be > 0".to_string());
        }
        if h.spike_min_records == 0 {
            errors.push("hour_meter.spike_min_records must be > 0".to_string());
        }
        Self::check_finite(h.daily_ceiling_hours, "hour_meter.daily_ceiling_hours", &mut errors);
        Self::check_finite(h.deviation_ratio, "hour_meter.deviation_ratio", &mut errors);
        Self::check_finite(h.spike_ratio, "hour_meter.spike_ratio", &mut errors);
        if h.daily_ceiling_hours <= 0.0 {
            errors.push("hour_meter.daily_ceiling_hours must be > 0".to_string());
        }
        if h.deviation_ratio <= 0.0 {
            errors.push("hour_meter.deviation_ratio must be > 0".to_string());
        }
        if h.spike_ratio <= 1.0 {
            errors.push(format!(
                "hour_meter.spike_ratio ({:.2}) must be > 1.0",
                h.spike_ratio
            ));
        }

        let z = &self.zero_readings;
        if z.per_asset_min_rows == 0 {
            errors.push("zero_readings.per_asset_min_rows must be > 0".to_string());
        }

        let o = &self.odometer;
        if o.min_deltas == 0 {
            errors.push("odometer.min_deltas must be > 0".to_string());
        }
        Self::check_finite(o.deviation_ratio, "odometer.deviation_ratio", &mut errors);
        if o.deviation_ratio <= 0.0 {
            errors.push("odometer.deviation_ratio must be > 0".to_string());
        }

        for w in super::validation::validate_plausibility(self) {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_finite(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() {
            errors.push(format!("{name}: value must be finite (got {value})"));
        }
    }

    /// Low-side thresholds: the critical level sits below the warning level.
    fn check_low_escalation(critical: f64, warning: f64, name: &str, errors: &mut Vec<String>) {
        // NaN/Inf comparisons silently pass, catch them explicitly
        if !warning.is_finite() || !critical.is_finite() {
            errors.push(format!(
                "{name}: values must be finite (got critical_low={critical}, warning_low={warning})"
            ));
            return;
        }
        if critical < 0.0 {
            errors.push(format!("{name}: critical_low ({critical:.1}) must be >= 0"));
        }
        if critical > warning {
            errors.push(format!(
                "{name}: critical_low ({critical:.1}) must be <= warning_low ({warning:.1})"
            ));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({path}): {err}", path = .0.display(), err = .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({path}): {err}", path = .0.display(), err = .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Stock Thresholds
// ============================================================================

/// Stock-level rules.
///
/// Product families are matched by case-insensitive substring on the product
/// name, and their quantities summed across every location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockThresholds {
    /// A snapshot below `critical_ratio × minimum` is critical rather than a warning.
    #[serde(default = "default_stock_critical_ratio")]
    pub critical_ratio: f64,

    /// Fleet-wide diesel total below this is critical (litres).
    #[serde(default = "default_diesel_critical_low")]
    pub diesel_critical_low: f64,

    /// Fleet-wide diesel total below this is a warning (litres).
    #[serde(default = "default_diesel_warning_low")]
    pub diesel_warning_low: f64,

    /// Fleet-wide ARLA 32 total below this is critical (litres).
    #[serde(default = "default_arla_critical_low")]
    pub arla_critical_low: f64,

    /// Fleet-wide ARLA 32 total below this is a warning (litres).
    #[serde(default = "default_arla_warning_low")]
    pub arla_warning_low: f64,

    /// Product name fragments counted into the diesel family.
    #[serde(default = "default_diesel_keywords")]
    pub diesel_keywords: Vec<String>,

    /// Product name fragments counted into the ARLA family.
    #[serde(default = "default_arla_keywords")]
    pub arla_keywords: Vec<String>,
}

fn default_stock_critical_ratio() -> f64 { 0.5 }
fn default_diesel_critical_low() -> f64 { 5000.0 }
fn default_diesel_warning_low() -> f64 { 10000.0 }
fn default_arla_critical_low() -> f64 { 500.0 }
fn default_arla_warning_low() -> f64 { 1000.0 }
fn default_diesel_keywords() -> Vec<String> {
    vec!["diesel".to_string(), "s10".to_string(), "s-10".to_string()]
}
fn default_arla_keywords() -> Vec<String> {
    vec!["arla".to_string()]
}

impl Default for StockThresholds {
    fn default() -> Self {
        Self {
            critical_ratio: default_stock_critical_ratio(),
            diesel_critical_low: default_diesel_critical_low(),
            diesel_warning_low: default_diesel_warning_low(),
            arla_critical_low: default_arla_critical_low(),
            arla_warning_low: default_arla_warning_low(),
            diesel_keywords: default_diesel_keywords(),
            arla_keywords: default_arla_keywords(),
        }
    }
}

// ============================================================================
// Consumption Thresholds
// ============================================================================

/// Per-asset consumption deviation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionThresholds {
    /// Assets with fewer refuellings than this are not evaluated.
    #[serde(default = "default_consumption_min_events")]
    pub min_events: usize,

    /// Last refuelling above `mean × high_ratio` raises an alert.
    #[serde(default = "default_consumption_high_ratio")]
    pub high_ratio: f64,

    /// Last refuelling below `mean × low_ratio` raises an info alert.
    #[serde(default = "default_consumption_low_ratio")]
    pub low_ratio: f64,

    /// High-consumption alerts above this relative deviation are critical.
    #[serde(default = "default_consumption_critical_deviation")]
    pub critical_deviation: f64,

    /// Low-consumption alerts only fire when the mean exceeds this (litres).
    #[serde(default = "default_consumption_low_alert_min_mean")]
    pub low_alert_min_mean: f64,
}

fn default_consumption_min_events() -> usize { 3 }
fn default_consumption_high_ratio() -> f64 { 1.3 }
fn default_consumption_low_ratio() -> f64 { 0.7 }
fn default_consumption_critical_deviation() -> f64 { 0.5 }
fn default_consumption_low_alert_min_mean() -> f64 { 50.0 }

impl Default for ConsumptionThresholds {
    fn default() -> Self {
        Self {
            min_events: default_consumption_min_events(),
            high_ratio: default_consumption_high_ratio(),
            low_ratio: default_consumption_low_ratio(),
            critical_deviation: default_consumption_critical_deviation(),
            low_alert_min_mean: default_consumption_low_alert_min_mean(),
        }
    }
}

// ============================================================================
// Hour-Meter Thresholds
// ============================================================================

/// Hour-meter deviation and data-quality rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourMeterThresholds {
    /// Minimum non-negative deltas before an asset is evaluated.
    #[serde(default = "default_hour_meter_min_deltas")]
    pub min_deltas: usize,

    /// A single interval above this many hours is impossible within a day.
    #[serde(default = "default_daily_ceiling_hours")]
    pub daily_ceiling_hours: f64,

    /// Relative deviation from the asset average that raises an info alert.
    #[serde(default = "default_hour_meter_deviation_ratio")]
    pub deviation_ratio: f64,

    /// Minimum valid records before the worked-hours spike check runs.
    #[serde(default = "default_spike_min_records")]
    pub spike_min_records: usize,

    /// Latest worked hours above `average × spike_ratio` raises an info alert.
    #[serde(default = "default_spike_ratio")]
    pub spike_ratio: f64,
}

fn default_hour_meter_min_deltas() -> usize { 2 }
fn default_daily_ceiling_hours() -> f64 { 24.0 }
fn default_hour_meter_deviation_ratio() -> f64 { 0.4 }
fn default_spike_min_records() -> usize { 3 }
fn default_spike_ratio() -> f64 { 1.5 }

impl Default for HourMeterThresholds {
    fn default() -> Self {
        Self {
            min_deltas: default_hour_meter_min_deltas(),
            daily_ceiling_hours: default_daily_ceiling_hours(),
            deviation_ratio: default_hour_meter_deviation_ratio(),
            spike_min_records: default_spike_min_records(),
            spike_ratio: default_spike_ratio(),
        }
    }
}

// ============================================================================
// Zero-Reading Thresholds
// ============================================================================

/// Rules for persisted hour-meter rows with both readings at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZeroReadingThresholds {
    /// The global alert is critical when the zero-row count exceeds this.
    #[serde(default = "default_zero_global_critical_count")]
    pub global_critical_count: usize,

    /// An asset with at least this many zero rows gets its own alert.
    #[serde(default = "default_zero_per_asset_min_rows")]
    pub per_asset_min_rows: usize,
}

fn default_zero_global_critical_count() -> usize { 10 }
fn default_zero_per_asset_min_rows() -> usize { 3 }

impl Default for ZeroReadingThresholds {
    fn default() -> Self {
        Self {
            global_critical_count: default_zero_global_critical_count(),
            per_asset_min_rows: default_zero_per_asset_min_rows(),
        }
    }
}

// ============================================================================
// Odometer Thresholds
// ============================================================================

/// Odometer deviation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OdometerThresholds {
    #[serde(default = "default_odometer_min_deltas")]
    pub min_deltas: usize,

    #[serde(default = "default_odometer_deviation_ratio")]
    pub deviation_ratio: f64,
}

fn default_odometer_min_deltas() -> usize { 2 }
fn default_odometer_deviation_ratio() -> f64 { 0.5 }

impl Default for OdometerThresholds {
    fn default() -> Self {
        Self {
            min_deltas: default_odometer_min_deltas(),
            deviation_ratio: default_odometer_deviation_ratio(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(AlertConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_toml_equals_defaults() {
        let config = AlertConfig::from_toml_str("").unwrap();
        assert_eq!(config, AlertConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = AlertConfig::from_toml_str(
            r#"
[consumption]
high_ratio = 1.5
"#,
        )
        .unwrap();
        assert_eq!(config.consumption.high_ratio, 1.5);
        assert_eq!(config.consumption.low_ratio, 0.7);
        assert_eq!(config.stock.diesel_critical_low, 5000.0);
    }

    #[test]
    fn test_inverted_stock_levels_rejected() {
        let mut config = AlertConfig::default();
        config.stock.diesel_critical_low = 20000.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("stock.diesel"));
    }

    #[test]
    fn test_validation_collects_every_error() {
        let mut config = AlertConfig::default();
        config.consumption.min_events = 0;
        config.odometer.deviation_ratio = f64::NAN;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("consumption.min_events")));
                assert!(errors.iter().any(|e| e.contains("odometer.deviation_ratio")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_toml_roundtrip_preserves_values() {
        let mut config = AlertConfig::default();
        config.hour_meter.daily_ceiling_hours = 20.0;
        let toml = config.to_toml().unwrap();
        let parsed = AlertConfig::from_toml_str(&toml).unwrap();
        assert_eq!(parsed, config);
    }
}
