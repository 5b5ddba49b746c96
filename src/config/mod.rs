//! Alert Configuration Module
//!
//! Rule thresholds loaded from TOML, replacing hardcoded cutoffs with
//! operator-tunable values.
//!
//! ## Loading Order
//!
//! 1. `FLEET_ALERTS_CONFIG` environment variable (path to TOML file)
//! 2. `alert_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! The config is an ordinary value handed to the engine, so tests and
//! callers can override any threshold before evaluating:
//!
//! ```ignore
//! let mut config = AlertConfig::load();
//! config.consumption.high_ratio = 1.5;
//! let engine = AlertEngine::new(config);
//! ```

mod alert_config;
pub mod validation;

pub use alert_config::*;
