//! Fleet Alerts: anomaly detection for construction-site fleet telemetry
//!
//! Turns a snapshot of fuel events, stock levels and hour-meter records into
//! a ranked list of alerts for the logistics dashboard.
//!
//! ## Architecture
//!
//! - **Aggregation**: per-asset totals, fuel history and hour-meter/odometer intervals
//! - **Evaluators**: stock, consumption, hour-meter and odometer rules
//! - **Engine**: runs the evaluators in order, then ranks by severity and recency
//! - **Config**: every rule threshold as an operator-tunable TOML value

pub mod aggregation;
pub mod clock;
pub mod config;
pub mod engine;
pub mod evaluators;
pub mod types;

// Re-export configuration
pub use config::{AlertConfig, ConfigError};

// Re-export commonly used types
pub use types::{
    Alert, AlertCategory, AlertSeverity, AlertSummary, FleetSnapshot, FuelEvent,
    HourMeterRecord, HourMeterStatus, PersistedHourMeterRow, StockSnapshot,
};

// Re-export the engine
pub use aggregation::{aggregate_by_asset, AssetStatistics, FleetStatistics};
pub use clock::{EvaluationClock, FixedClock, SystemClock};
pub use engine::{generate_alerts, sort_alerts, AlertEngine};
