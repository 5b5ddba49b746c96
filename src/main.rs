//! fleet-alerts - evaluate a fleet snapshot and print the ranked alerts
//!
//! # Usage
//!
//! ```bash
//! # Evaluate a snapshot exported by the data layer
//! fleet-alerts --input snapshot.json --pretty
//!
//! # Reproducible output with a frozen evaluation time
//! fleet-alerts --input snapshot.json --now 2024-03-01T06:00:00Z
//!
//! # Show the effective thresholds
//! fleet-alerts --print-config
//! ```
//!
//! # Environment Variables
//!
//! - `FLEET_ALERTS_CONFIG`: Path to the threshold TOML file
//! - `RUST_LOG`: Logging level (default: info)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use tracing::info;

use fleet_alerts::{AlertConfig, AlertEngine, AlertSummary, FixedClock, FleetSnapshot};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "fleet-alerts")]
#[command(about = "Fleet telemetry anomaly detection for construction-site logistics")]
#[command(version)]
struct CliArgs {
    /// JSON snapshot with fuel_events, stock_snapshots, hour_meter_records
    /// and persisted_hour_meter_rows
    #[arg(short, long, required_unless_present = "print_config")]
    input: Option<PathBuf>,

    /// Threshold TOML file (default: $FLEET_ALERTS_CONFIG, then ./alert_config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Freeze the evaluation time (RFC 3339), for reproducible output
    #[arg(long, value_name = "RFC3339")]
    now: Option<DateTime<Utc>>,

    /// Indent the JSON output
    #[arg(long)]
    pretty: bool,

    /// Print alert counts instead of the alert list
    #[arg(long)]
    summary: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn load_config(path: Option<&Path>) -> Result<AlertConfig> {
    match path {
        Some(p) => AlertConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config from {}", p.display())),
        None => Ok(AlertConfig::load()),
    }
}

fn load_snapshot(path: &Path) -> Result<FleetSnapshot> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.context("Failed to serialize output")
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let config = load_config(args.config.as_deref())?;

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let Some(input) = args.input.as_deref() else {
        anyhow::bail!("--input is required");
    };
    let snapshot = load_snapshot(input)?;
    info!(
        fuel_events = snapshot.fuel_events.len(),
        stock_snapshots = snapshot.stock_snapshots.len(),
        hour_meter_records = snapshot.hour_meter_records.len(),
        persisted_rows = snapshot.persisted_hour_meter_rows.len(),
        "Loaded snapshot from {}",
        input.display()
    );

    let mut engine = AlertEngine::new(config);
    if let Some(now) = args.now {
        engine = engine.with_clock(FixedClock(now));
    }
    let alerts = engine.evaluate(&snapshot);

    if args.summary {
        let summary = AlertSummary::from_alerts(&alerts);
        info!("{}", summary);
        println!("{}", to_json(&summary, args.pretty)?);
    } else {
        println!("{}", to_json(&alerts, args.pretty)?);
    }

    Ok(())
}
