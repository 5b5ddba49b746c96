//! Input records handed to the engine by the data layer

use serde::{Deserialize, Serialize};

// ============================================================================
// Fuel Events
// ============================================================================

/// One refuelling occurrence, optionally carrying the hour-meter and odometer
/// readings taken at the pump.
///
/// Sequences of events are expected in chronological order; the last event
/// for an asset is treated as its most recent reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FuelEvent {
    pub asset_id: String,
    /// Litres dispensed (>= 0)
    pub fuel_quantity: f64,
    #[serde(default)]
    pub hour_meter_previous: Option<f64>,
    #[serde(default)]
    pub hour_meter_current: Option<f64>,
    #[serde(default)]
    pub odometer_previous: Option<f64>,
    #[serde(default)]
    pub odometer_current: Option<f64>,
}

impl FuelEvent {
    pub fn new(asset_id: impl Into<String>, fuel_quantity: f64) -> Self {
        Self {
            asset_id: asset_id.into(),
            fuel_quantity,
            ..Default::default()
        }
    }

    pub fn with_hour_meter(mut self, previous: f64, current: f64) -> Self {
        self.hour_meter_previous = Some(previous);
        self.hour_meter_current = Some(current);
        self
    }

    pub fn with_odometer(mut self, previous: f64, current: f64) -> Self {
        self.odometer_previous = Some(previous);
        self.odometer_current = Some(current);
        self
    }

    /// Hour-meter delta, if both readings are present and positive.
    pub fn hour_meter_delta(&self) -> Option<f64> {
        positive_pair_delta(self.hour_meter_previous, self.hour_meter_current)
    }

    /// Odometer delta, if both readings are present and positive.
    pub fn odometer_delta(&self) -> Option<f64> {
        positive_pair_delta(self.odometer_previous, self.odometer_current)
    }
}

fn positive_pair_delta(previous: Option<f64>, current: Option<f64>) -> Option<f64> {
    match (previous, current) {
        (Some(prev), Some(curr)) if prev > 0.0 && curr > 0.0 => Some(curr - prev),
        _ => None,
    }
}

// ============================================================================
// Stock
// ============================================================================

/// Stock level of one product at one location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub location: String,
    pub product_name: String,
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub minimum_threshold: f64,
    #[serde(default)]
    pub maximum_threshold: f64,
}

// ============================================================================
// Hour-Meter Records
// ============================================================================

/// Classification assigned upstream to an hour-meter record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum HourMeterStatus {
    Success,
    Warning,
    Error,
}

impl HourMeterStatus {
    /// Worked hours below this are classified as a warning.
    pub const LOW_WORKED_HOURS: f64 = 10.0;

    /// The upstream rule: error if worked < 0, warning if worked < 10, else success.
    pub fn classify(worked_hours: f64) -> Self {
        if worked_hours < 0.0 {
            HourMeterStatus::Error
        } else if worked_hours < Self::LOW_WORKED_HOURS {
            HourMeterStatus::Warning
        } else {
            HourMeterStatus::Success
        }
    }
}

impl std::fmt::Display for HourMeterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HourMeterStatus::Success => write!(f, "success"),
            HourMeterStatus::Warning => write!(f, "warning"),
            HourMeterStatus::Error => write!(f, "error"),
        }
    }
}

/// A pre-classified hour-meter record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourMeterRecord {
    pub asset_id: String,
    pub previous: f64,
    pub current: f64,
    pub worked_hours: f64,
    pub status: HourMeterStatus,
}

impl HourMeterRecord {
    /// Build a record, deriving worked hours and status from the readings.
    pub fn new(asset_id: impl Into<String>, previous: f64, current: f64) -> Self {
        let worked_hours = current - previous;
        Self {
            asset_id: asset_id.into(),
            previous,
            current,
            worked_hours,
            status: HourMeterStatus::classify(worked_hours),
        }
    }
}

/// Hour-meter row as stored by the persistence layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedHourMeterRow {
    pub asset_id: String,
    pub previous_value: f64,
    pub current_value: f64,
}

impl PersistedHourMeterRow {
    pub fn is_zero_reading(&self) -> bool {
        self.previous_value == 0.0 && self.current_value == 0.0
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Everything one evaluation looks at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetSnapshot {
    #[serde(default)]
    pub fuel_events: Vec<FuelEvent>,
    #[serde(default)]
    pub stock_snapshots: Vec<StockSnapshot>,
    #[serde(default)]
    pub hour_meter_records: Vec<HourMeterRecord>,
    #[serde(default)]
    pub persisted_hour_meter_rows: Vec<PersistedHourMeterRow>,
}

impl FleetSnapshot {
    pub fn is_empty(&self) -> bool {
        self.fuel_events.is_empty()
            && self.stock_snapshots.is_empty()
            && self.hour_meter_records.is_empty()
            && self.persisted_hour_meter_rows.is_empty()
    }
}
