//! Per-asset aggregation of fuel events
//!
//! Groups the fuel event stream by asset and derives the totals and ordered
//! histories the evaluators read. Grouping keeps first-seen asset order and
//! per-asset event order, so the last element of every history is the most
//! recent reading for that asset.
//!
//! Precondition: events arrive in chronological order. Nothing here re-sorts
//! by date.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::debug;

use crate::types::FuelEvent;

/// Derived statistics for one asset, valid for a single evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetStatistics {
    pub asset_id: String,
    pub total_fuel: f64,
    pub event_count: usize,
    /// Zero until the asset has at least one event
    pub mean_fuel_per_event: f64,
    /// Fuel quantity of every event, in input order
    pub fuel_history: Vec<f64>,
    /// current - previous hour-meter, only where both readings were > 0
    pub hour_meter_deltas: Vec<f64>,
    /// current - previous odometer, only where both readings were > 0
    pub odometer_deltas: Vec<f64>,
}

impl AssetStatistics {
    fn new(asset_id: &str) -> Self {
        Self {
            asset_id: asset_id.to_string(),
            ..Default::default()
        }
    }

    /// Most recent fuel quantity.
    pub fn last_fuel(&self) -> Option<f64> {
        self.fuel_history.last().copied()
    }
}

/// Asset id → statistics, in first-seen order.
pub type FleetStatistics = IndexMap<String, AssetStatistics>;

/// Aggregate fuel events per asset.
///
/// Events with a blank asset id or a quantity that is negative or not a
/// finite number are skipped entirely.
pub fn aggregate_by_asset(events: &[FuelEvent]) -> FleetStatistics {
    let mut stats = FleetStatistics::new();

    for event in events {
        let asset_id = event.asset_id.trim();
        if asset_id.is_empty() {
            debug!("Skipping fuel event without asset id");
            continue;
        }
        if !event.fuel_quantity.is_finite() || event.fuel_quantity < 0.0 {
            debug!(asset = %asset_id, quantity = event.fuel_quantity, "Skipping fuel event with invalid quantity");
            continue;
        }

        let entry = stats
            .entry(asset_id.to_string())
            .or_insert_with(|| AssetStatistics::new(asset_id));

        entry.event_count += 1;
        entry.total_fuel += event.fuel_quantity;
        entry.fuel_history.push(event.fuel_quantity);

        if let Some(delta) = event.hour_meter_delta().filter(|d| d.is_finite()) {
            entry.hour_meter_deltas.push(delta);
        }
        if let Some(delta) = event.odometer_delta().filter(|d| d.is_finite()) {
            entry.odometer_deltas.push(delta);
        }
    }

    for entry in stats.values_mut() {
        if entry.event_count > 0 {
            entry.mean_fuel_per_event = entry.total_fuel / entry.event_count as f64;
        }
    }

    stats
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let m = values.mean();
    m.is_finite().then_some(m)
}

/// Relative deviation of `value` from `average`, `None` when the average is
/// not positive.
pub fn relative_deviation(value: f64, average: f64) -> Option<f64> {
    (average > 0.0).then(|| (value - average).abs() / average)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_in_first_seen_order() {
        let events = vec![
            FuelEvent::new("ESC-02", 80.0),
            FuelEvent::new("CAM-01", 100.0),
            FuelEvent::new("ESC-02", 120.0),
        ];
        let stats = aggregate_by_asset(&events);
        let ids: Vec<&str> = stats.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["ESC-02", "CAM-01"]);

        let esc = &stats["ESC-02"];
        assert_eq!(esc.event_count, 2);
        assert_eq!(esc.total_fuel, 200.0);
        assert_eq!(esc.mean_fuel_per_event, 100.0);
        assert_eq!(esc.fuel_history, vec![80.0, 120.0]);
        assert_eq!(esc.last_fuel(), Some(120.0));
    }

    #[test]
    fn test_skips_blank_asset_and_invalid_quantity() {
        let events = vec![
            FuelEvent::new("", 50.0),
            FuelEvent::new("   ", 50.0),
            FuelEvent::new("CAM-01", f64::NAN),
            FuelEvent::new("CAM-01", -10.0),
            FuelEvent::new("CAM-01", 40.0),
        ];
        let stats = aggregate_by_asset(&events);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats["CAM-01"].event_count, 1);
    }

    #[test]
    fn test_deltas_only_from_positive_pairs() {
        let events = vec![
            FuelEvent::new("ESC-01", 60.0).with_hour_meter(1000.0, 1008.0),
            FuelEvent::new("ESC-01", 60.0).with_hour_meter(0.0, 1016.0),
            FuelEvent::new("ESC-01", 60.0),
            FuelEvent::new("ESC-01", 60.0)
                .with_hour_meter(1016.0, 1013.0)
                .with_odometer(52000.0, 52150.0),
        ];
        let stats = aggregate_by_asset(&events);
        let esc = &stats["ESC-01"];
        assert_eq!(esc.hour_meter_deltas, vec![8.0, -3.0]);
        assert_eq!(esc.odometer_deltas, vec![150.0]);
        assert_eq!(esc.event_count, 4);
    }

    #[test]
    fn test_trims_asset_ids() {
        let events = vec![FuelEvent::new(" CAM-01 ", 10.0), FuelEvent::new("CAM-01", 30.0)];
        let stats = aggregate_by_asset(&events);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats["CAM-01"].asset_id, "CAM-01");
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_by_asset(&[]).is_empty());
    }

    #[test]
    fn test_mean_and_deviation_guards() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[8.0, 9.0, 10.0]), Some(9.0));
        assert_eq!(relative_deviation(10.0, 0.0), None);
        assert_eq!(relative_deviation(150.0, 100.0), Some(0.5));
    }
}
