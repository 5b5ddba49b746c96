//! Alert Engine - aggregation, rule evaluation and ranking
//!
//! One call to [`AlertEngine::evaluate`] takes a complete snapshot of the
//! fleet's records and returns a fully ranked alert list:
//!
//! 1. Aggregate fuel events per asset (once, shared read-only)
//! 2. Run every evaluator in merge order: Stock, Consumption, HourMeter, Odometer
//! 3. Make alert ids unique within the result
//! 4. Sort by severity (critical, warning, info), then newest evaluation time
//!
//! The engine holds no state between calls. Concurrent calls with different
//! snapshots are independent.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::aggregation::aggregate_by_asset;
use crate::clock::{EvaluationClock, SystemClock};
use crate::config::AlertConfig;
use crate::evaluators::{self, EvaluationContext, Evaluator};
use crate::types::{Alert, AlertSummary, FleetSnapshot};

/// Runs the rule evaluators over fleet snapshots.
pub struct AlertEngine {
    config: AlertConfig,
    evaluators: Vec<Box<dyn Evaluator>>,
    clock: Box<dyn EvaluationClock>,
}

impl AlertEngine {
    /// Engine with the default evaluators and the wall clock.
    pub fn new(config: AlertConfig) -> Self {
        Self {
            config,
            evaluators: evaluators::default_evaluators(),
            clock: Box::new(SystemClock),
        }
    }

    /// Replace the evaluation clock.
    pub fn with_clock(mut self, clock: impl EvaluationClock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replace the evaluator list. Merge order is the order given.
    pub fn with_evaluators(mut self, evaluators: Vec<Box<dyn Evaluator>>) -> Self {
        self.evaluators = evaluators;
        self
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Evaluate one snapshot.
    ///
    /// Never fails: records that cannot be evaluated are skipped. An empty
    /// snapshot yields an empty list. Fuel events must be in chronological
    /// order; the last event per asset is taken as the most recent.
    pub fn evaluate(&self, snapshot: &FleetSnapshot) -> Vec<Alert> {
        run_evaluators(&self.evaluators, snapshot, &self.config, self.clock.as_ref())
    }
}

impl Default for AlertEngine {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}

/// Evaluate a snapshot with the default evaluators, the given thresholds
/// and clock.
pub fn generate_alerts(
    snapshot: &FleetSnapshot,
    config: &AlertConfig,
    clock: &dyn EvaluationClock,
) -> Vec<Alert> {
    run_evaluators(&evaluators::default_evaluators(), snapshot, config, clock)
}

fn run_evaluators(
    evaluators: &[Box<dyn Evaluator>],
    snapshot: &FleetSnapshot,
    config: &AlertConfig,
    clock: &dyn EvaluationClock,
) -> Vec<Alert> {
    let statistics = aggregate_by_asset(&snapshot.fuel_events);
    let ctx = EvaluationContext {
        snapshot,
        statistics: &statistics,
        config,
        evaluated_at: clock.now(),
    };

    let mut alerts = Vec::new();
    for evaluator in evaluators {
        let found = evaluator.evaluate(&ctx);
        debug!(evaluator = evaluator.name(), alerts = found.len(), "Evaluator finished");
        alerts.extend(found);
    }

    ensure_unique_ids(&mut alerts);
    sort_alerts(&mut alerts);

    let summary = AlertSummary::from_alerts(&alerts);
    info!(
        assets = statistics.len(),
        total = summary.total,
        critical = summary.critical,
        warning = summary.warning,
        info = summary.info,
        "Fleet evaluation complete"
    );

    alerts
}

/// Stable sort: severity rank ascending, then timestamp descending. Alerts
/// that tie on both keep their construction order.
pub fn sort_alerts(alerts: &mut [Alert]) {
    alerts.sort_by(|a, b| {
        a.severity
            .rank()
            .cmp(&b.severity.rank())
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    });
}

/// Suffix repeated ids with `-2`, `-3`, ... in construction order, skipping
/// any suffixed id that another alert already carries.
fn ensure_unique_ids(alerts: &mut [Alert]) {
    let mut taken: HashSet<String> = alerts.iter().map(|a| a.id.clone()).collect();
    let mut seen: HashSet<String> = HashSet::new();
    for alert in alerts.iter_mut() {
        if seen.insert(alert.id.clone()) {
            continue;
        }
        let mut n = 2;
        let mut candidate = format!("{}-{n}", alert.id);
        while taken.contains(&candidate) {
            n += 1;
            candidate = format!("{}-{n}", alert.id);
        }
        taken.insert(candidate.clone());
        alert.id = candidate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::types::{
        AlertCategory, AlertSeverity, FuelEvent, PersistedHourMeterRow, StockSnapshot,
    };
    use chrono::Duration;

    fn alert(id: &str, severity: AlertSeverity, secs: i64) -> Alert {
        Alert::new(
            id,
            AlertCategory::Stock,
            severity,
            "t",
            "m",
            FixedClock::from_timestamp(secs).now(),
        )
    }

    #[test]
    fn test_sort_by_severity_then_newest() {
        let mut alerts = vec![
            alert("info-old", AlertSeverity::Info, 100),
            alert("warn-old", AlertSeverity::Warning, 100),
            alert("crit-old", AlertSeverity::Critical, 100),
            alert("warn-new", AlertSeverity::Warning, 200),
        ];
        sort_alerts(&mut alerts);
        let ids: Vec<&str> = alerts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["crit-old", "warn-new", "warn-old", "info-old"]);
    }

    #[test]
    fn test_sort_keeps_construction_order_on_ties() {
        let mut alerts = vec![
            alert("first", AlertSeverity::Warning, 100),
            alert("second", AlertSeverity::Warning, 100),
        ];
        sort_alerts(&mut alerts);
        assert_eq!(alerts[0].id, "first");
    }

    #[test]
    fn test_duplicate_ids_get_suffix() {
        let mut alerts = vec![
            alert("dup", AlertSeverity::Info, 1),
            alert("dup", AlertSeverity::Info, 1),
            alert("other", AlertSeverity::Info, 1),
            alert("dup", AlertSeverity::Info, 1),
        ];
        ensure_unique_ids(&mut alerts);
        let ids: Vec<&str> = alerts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["dup", "dup-2", "other", "dup-3"]);
    }

    #[test]
    fn test_suffix_skips_ids_already_in_use() {
        let mut alerts = vec![
            alert("dup", AlertSeverity::Info, 1),
            alert("dup", AlertSeverity::Info, 1),
            alert("dup-2", AlertSeverity::Info, 1),
            alert("dup", AlertSeverity::Info, 1),
        ];
        ensure_unique_ids(&mut alerts);
        let ids: Vec<&str> = alerts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["dup", "dup-3", "dup-2", "dup-4"]);
    }

    #[test]
    fn test_zero_reading_ids_unique_for_awkward_asset_names() {
        let rows = ["global", "global", "global", "global-2", "global-2", "global-2"]
            .iter()
            .map(|asset| PersistedHourMeterRow {
                asset_id: asset.to_string(),
                ..Default::default()
            })
            .collect();
        let snapshot = FleetSnapshot {
            persisted_hour_meter_rows: rows,
            ..Default::default()
        };
        let alerts = AlertEngine::default()
            .with_clock(FixedClock::from_timestamp(1_000))
            .evaluate(&snapshot);
        let ids: Vec<&str> = alerts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["horimetro-zeros", "horimetro-zero-global", "horimetro-zero-global-2"]
        );
    }

    #[test]
    fn test_alerts_stamped_with_evaluation_time() {
        let clock = FixedClock::from_timestamp(1_750_000_000);
        let engine = AlertEngine::default().with_clock(clock);
        let snapshot = FleetSnapshot {
            stock_snapshots: vec![StockSnapshot {
                product_name: "Diesel S10".to_string(),
                quantity: 4000.0,
                ..Default::default()
            }],
            ..Default::default()
        };
        let alerts = engine.evaluate(&snapshot);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].timestamp, clock.now());
    }

    #[test]
    fn test_later_evaluation_sorts_first_when_merged() {
        let snapshot = FleetSnapshot {
            fuel_events: vec![
                FuelEvent::new("CAM-01", 100.0),
                FuelEvent::new("CAM-01", 100.0),
                FuelEvent::new("CAM-01", 100.0),
                FuelEvent::new("CAM-01", 200.0),
            ],
            ..Default::default()
        };
        let t0 = FixedClock::from_timestamp(1_000);
        let t1 = FixedClock(t0.now() + Duration::minutes(5));
        let config = AlertConfig::default();

        let mut merged = generate_alerts(&snapshot, &config, &t0);
        merged.extend(generate_alerts(&snapshot, &config, &t1));
        sort_alerts(&mut merged);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].timestamp, t1.now());
    }

    #[test]
    fn test_engine_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AlertEngine>();
    }

    #[test]
    fn test_custom_evaluator_list() {
        let engine = AlertEngine::default().with_evaluators(vec![Box::new(
            crate::evaluators::OdometerEvaluator,
        )]);
        let snapshot = FleetSnapshot {
            stock_snapshots: vec![StockSnapshot {
                product_name: "Diesel".to_string(),
                quantity: 10.0,
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(engine.evaluate(&snapshot).is_empty());
    }
}
