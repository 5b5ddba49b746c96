//! Evaluator trait and the rule evaluators run on every evaluation
//!
//! Each evaluator scans the shared, read-only evaluation context for one
//! category of anomaly and returns the alerts it found.
//!
//! ## Evaluators (merge order)
//!
//! 1. **Stock** - tank minimums and fleet-wide diesel/ARLA totals
//! 2. **Consumption** - last refuelling against the asset mean
//! 3. **HourMeter** - interval deviation, record data quality, zeroed readings
//! 4. **Odometer** - interval deviation

pub mod stock;
pub mod consumption;
pub mod hour_meter;
pub mod odometer;

pub use stock::StockEvaluator;
pub use consumption::ConsumptionEvaluator;
pub use hour_meter::HourMeterEvaluator;
pub use odometer::OdometerEvaluator;

use chrono::{DateTime, Utc};

use crate::aggregation::FleetStatistics;
use crate::config::AlertConfig;
use crate::types::{Alert, FleetSnapshot};

/// Everything an evaluator may read. Nothing in here is mutated while the
/// evaluators run.
pub struct EvaluationContext<'a> {
    pub snapshot: &'a FleetSnapshot,
    pub statistics: &'a FleetStatistics,
    pub config: &'a AlertConfig,
    /// Stamped on every alert produced by this evaluation
    pub evaluated_at: DateTime<Utc>,
}

/// Trait for rule evaluators
pub trait Evaluator: Send + Sync {
    /// Evaluator name (e.g., "Stock", "Consumption")
    fn name(&self) -> &str;

    /// Scan the context and return alerts in construction order
    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Vec<Alert>;
}

/// Create the default evaluators, in merge order
pub fn default_evaluators() -> Vec<Box<dyn Evaluator>> {
    vec![
        Box::new(StockEvaluator),
        Box::new(ConsumptionEvaluator),
        Box::new(HourMeterEvaluator),
        Box::new(OdometerEvaluator),
    ]
}

/// Split `deltas` into the average of its non-negative values and its last
/// value. `None` when fewer than `min_valid` deltas are non-negative.
pub(crate) fn average_and_last(deltas: &[f64], min_valid: usize) -> Option<(f64, f64)> {
    let valid: Vec<f64> = deltas.iter().copied().filter(|d| *d >= 0.0).collect();
    if valid.len() < min_valid {
        return None;
    }
    let avg = crate::aggregation::mean(&valid)?;
    let last = *deltas.last()?;
    Some((avg, last))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_evaluator_order() {
        let names: Vec<String> = default_evaluators()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, vec!["Stock", "Consumption", "HourMeter", "Odometer"]);
    }

    #[test]
    fn test_average_and_last_ignores_negative_in_average() {
        let (avg, last) = average_and_last(&[8.0, 9.0, 8.0, -3.0], 2).unwrap();
        assert!((avg - 25.0 / 3.0).abs() < 1e-9);
        assert_eq!(last, -3.0);
    }

    #[test]
    fn test_average_and_last_requires_min_valid() {
        assert!(average_and_last(&[8.0, -3.0], 2).is_none());
        assert!(average_and_last(&[], 2).is_none());
    }
}
