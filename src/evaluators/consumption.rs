//! Consumption Evaluator
//!
//! Compares each asset's most recent refuelling with its own mean. A high
//! reading and a low reading are mutually exclusive for one asset.

use super::{EvaluationContext, Evaluator};
use crate::aggregation::{relative_deviation, AssetStatistics};
use crate::config::ConsumptionThresholds;
use crate::types::{Alert, AlertCategory, AlertSeverity};
use chrono::{DateTime, Utc};

/// Consumption Evaluator flags refuellings far from the asset average
pub struct ConsumptionEvaluator;

impl Evaluator for ConsumptionEvaluator {
    fn name(&self) -> &str {
        "Consumption"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Vec<Alert> {
        ctx.statistics
            .values()
            .filter_map(|stats| check_asset(stats, &ctx.config.consumption, ctx.evaluated_at))
            .collect()
    }
}

fn check_asset(
    stats: &AssetStatistics,
    t: &ConsumptionThresholds,
    evaluated_at: DateTime<Utc>,
) -> Option<Alert> {
    if stats.event_count < t.min_events {
        return None;
    }
    let last = stats.last_fuel()?;
    let mean = stats.mean_fuel_per_event;
    let deviation = relative_deviation(last, mean)?;
    let asset = &stats.asset_id;

    let alert = if last > mean * t.high_ratio {
        let severity = if deviation > t.critical_deviation {
            AlertSeverity::Critical
        } else {
            AlertSeverity::Warning
        };
        Alert::new(
            format!("consumo-high-{asset}"),
            AlertCategory::Consumption,
            severity,
            format!("Consumo elevado: {asset}"),
            format!(
                "Último abastecimento de {last:.1} L está {:.0}% acima da média de {mean:.1} L",
                deviation * 100.0
            ),
            evaluated_at,
        )
    } else if last < mean * t.low_ratio && mean > t.low_alert_min_mean {
        Alert::new(
            format!("consumo-low-{asset}"),
            AlertCategory::Consumption,
            AlertSeverity::Info,
            format!("Consumo abaixo do normal: {asset}"),
            format!(
                "Último abastecimento de {last:.1} L está {:.0}% abaixo da média de {mean:.1} L",
                deviation * 100.0
            ),
            evaluated_at,
        )
    } else {
        return None;
    };

    Some(
        alert
            .with_asset(asset.as_str())
            .with_value(last)
            .with_average(mean, deviation),
    )
}
