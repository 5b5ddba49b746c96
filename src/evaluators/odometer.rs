//! Odometer Evaluator
//!
//! Same interval logic as the hour-meter deviation pass, without a daily
//! ceiling. Increases are warnings, decreases are informational.

use super::{average_and_last, EvaluationContext, Evaluator};
use crate::aggregation::relative_deviation;
use crate::types::{Alert, AlertCategory, AlertSeverity};

/// Odometer Evaluator flags regressions and unusual distances per asset
pub struct OdometerEvaluator;

impl Evaluator for OdometerEvaluator {
    fn name(&self) -> &str {
        "Odometer"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Vec<Alert> {
        let t = &ctx.config.odometer;
        let mut alerts = Vec::new();

        for stats in ctx.statistics.values() {
            let Some((avg, last)) = average_and_last(&stats.odometer_deltas, t.min_deltas) else {
                continue;
            };
            let asset = stats.asset_id.as_str();

            if last < 0.0 {
                alerts.push(
                    Alert::new(
                        format!("km-negative-{asset}"),
                        AlertCategory::Odometer,
                        AlertSeverity::Critical,
                        format!("Odômetro negativo: {asset}"),
                        format!(
                            "Última leitura do odômetro regrediu {:.0} km (média {avg:.0} km por intervalo)",
                            last.abs()
                        ),
                        ctx.evaluated_at,
                    )
                    .with_asset(asset)
                    .with_value(last),
                );
                continue;
            }

            let Some(deviation) = relative_deviation(last, avg) else {
                continue;
            };
            if deviation <= t.deviation_ratio {
                continue;
            }

            let alert = if last > avg {
                Alert::new(
                    format!("km-increase-{asset}"),
                    AlertCategory::Odometer,
                    AlertSeverity::Warning,
                    format!("Quilometragem acima do padrão: {asset}"),
                    format!(
                        "Intervalo de {last:.0} km está {:.0}% acima da média de {avg:.0} km",
                        deviation * 100.0
                    ),
                    ctx.evaluated_at,
                )
            } else {
                Alert::new(
                    format!("km-decrease-{asset}"),
                    AlertCategory::Odometer,
                    AlertSeverity::Info,
                    format!("Quilometragem abaixo do padrão: {asset}"),
                    format!(
                        "Intervalo de {last:.0} km está {:.0}% abaixo da média de {avg:.0} km",
                        deviation * 100.0
                    ),
                    ctx.evaluated_at,
                )
            };
            alerts.push(
                alert
                    .with_asset(asset)
                    .with_value(last)
                    .with_average(avg, deviation),
            );
        }

        alerts
    }
}
