//! HourMeter Evaluator
//!
//! Three independent passes, run in this order:
//!
//! 1. **Deviation** - per-asset hour-meter intervals from fuel events:
//!    negative interval (critical), interval beyond a day (warning), or an
//!    interval far from the asset average (info).
//! 2. **Data quality** - upstream-classified hour-meter records: error and
//!    warning counts per asset, plus a worked-hours spike check.
//! 3. **Zero readings** - persisted rows with both readings at zero.

use indexmap::IndexMap;
use tracing::debug;

use super::{average_and_last, EvaluationContext, Evaluator};
use crate::aggregation::{mean, relative_deviation};
use crate::types::{
    Alert, AlertCategory, AlertSeverity, HourMeterRecord, HourMeterStatus, PersistedHourMeterRow,
};

/// HourMeter Evaluator runs the deviation, data-quality and zero-reading passes
pub struct HourMeterEvaluator;

impl Evaluator for HourMeterEvaluator {
    fn name(&self) -> &str {
        "HourMeter"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Vec<Alert> {
        let mut alerts = deviation_pass(ctx);
        alerts.extend(data_quality_pass(&ctx.snapshot.hour_meter_records, ctx));
        alerts.extend(zero_reading_pass(&ctx.snapshot.persisted_hour_meter_rows, ctx));
        alerts
    }
}

// ============================================================================
// Deviation pass
// ============================================================================

fn deviation_pass(ctx: &EvaluationContext<'_>) -> Vec<Alert> {
    let t = &ctx.config.hour_meter;
    let mut alerts = Vec::new();

    for stats in ctx.statistics.values() {
        let Some((avg, last)) = average_and_last(&stats.hour_meter_deltas, t.min_deltas) else {
            continue;
        };
        let asset = stats.asset_id.as_str();

        // A negative interval means the meter went backwards; nothing else
        // about this asset's intervals is trustworthy.
        if last < 0.0 {
            alerts.push(
                Alert::new(
                    format!("horimetro-negative-{asset}"),
                    AlertCategory::HourMeter,
                    AlertSeverity::Critical,
                    format!("Horímetro negativo: {asset}"),
                    format!(
                        "Última leitura do horímetro regrediu {:.1} h (média {avg:.1} h por intervalo)",
                        last.abs()
                    ),
                    ctx.evaluated_at,
                )
                .with_asset(asset)
                .with_value(last),
            );
            continue;
        }

        if last > t.daily_ceiling_hours {
            alerts.push(
                Alert::new(
                    format!("horimetro-excessive-{asset}"),
                    AlertCategory::HourMeter,
                    AlertSeverity::Warning,
                    format!("Horímetro excessivo: {asset}"),
                    format!(
                        "Intervalo de {last:.1} h excede o limite diário de {:.0} h",
                        t.daily_ceiling_hours
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
        if deviation > t.deviation_ratio {
            let direction = if last > avg { "acima" } else { "abaixo" };
            alerts.push(
                Alert::new(
                    format!("horimetro-deviation-{asset}"),
                    AlertCategory::HourMeter,
                    AlertSeverity::Info,
                    format!("Horímetro fora do padrão: {asset}"),
                    format!(
                        "Intervalo de {last:.1} h está {:.0}% {direction} da média de {avg:.1} h",
                        deviation * 100.0
                    ),
                    ctx.evaluated_at,
                )
                .with_asset(asset)
                .with_value(last)
                .with_average(avg, deviation),
            );
        }
    }

    alerts
}

// ============================================================================
// Data-quality pass
// ============================================================================

fn data_quality_pass(records: &[HourMeterRecord], ctx: &EvaluationContext<'_>) -> Vec<Alert> {
    let t = &ctx.config.hour_meter;
    let mut by_asset: IndexMap<&str, Vec<&HourMeterRecord>> = IndexMap::new();
    for record in records {
        let asset = record.asset_id.trim();
        if asset.is_empty() {
            debug!("Skipping hour-meter record without asset id");
            continue;
        }
        by_asset.entry(asset).or_default().push(record);
    }

    let mut alerts = Vec::new();
    for (asset, records) in &by_asset {
        let count_status =
            |status: HourMeterStatus| records.iter().filter(|r| r.status == status).count();

        let errors = count_status(HourMeterStatus::Error);
        if errors > 0 {
            alerts.push(
                Alert::new(
                    format!("horimetro-error-{asset}"),
                    AlertCategory::HourMeter,
                    AlertSeverity::Critical,
                    format!("Erros de horímetro: {asset}"),
                    format!("{errors} registro(s) com horas trabalhadas negativas"),
                    ctx.evaluated_at,
                )
                .with_asset(*asset)
                .with_value(errors as f64),
            );
        }

        let warnings = count_status(HourMeterStatus::Warning);
        if warnings > 0 {
            alerts.push(
                Alert::new(
                    format!("horimetro-warning-{asset}"),
                    AlertCategory::HourMeter,
                    AlertSeverity::Warning,
                    format!("Horas trabalhadas baixas: {asset}"),
                    format!(
                        "{warnings} registro(s) com menos de {:.0} h trabalhadas",
                        HourMeterStatus::LOW_WORKED_HOURS
                    ),
                    ctx.evaluated_at,
                )
                .with_asset(*asset)
                .with_value(warnings as f64),
            );
        }

        let valid: Vec<f64> = records
            .iter()
            .map(|r| r.worked_hours)
            .filter(|w| w.is_finite() && *w >= 0.0)
            .collect();
        if valid.len() < t.spike_min_records {
            continue;
        }
        let (Some(avg), Some(&latest)) = (mean(&valid), valid.last()) else {
            continue;
        };
        if avg > 0.0 && latest > avg * t.spike_ratio {
            let deviation = (latest - avg) / avg;
            alerts.push(
                Alert::new(
                    format!("horimetro-spike-{asset}"),
                    AlertCategory::HourMeter,
                    AlertSeverity::Info,
                    format!("Pico de horas trabalhadas: {asset}"),
                    format!(
                        "Último registro com {latest:.1} h trabalhadas, média de {avg:.1} h"
                    ),
                    ctx.evaluated_at,
                )
                .with_asset(*asset)
                .with_value(latest)
                .with_average(avg, deviation),
            );
        }
    }

    alerts
}

// ============================================================================
// Zero-reading pass
// ============================================================================

fn zero_reading_pass(rows: &[PersistedHourMeterRow], ctx: &EvaluationContext<'_>) -> Vec<Alert> {
    let t = &ctx.config.zero_readings;
    let mut per_asset: IndexMap<&str, usize> = IndexMap::new();
    let mut total = 0usize;

    for row in rows.iter().filter(|r| r.is_zero_reading()) {
        let asset = row.asset_id.trim();
        if asset.is_empty() {
            debug!("Skipping zeroed hour-meter row without asset id");
            continue;
        }
        total += 1;
        *per_asset.entry(asset).or_default() += 1;
    }

    if total == 0 {
        return Vec::new();
    }

    let severity = if total > t.global_critical_count {
        AlertSeverity::Critical
    } else {
        AlertSeverity::Warning
    };
    let mut alerts = vec![Alert::new(
        "horimetro-zeros",
        AlertCategory::HourMeter,
        severity,
        "Leituras de horímetro zeradas",
        format!(
            "{total} registro(s) com horímetro anterior e atual zerados em {} equipamento(s)",
            per_asset.len()
        ),
        ctx.evaluated_at,
    )
    .with_value(total as f64)];

    for (asset, count) in &per_asset {
        if *count >= t.per_asset_min_rows {
            alerts.push(
                Alert::new(
                    format!("horimetro-zero-{asset}"),
                    AlertCategory::HourMeter,
                    AlertSeverity::Warning,
                    format!("Horímetro zerado recorrente: {asset}"),
                    format!("{count} registros com horímetro zerado"),
                    ctx.evaluated_at,
                )
                .with_asset(*asset)
                .with_value(*count as f64),
            );
        }
    }

    alerts
}
