//! Stock Evaluator
//!
//! Two independent checks: each snapshot against its own minimum, then the
//! fleet-wide diesel and ARLA totals against fixed low-water marks.

use super::{EvaluationContext, Evaluator};
use crate::config::StockThresholds;
use crate::types::{Alert, AlertCategory, AlertSeverity, StockSnapshot};
use tracing::debug;

/// Product family summed across every location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProductFamily {
    Diesel,
    Arla,
}

impl ProductFamily {
    fn slug(&self) -> &'static str {
        match self {
            ProductFamily::Diesel => "diesel",
            ProductFamily::Arla => "arla",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ProductFamily::Diesel => "Diesel",
            ProductFamily::Arla => "ARLA 32",
        }
    }

    fn keywords<'a>(&self, t: &'a StockThresholds) -> &'a [String] {
        match self {
            ProductFamily::Diesel => &t.diesel_keywords,
            ProductFamily::Arla => &t.arla_keywords,
        }
    }

    /// (critical_low, warning_low)
    fn levels(&self, t: &StockThresholds) -> (f64, f64) {
        match self {
            ProductFamily::Diesel => (t.diesel_critical_low, t.diesel_warning_low),
            ProductFamily::Arla => (t.arla_critical_low, t.arla_warning_low),
        }
    }

    fn matches(&self, product_name: &str, t: &StockThresholds) -> bool {
        let name = product_name.to_lowercase();
        self.keywords(t)
            .iter()
            .map(|k| k.trim().to_lowercase())
            .any(|k| !k.is_empty() && name.contains(&k))
    }
}

/// Stock Evaluator checks tank minimums and product-family totals
pub struct StockEvaluator;

impl Evaluator for StockEvaluator {
    fn name(&self) -> &str {
        "Stock"
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Vec<Alert> {
        let snapshots = &ctx.snapshot.stock_snapshots;
        let mut alerts = below_minimum_alerts(snapshots, ctx);

        for family in [ProductFamily::Diesel, ProductFamily::Arla] {
            alerts.extend(family_total_alert(family, snapshots, ctx));
        }

        alerts
    }
}

fn below_minimum_alerts(snapshots: &[StockSnapshot], ctx: &EvaluationContext<'_>) -> Vec<Alert> {
    let ratio = ctx.config.stock.critical_ratio;
    let mut alerts = Vec::new();

    for (index, snapshot) in snapshots.iter().enumerate() {
        let minimum = snapshot.minimum_threshold;
        if !snapshot.quantity.is_finite() || !minimum.is_finite() {
            debug!(location = %snapshot.location, product = %snapshot.product_name, "Skipping stock snapshot with non-numeric values");
            continue;
        }
        if minimum <= 0.0 || snapshot.quantity >= minimum {
            continue;
        }

        let severity = if snapshot.quantity < minimum * ratio {
            AlertSeverity::Critical
        } else {
            AlertSeverity::Warning
        };
        let product = display_or(&snapshot.product_name, "Produto");
        let location = display_or(&snapshot.location, "local não informado");

        alerts.push(
            Alert::new(
                format!("stock-low-{index}-{}", slugify(&snapshot.product_name)),
                AlertCategory::Stock,
                severity,
                format!("Estoque baixo: {product}"),
                format!(
                    "{product} em {location}: {:.0} {unit} (mínimo {:.0} {unit})",
                    snapshot.quantity,
                    minimum,
                    unit = snapshot.unit
                ),
                ctx.evaluated_at,
            )
            .with_value(snapshot.quantity),
        );
    }

    alerts
}

fn family_total_alert(
    family: ProductFamily,
    snapshots: &[StockSnapshot],
    ctx: &EvaluationContext<'_>,
) -> Option<Alert> {
    let thresholds = &ctx.config.stock;
    let quantities: Vec<f64> = snapshots
        .iter()
        .filter(|s| s.quantity.is_finite())
        .filter(|s| family.matches(&s.product_name, thresholds))
        .map(|s| s.quantity)
        .collect();
    // A family with no tanks in the snapshot is not evaluated.
    if quantities.is_empty() {
        return None;
    }
    let total: f64 = quantities.iter().sum();

    let (critical_low, warning_low) = family.levels(thresholds);
    let (severity, level, title) = if total < critical_low {
        (AlertSeverity::Critical, "critical", "crítico")
    } else if total < warning_low {
        (AlertSeverity::Warning, "warning", "baixo")
    } else {
        return None;
    };

    Some(
        Alert::new(
            format!("stock-{}-{level}", family.slug()),
            AlertCategory::Stock,
            severity,
            format!("Estoque de {} {title}", family.label()),
            format!(
                "Total de {} em todos os locais: {:.0} L (limite {:.0} L)",
                family.label(),
                total,
                if severity == AlertSeverity::Critical { critical_low } else { warning_low }
            ),
            ctx.evaluated_at,
        )
        .with_value(total),
    )
}

fn display_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback
    } else {
        trimmed
    }
}

/// Lowercase ASCII slug for alert ids.
fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for c in value.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "produto".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluators::test_support::{run, run_with};
    use crate::config::AlertConfig;
    use crate::types::FleetSnapshot;

    fn snapshot(product: &str, quantity: f64, minimum: f64) -> StockSnapshot {
        StockSnapshot {
            location: "Canteiro Norte".to_string(),
            product_name: product.to_string(),
            quantity,
            unit: "L".to_string(),
            minimum_threshold: minimum,
            maximum_threshold: minimum * 4.0,
        }
    }

    fn stock_only(snapshots: Vec<StockSnapshot>) -> FleetSnapshot {
        FleetSnapshot {
            stock_snapshots: snapshots,
            ..Default::default()
        }
    }

    #[test]
    fn test_diesel_total_below_critical() {
        let alerts = run(&StockEvaluator, &stock_only(vec![snapshot("Diesel S10", 4000.0, 0.0)]));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, "stock-diesel-critical");
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(alerts[0].value, Some(4000.0));
    }

    #[test]
    fn test_family_emits_single_alert_from_first_threshold() {
        let alerts = run(
            &StockEvaluator,
            &stock_only(vec![
                snapshot("Óleo Diesel", 3000.0, 0.0),
                snapshot("S-10 Aditivado", 4000.0, 0.0),
                snapshot("ARLA 32", 5000.0, 0.0),
            ]),
        );
        // diesel total 7000 -> warning only; arla total 5000 -> no alert
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, "stock-diesel-warning");
        assert_eq!(alerts[0].severity, AlertSeverity::Warning);
    }

    #[test]
    fn test_minimum_check_severity_boundary() {
        let snapshots = vec![
            snapshot("Graxa", 49.0, 100.0),
            snapshot("Óleo Hidráulico", 50.0, 100.0),
            snapshot("Óleo Motor", 100.0, 100.0),
            snapshot("Fluido de Freio", 5.0, 0.0),
            snapshot("Diesel", 20000.0, 1000.0),
            snapshot("ARLA", 2000.0, 100.0),
        ];
        let alerts = run(&StockEvaluator, &stock_only(snapshots));
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].id, "stock-low-0-graxa");
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(alerts[1].id, "stock-low-1-leo-hidr-ulico");
        assert_eq!(alerts[1].severity, AlertSeverity::Warning);
    }

    #[test]
    fn test_arla_critical_and_case_insensitive_match() {
        let alerts = run(
            &StockEvaluator,
            &stock_only(vec![
                snapshot("diesel s10", 12000.0, 0.0),
                snapshot("arla 32 granel", 300.0, 0.0),
            ]),
        );
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, "stock-arla-critical");
    }

    #[test]
    fn test_thresholds_can_be_overridden() {
        let mut config = AlertConfig::default();
        config.stock.diesel_critical_low = 1000.0;
        config.stock.diesel_warning_low = 2000.0;
        let alerts = run_with(
            &StockEvaluator,
            &stock_only(vec![snapshot("Diesel S10", 4000.0, 0.0), snapshot("ARLA", 2000.0, 0.0)]),
            &config,
        );
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_non_numeric_snapshot_skipped() {
        let alerts = run(
            &StockEvaluator,
            &stock_only(vec![
                snapshot("Graxa", f64::NAN, 100.0),
                snapshot("Diesel", 20000.0, 0.0),
                snapshot("ARLA", 2000.0, 0.0),
            ]),
        );
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_absent_family_not_evaluated() {
        assert!(run(&StockEvaluator, &stock_only(vec![])).is_empty());
        let alerts = run(&StockEvaluator, &stock_only(vec![snapshot("Diesel", 20000.0, 0.0)]));
        assert!(alerts.is_empty(), "no ARLA tanks means no ARLA alert");
    }

    #[test]
    fn test_family_total_at_exact_thresholds() {
        let alerts = run(&StockEvaluator, &stock_only(vec![snapshot("Diesel S10", 5000.0, 0.0)]));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, "stock-diesel-warning");

        let alerts = run(
            &StockEvaluator,
            &stock_only(vec![
                snapshot("Diesel S10", 6000.0, 0.0),
                snapshot("Diesel Comum", 4000.0, 0.0),
            ]),
        );
        assert!(alerts.is_empty(), "10000 L is not below the warning level");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Diesel S-10 "), "diesel-s-10");
        assert_eq!(slugify("***"), "produto");
    }
}
