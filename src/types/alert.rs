//! Alert output types: AlertCategory, AlertSeverity, Alert, AlertSummary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Category & Severity
// ============================================================================

/// Category of a fleet alert.
///
/// Serialized names are the ones the dashboard filters on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AlertCategory {
    /// Tank and product stock levels
    #[serde(rename = "stock")]
    Stock,
    /// Fuel consumption per refuelling
    #[serde(rename = "consumption")]
    Consumption,
    /// Hour-meter readings and hour-meter data quality
    #[serde(rename = "horimetro")]
    HourMeter,
    /// Odometer readings
    #[serde(rename = "km")]
    Odometer,
    /// Maintenance scheduling
    #[serde(rename = "manutencao")]
    Maintenance,
}

impl AlertCategory {
    /// Every category, in merge order.
    pub const ALL: [AlertCategory; 5] = [
        AlertCategory::Stock,
        AlertCategory::Consumption,
        AlertCategory::HourMeter,
        AlertCategory::Odometer,
        AlertCategory::Maintenance,
    ];

    /// Wire name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCategory::Stock => "stock",
            AlertCategory::Consumption => "consumption",
            AlertCategory::HourMeter => "horimetro",
            AlertCategory::Odometer => "km",
            AlertCategory::Maintenance => "manutencao",
        }
    }
}

impl std::fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity level for alerts. Declaration order is display priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical = 0,
    Warning = 1,
    Info = 2,
}

impl AlertSeverity {
    /// Sort rank: critical=0, warning=1, info=2.
    pub fn rank(&self) -> u8 {
        *self as u8
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSeverity::Critical => write!(f, "CRITICAL"),
            AlertSeverity::Warning => write!(f, "WARNING"),
            AlertSeverity::Info => write!(f, "INFO"),
        }
    }
}

// ============================================================================
// Alert
// ============================================================================

/// A single alert produced by one evaluation.
///
/// `id` is unique within the evaluation that produced it but is not stable
/// across evaluations. `timestamp` is the evaluation time, used only to
/// break ties between alerts of equal severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub category: AlertCategory,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    /// Observed value that triggered the alert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Historical average the value was compared against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
    /// Relative deviation |value - average| / average
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deviation: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    pub fn new(
        id: impl Into<String>,
        category: AlertCategory,
        severity: AlertSeverity,
        title: impl Into<String>,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            severity,
            title: title.into(),
            message: message.into(),
            asset_id: None,
            value: None,
            average: None,
            deviation: None,
            timestamp,
        }
    }

    pub fn with_asset(mut self, asset_id: impl Into<String>) -> Self {
        self.asset_id = Some(asset_id.into());
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// Attach the comparison average and the relative deviation from it.
    pub fn with_average(mut self, average: f64, deviation: f64) -> Self {
        self.average = Some(average);
        self.deviation = Some(deviation);
        self
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Per-severity and per-category counts over an alert list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub total: usize,
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
    /// (category, count) in merge order, zero counts omitted
    pub by_category: Vec<(AlertCategory, usize)>,
}

impl AlertSummary {
    pub fn from_alerts(alerts: &[Alert]) -> Self {
        let count_severity =
            |severity: AlertSeverity| alerts.iter().filter(|a| a.severity == severity).count();

        let by_category = AlertCategory::ALL
            .iter()
            .map(|&c| (c, alerts.iter().filter(|a| a.category == c).count()))
            .filter(|&(_, n)| n > 0)
            .collect();

        Self {
            total: alerts.len(),
            critical: count_severity(AlertSeverity::Critical),
            warning: count_severity(AlertSeverity::Warning),
            info: count_severity(AlertSeverity::Info),
            by_category,
        }
    }
}

impl std::fmt::Display for AlertSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} alerts ({} critical, {} warning, {} info)",
            self.total, self.critical, self.warning, self.info
        )
    }
}
