//! Config validation: unknown-key detection with Levenshtein suggestions
//! and plausibility checks.
//!
//! Threshold files are read twice. The loose `toml::Value` pass lists every
//! dotted key an operator wrote and flags the ones `AlertConfig` does not
//! know, suggesting the nearest real threshold name. The typed serde pass
//! then ignores those keys, so a typo costs a log line, not a failed load.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for AlertConfig.
///
/// Any new field added to AlertConfig must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [stock]
        "stock",
        "stock.critical_ratio",
        "stock.diesel_critical_low",
        "stock.diesel_warning_low",
        "stock.arla_critical_low",
        "stock.arla_warning_low",
        "stock.diesel_keywords",
        "stock.arla_keywords",
        // [consumption]
        "consumption",
        "consumption.min_events",
        "consumption.high_ratio",
        "consumption.low_ratio",
        "consumption.critical_deviation",
        "consumption.low_alert_min_mean",
        // [hour_meter]
        "hour_meter",
        "hour_meter.min_deltas",
        "hour_meter.daily_ceiling_hours",
        "hour_meter.deviation_ratio",
        "hour_meter.spike_min_records",
        "hour_meter.spike_ratio",
        // [zero_readings]
        "zero_readings",
        "zero_readings.global_critical_count",
        "zero_readings.per_asset_min_rows",
        // [odometer]
        "odometer",
        "odometer.min_deltas",
        "odometer.deviation_ratio",
    ];
    keys.iter().copied().collect()
}

/// Recursively collect dotted key paths from a TOML value tree.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let b_len = b_chars.len();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the alphabetically first key so suggestions are stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut candidates: Vec<&str> = known.iter().copied().collect();
    candidates.sort_unstable();

    let mut best: Option<(&str, usize)> = None;
    for k in candidates {
        let dist = levenshtein(unknown, k);
        if dist > 3 {
            continue;
        }
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((k, dist)),
        }
    }
    best.map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Plausibility Checks
// ============================================================================

/// Flag values that are legal but almost certainly a mistake.
pub fn validate_plausibility(config: &super::AlertConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut suspicious = |field: &str, message: String| {
        warnings.push(ValidationWarning {
            field: field.to_string(),
            message,
            suggestion: None,
        });
    };

    let h = &config.hour_meter;
    if h.daily_ceiling_hours > 24.0 {
        suspicious(
            "hour_meter.daily_ceiling_hours",
            format!(
                "hour_meter.daily_ceiling_hours = {:.1} exceeds the hours in a day",
                h.daily_ceiling_hours
            ),
        );
    }
    if h.deviation_ratio > 5.0 {
        suspicious(
            "hour_meter.deviation_ratio",
            format!(
                "hour_meter.deviation_ratio = {:.2} effectively disables deviation alerts",
                h.deviation_ratio
            ),
        );
    }

    let o = &config.odometer;
    if o.deviation_ratio > 5.0 {
        suspicious(
            "odometer.deviation_ratio",
            format!(
                "odometer.deviation_ratio = {:.2} effectively disables deviation alerts",
                o.deviation_ratio
            ),
        );
    }

    let c = &config.consumption;
    if c.high_ratio > 5.0 {
        suspicious(
            "consumption.high_ratio",
            format!(
                "consumption.high_ratio = {:.2} effectively disables high-consumption alerts",
                c.high_ratio
            ),
        );
    }

    warnings
}
