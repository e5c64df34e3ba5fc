// OEE metric domain models
use super::filter::DashboardFilter;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Round to one decimal place, half away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineMetricSample {
    pub timestamp: DateTime<Utc>,
    pub runtime_seconds: f64,
    pub net_runtime_seconds: f64,
    pub fg_count: u32,
    pub waiting_seconds: f64,
}

/// FG counts for one hour, keyed by SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyFgBucket {
    pub hour: DateTime<Utc>,
    pub counts: BTreeMap<String, u32>,
}

impl HourlyFgBucket {
    pub fn new(hour: DateTime<Utc>, counts: BTreeMap<String, u32>) -> Self {
        Self { hour, counts }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuSummary {
    pub sku: String,
    pub target: u32,
    pub actual: u32,
    pub defects: u32,
    pub quality_rate: f64,
}

impl SkuSummary {
    pub fn new(sku: String, target: u32, actual: u32, defects: u32) -> Self {
        let quality_rate = quality_rate(actual, defects);
        Self {
            sku,
            target,
            actual,
            defects,
            quality_rate,
        }
    }
}

/// Share of good units in percent. Nothing produced means nothing defective.
pub fn quality_rate(actual: u32, defects: u32) -> f64 {
    if actual == 0 {
        return 100.0;
    }
    let good = actual.saturating_sub(defects) as f64;
    round1(good / actual as f64 * 100.0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityBucket {
    pub hour: DateTime<Utc>,
    pub capacity: u32,
    pub actual: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OeeMetrics {
    pub availability: f64,
    pub performance: f64,
    pub quality: f64,
    pub oee: f64,
}

impl OeeMetrics {
    /// Builds the bundle from raw percentages. Components are rounded first and
    /// the overall score is always derived from the rounded components.
    pub fn derive(availability: f64, performance: f64, quality: f64) -> Self {
        let availability = round1(availability);
        let performance = round1(performance);
        let quality = round1(quality);
        Self {
            availability,
            performance,
            quality,
            oee: oee_score(availability, performance, quality),
        }
    }
}

pub fn oee_score(availability: f64, performance: f64, quality: f64) -> f64 {
    round1(availability * performance * quality / 10000.0)
}

/// One complete, time-anchored dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub generated_at: DateTime<Utc>,
    pub filter: DashboardFilter,
    pub machine_metrics: Vec<MachineMetricSample>,
    pub fg_by_hour: Vec<HourlyFgBucket>,
    pub sku_summary: Vec<SkuSummary>,
    pub capacity_vs_actual: Vec<CapacityBucket>,
    pub oee_metrics: OeeMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round1_half_away_from_zero() {
        assert_eq!(round1(2.25), 2.3);
        assert_eq!(round1(-2.25), -2.3);
        assert_eq!(round1(0.04), 0.0);
        assert_eq!(round1(87.0), 87.0);
    }

    #[test]
    fn test_oee_is_derived_from_rounded_components() {
        let metrics = OeeMetrics::derive(90.04, 80.0, 95.0);
        assert_eq!(metrics.availability, 90.0);
        // 90 * 80 * 95 / 10000 = 68.4
        assert_eq!(metrics.oee, 68.4);

        let metrics = OeeMetrics::derive(100.0, 100.0, 100.0);
        assert_eq!(metrics.oee, 100.0);
    }

    #[test]
    fn test_quality_rate() {
        let summary = SkuSummary::new("SKU-A".to_string(), 800, 700, 70);
        assert_eq!(summary.quality_rate, 90.0);

        // 1 - 1/3 = 66.666..
        assert_eq!(quality_rate(3, 1), 66.7);
        assert_eq!(quality_rate(0, 0), 100.0);
    }
}
