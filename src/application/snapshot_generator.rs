// Snapshot generator - Synthetic, internally consistent OEE datasets
use crate::application::random_source::{Bounds, RandomSource};
use crate::domain::error::DashboardError;
use crate::domain::filter::DashboardFilter;
use crate::domain::metrics::{
    CapacityBucket, HourlyFgBucket, MachineMetricSample, OeeMetrics, SkuSummary, Snapshot,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

pub const MACHINE_SAMPLES: usize = 60;
pub const HOURLY_BUCKETS: usize = 8;

/// Ranges for every drawn value. All ratio bounds are fractions of a drawn base.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub skus: Vec<String>,
    pub runtime_seconds: Bounds<f64>,
    pub net_runtime_seconds: Bounds<f64>,
    pub waiting_seconds: Bounds<f64>,
    pub fg_count: Bounds<u32>,
    pub fg_per_hour: Bounds<u32>,
    pub sku_target: Bounds<u32>,
    pub sku_actual_ratio: Bounds<f64>,
    pub defect_ratio: Bounds<f64>,
    pub capacity: Bounds<u32>,
    pub capacity_actual_ratio: Bounds<f64>,
    pub availability: Bounds<f64>,
    pub performance: Bounds<f64>,
    pub quality: Bounds<f64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            skus: ["SKU-A", "SKU-B", "SKU-C", "SKU-D"]
                .into_iter()
                .map(String::from)
                .collect(),
            runtime_seconds: Bounds::new(5.0, 55.0),
            net_runtime_seconds: Bounds::new(5.0, 50.0),
            waiting_seconds: Bounds::new(0.0, 10.0),
            fg_count: Bounds::new(0, 10),
            fg_per_hour: Bounds::new(50, 300),
            sku_target: Bounds::new(500, 1000),
            sku_actual_ratio: Bounds::new(0.7, 1.0),
            defect_ratio: Bounds::new(0.05, 0.15),
            capacity: Bounds::new(300, 500),
            capacity_actual_ratio: Bounds::new(0.7, 1.0),
            availability: Bounds::new(80.0, 100.0),
            performance: Bounds::new(75.0, 95.0),
            quality: Bounds::new(85.0, 100.0),
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), DashboardError> {
        if self.skus.is_empty() {
            return Err(DashboardError::EmptySkuList);
        }

        self.runtime_seconds.validate("runtime_seconds")?;
        self.net_runtime_seconds.validate("net_runtime_seconds")?;
        self.waiting_seconds.validate("waiting_seconds")?;
        self.fg_count.validate("fg_count")?;
        self.fg_per_hour.validate("fg_per_hour")?;
        self.sku_target.validate("sku_target")?;
        self.sku_actual_ratio.validate_ratio("sku_actual_ratio")?;
        self.defect_ratio.validate_ratio("defect_ratio")?;
        self.capacity.validate("capacity")?;
        self.capacity_actual_ratio.validate_ratio("capacity_actual_ratio")?;

        for (field, bounds) in [
            ("availability", &self.availability),
            ("performance", &self.performance),
            ("quality", &self.quality),
        ] {
            bounds.validate(field)?;
            if bounds.min < 0.0 || bounds.max > 100.0 {
                return Err(DashboardError::invalid_range(field, bounds.min, bounds.max));
            }
        }

        Ok(())
    }
}

/// Produces snapshots from a validated configuration. Construction is the only
/// fallible step; generation itself cannot fail.
#[derive(Debug, Clone)]
pub struct SnapshotGenerator {
    config: GeneratorConfig,
}

impl SnapshotGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, DashboardError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn generate(
        &self,
        now: DateTime<Utc>,
        filter: DashboardFilter,
        rng: &mut dyn RandomSource,
    ) -> Snapshot {
        // Draw order is fixed so a seeded source always yields the same snapshot
        let machine_metrics = self.machine_metrics(now, rng);
        let fg_by_hour = self.fg_by_hour(now, rng);
        let sku_summary = self.sku_summary(rng);
        let capacity_vs_actual = self.capacity_vs_actual(now, rng);
        let oee_metrics = self.oee_metrics(rng);

        Snapshot {
            generated_at: now,
            filter,
            machine_metrics,
            fg_by_hour,
            sku_summary,
            capacity_vs_actual,
            oee_metrics,
        }
    }

    fn machine_metrics(
        &self,
        now: DateTime<Utc>,
        rng: &mut dyn RandomSource,
    ) -> Vec<MachineMetricSample> {
        let c = &self.config;
        (0..MACHINE_SAMPLES)
            .map(|i| MachineMetricSample {
                timestamp: now - Duration::minutes((MACHINE_SAMPLES - 1 - i) as i64),
                runtime_seconds: c.runtime_seconds.draw(rng),
                net_runtime_seconds: c.net_runtime_seconds.draw(rng),
                fg_count: c.fg_count.draw(rng),
                waiting_seconds: c.waiting_seconds.draw(rng),
            })
            .collect()
    }

    fn fg_by_hour(&self, now: DateTime<Utc>, rng: &mut dyn RandomSource) -> Vec<HourlyFgBucket> {
        (0..HOURLY_BUCKETS)
            .map(|i| {
                let counts: BTreeMap<String, u32> = self
                    .config
                    .skus
                    .iter()
                    .map(|sku| (sku.clone(), self.config.fg_per_hour.draw(rng)))
                    .collect();
                HourlyFgBucket::new(hour_slot(now, i), counts)
            })
            .collect()
    }

    fn sku_summary(&self, rng: &mut dyn RandomSource) -> Vec<SkuSummary> {
        let c = &self.config;
        c.skus
            .iter()
            .map(|sku| {
                let target = c.sku_target.draw(rng);
                let actual = c.sku_actual_ratio.draw_scaled(target, rng);
                let defects = c.defect_ratio.draw_scaled(actual, rng);
                SkuSummary::new(sku.clone(), target, actual, defects)
            })
            .collect()
    }

    fn capacity_vs_actual(
        &self,
        now: DateTime<Utc>,
        rng: &mut dyn RandomSource,
    ) -> Vec<CapacityBucket> {
        let c = &self.config;
        (0..HOURLY_BUCKETS)
            .map(|i| {
                let capacity = c.capacity.draw(rng);
                CapacityBucket {
                    hour: hour_slot(now, i),
                    capacity,
                    actual: c.capacity_actual_ratio.draw_scaled(capacity, rng),
                }
            })
            .collect()
    }

    fn oee_metrics(&self, rng: &mut dyn RandomSource) -> OeeMetrics {
        let c = &self.config;
        let availability = c.availability.draw(rng);
        let performance = c.performance.draw(rng);
        let quality = c.quality.draw(rng);
        OeeMetrics::derive(availability, performance, quality)
    }
}

/// Timestamp of hourly bucket `i`; the last bucket sits at `now`.
fn hour_slot(now: DateTime<Utc>, i: usize) -> DateTime<Utc> {
    now - Duration::hours((HOURLY_BUCKETS - 1 - i) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::random_source::SeededRandom;
    use crate::domain::metrics::{oee_score, quality_rate};
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn filter() -> DashboardFilter {
        DashboardFilter::new("Plant A", "Machine 1")
    }

    fn generate(seed: u64) -> Snapshot {
        let generator = SnapshotGenerator::new(GeneratorConfig::default()).unwrap();
        generator.generate(noon(), filter(), &mut SeededRandom::from_seed(seed))
    }

    #[test]
    fn test_machine_metrics_are_one_minute_apart() {
        for seed in 0..200 {
            let snapshot = generate(seed);
            let samples = &snapshot.machine_metrics;
            assert_eq!(samples.len(), 60);
            for pair in samples.windows(2) {
                let gap = pair[1].timestamp - pair[0].timestamp;
                assert_eq!(gap.num_milliseconds(), 60_000);
            }
        }
    }

    #[test]
    fn test_machine_metrics_stay_in_bounds() {
        for seed in 0..200 {
            for sample in generate(seed).machine_metrics {
                assert!((5.0..=55.0).contains(&sample.runtime_seconds));
                assert!((5.0..=50.0).contains(&sample.net_runtime_seconds));
                assert!((0.0..=10.0).contains(&sample.waiting_seconds));
                assert!(sample.fg_count <= 10);
            }
        }
    }

    #[test]
    fn test_oee_is_always_the_normalized_product() {
        for seed in 0..500 {
            let oee = generate(seed).oee_metrics;
            assert_eq!(
                oee.oee,
                oee_score(oee.availability, oee.performance, oee.quality),
                "seed {}",
                seed
            );
            assert!((80.0..=100.0).contains(&oee.availability));
            assert!((75.0..=95.0).contains(&oee.performance));
            assert!((85.0..=100.0).contains(&oee.quality));
        }
    }

    #[test]
    fn test_sku_summary_invariants() {
        for seed in 0..500 {
            let summary = generate(seed).sku_summary;
            assert_eq!(summary.len(), 4);
            for s in summary {
                assert!((500..=1000).contains(&s.target));
                assert!(s.defects <= s.actual && s.actual <= s.target, "{:?}", s);
                assert!(s.actual as f64 >= 0.7 * s.target as f64);
                assert!(s.defects as f64 >= 0.05 * s.actual as f64);
                assert!(s.defects as f64 <= 0.15 * s.actual as f64);
                assert_eq!(s.quality_rate, quality_rate(s.actual, s.defects));
            }
        }
    }

    #[test]
    fn test_capacity_never_exceeded() {
        for seed in 0..500 {
            for bucket in generate(seed).capacity_vs_actual {
                assert!((300..=500).contains(&bucket.capacity));
                assert!(bucket.actual <= bucket.capacity);
                assert!(bucket.actual as f64 >= 0.7 * bucket.capacity as f64);
            }
        }
    }

    #[test]
    fn test_fg_counts_cover_every_sku() {
        for seed in 0..100 {
            for bucket in generate(seed).fg_by_hour {
                assert_eq!(bucket.counts.len(), 4);
                assert!(bucket.counts.values().all(|c| (50..=300).contains(c)));
            }
        }
    }

    #[test]
    fn test_series_anchor_to_now() {
        let snapshot = generate(3);
        let now = noon();

        assert_eq!(snapshot.generated_at, now);
        assert_eq!(snapshot.machine_metrics.last().unwrap().timestamp, now);
        // 60 samples end at 12:00, so the first one is 59 minutes earlier
        assert_eq!(
            snapshot.machine_metrics.first().unwrap().timestamp,
            Utc.with_ymd_and_hms(2024, 1, 1, 11, 1, 0).unwrap()
        );

        assert_eq!(snapshot.fg_by_hour.len(), 8);
        for bucket in &snapshot.fg_by_hour {
            for sku in ["SKU-A", "SKU-B", "SKU-C", "SKU-D"] {
                assert!(bucket.counts.contains_key(sku));
            }
        }

        assert_eq!(snapshot.capacity_vs_actual.len(), 8);
        assert_eq!(snapshot.capacity_vs_actual.last().unwrap().hour, now);
        assert_eq!(
            snapshot.capacity_vs_actual.first().unwrap().hour,
            Utc.with_ymd_and_hms(2024, 1, 1, 5, 0, 0).unwrap()
        );
        let fg_hours: Vec<_> = snapshot.fg_by_hour.iter().map(|b| b.hour).collect();
        let cap_hours: Vec<_> = snapshot.capacity_vs_actual.iter().map(|b| b.hour).collect();
        assert_eq!(fg_hours, cap_hours);
    }

    #[test]
    fn test_same_seed_same_bytes() {
        let first = serde_json::to_string(&generate(99)).unwrap();
        let second = serde_json::to_string(&generate(99)).unwrap();
        assert_eq!(first, second);

        let other = serde_json::to_string(&generate(100)).unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn test_malformed_range_is_rejected() {
        let config = GeneratorConfig {
            capacity: Bounds::new(500, 300),
            ..GeneratorConfig::default()
        };
        let err = SnapshotGenerator::new(config).unwrap_err();
        assert_eq!(err, DashboardError::invalid_range("capacity", 500.0, 300.0));

        let config = GeneratorConfig {
            quality: Bounds::new(85.0, 120.0),
            ..GeneratorConfig::default()
        };
        assert!(SnapshotGenerator::new(config).is_err());

        let config = GeneratorConfig {
            skus: Vec::new(),
            ..GeneratorConfig::default()
        };
        assert_eq!(
            SnapshotGenerator::new(config).unwrap_err(),
            DashboardError::EmptySkuList
        );
    }

    #[test]
    fn test_custom_sku_list() {
        let config = GeneratorConfig {
            skus: vec!["X-1".to_string(), "X-2".to_string()],
            ..GeneratorConfig::default()
        };
        let generator = SnapshotGenerator::new(config).unwrap();
        let snapshot = generator.generate(noon(), filter(), &mut SeededRandom::from_seed(5));
        assert_eq!(snapshot.sku_summary.len(), 2);
        assert!(snapshot.fg_by_hour.iter().all(|b| b.counts.len() == 2));
    }
}
