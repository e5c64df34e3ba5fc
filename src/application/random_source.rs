// Injectable randomness and bounded draws
use crate::domain::error::DashboardError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

/// Source of uniform draws used by the generator and the live updater.
pub trait RandomSource {
    /// Uniform float in `[min, max]`.
    fn uniform(&mut self, min: f64, max: f64) -> f64;

    /// Uniform integer in `[min, max]`.
    fn uniform_int(&mut self, min: u32, max: u32) -> u32;
}

/// `StdRng` backed source; seeded for reproducible output.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    fn uniform_int(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }
}

/// Closed interval used for every configurable generator range.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Bounds<T> {
    pub min: T,
    pub max: T,
}

impl<T> Bounds<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl Bounds<f64> {
    pub fn validate(&self, field: &str) -> Result<(), DashboardError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.max < self.min {
            return Err(DashboardError::invalid_range(field, self.min, self.max));
        }
        Ok(())
    }

    /// Validation for ratios applied to a base value; both ends must lie in [0, 1].
    pub fn validate_ratio(&self, field: &str) -> Result<(), DashboardError> {
        self.validate(field)?;
        if self.min < 0.0 || self.max > 1.0 {
            return Err(DashboardError::invalid_range(field, self.min, self.max));
        }
        Ok(())
    }

    pub fn draw(&self, rng: &mut dyn RandomSource) -> f64 {
        rng.uniform(self.min, self.max)
    }

    /// Draws an integer in `[min·base, max·base]`, rounding the window inward.
    pub fn draw_scaled(&self, base: u32, rng: &mut dyn RandomSource) -> u32 {
        let (lo, hi) = scaled_window(base, self);
        rng.uniform_int(lo, hi)
    }
}

impl Bounds<u32> {
    pub fn validate(&self, field: &str) -> Result<(), DashboardError> {
        if self.max < self.min {
            return Err(DashboardError::invalid_range(
                field,
                self.min as f64,
                self.max as f64,
            ));
        }
        Ok(())
    }

    pub fn draw(&self, rng: &mut dyn RandomSource) -> u32 {
        rng.uniform_int(self.min, self.max)
    }
}

/// Integer window inside `[ratio.min·base, ratio.max·base]`. When rounding inward
/// leaves no integer, the upper bound wins.
pub fn scaled_window(base: u32, ratio: &Bounds<f64>) -> (u32, u32) {
    let base = base as f64;
    let hi = (ratio.max * base).floor().max(0.0) as u32;
    let lo = (ratio.min * base).ceil().max(0.0) as u32;
    (lo.min(hi), hi)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_random_is_reproducible() {
        let mut a = SeededRandom::from_seed(42);
        let mut b = SeededRandom::from_seed(42);
        for _ in 0..100 {
            assert_eq!(a.uniform(5.0, 55.0), b.uniform(5.0, 55.0));
            assert_eq!(a.uniform_int(50, 300), b.uniform_int(50, 300));
        }
    }

    #[test]
    fn test_draws_stay_inside_bounds() {
        let mut rng = SeededRandom::from_seed(7);
        for _ in 0..1000 {
            let f = rng.uniform(0.0, 10.0);
            assert!((0.0..=10.0).contains(&f));
            let i = rng.uniform_int(0, 3);
            assert!(i <= 3);
        }
    }

    #[test]
    fn test_degenerate_range_returns_min() {
        let mut rng = SeededRandom::from_seed(1);
        assert_eq!(rng.uniform(4.0, 4.0), 4.0);
        assert_eq!(rng.uniform_int(9, 9), 9);
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let err = Bounds::new(10.0, 5.0).validate("runtime_seconds").unwrap_err();
        assert_eq!(err, DashboardError::invalid_range("runtime_seconds", 10.0, 5.0));

        assert!(Bounds::new(3u32, 1u32).validate("fg_count").is_err());
        assert!(Bounds::new(f64::NAN, 1.0).validate("waiting_seconds").is_err());
        assert!(Bounds::new(0.0, 0.0).validate("waiting_seconds").is_ok());
    }

    #[test]
    fn test_validate_ratio_requires_unit_interval() {
        assert!(Bounds::new(0.7, 1.0).validate_ratio("actual_ratio").is_ok());
        assert!(Bounds::new(0.7, 1.2).validate_ratio("actual_ratio").is_err());
        assert!(Bounds::new(-0.1, 0.5).validate_ratio("actual_ratio").is_err());
    }

    #[test]
    fn test_scaled_window_rounds_inward() {
        // 0.05 * 333 = 16.65, 0.15 * 333 = 49.95
        assert_eq!(scaled_window(333, &Bounds::new(0.05, 0.15)), (17, 49));
        assert_eq!(scaled_window(500, &Bounds::new(0.7, 1.0)), (350, 500));
        // 0.05 and 0.15 of a single unit leave no integer: fall back to the upper bound
        assert_eq!(scaled_window(1, &Bounds::new(0.05, 0.15)), (0, 0));
    }
}
