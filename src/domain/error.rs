// Error taxonomy shared by the generator, the live updater and the service
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DashboardError {
    /// A configured bound is malformed (max < min, non-finite, ratio outside [0, 1]).
    #[error("invalid range for {field}: min={min}, max={max}")]
    InvalidRange { field: String, min: f64, max: f64 },

    #[error("live update interval must be greater than zero")]
    InvalidInterval,

    #[error("generator needs at least one SKU")]
    EmptySkuList,
}

impl DashboardError {
    pub fn invalid_range(field: &str, min: f64, max: f64) -> Self {
        Self::InvalidRange {
            field: field.to_string(),
            min,
            max,
        }
    }
}
