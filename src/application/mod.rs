// Application layer - Use cases over the OEE domain
pub mod clock;
pub mod dashboard_service;
pub mod live_series;
pub mod random_source;
pub mod snapshot_generator;
