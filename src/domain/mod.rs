// Domain layer - OEE entities and their invariants
pub mod error;
pub mod filter;
pub mod metrics;
