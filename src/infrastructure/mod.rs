// Infrastructure layer - External dependencies and adapters
pub mod chunked_json;
pub mod config;
pub mod system_clock;
