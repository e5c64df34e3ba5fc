use crate::application::live_series::{DEFAULT_INCREMENT, DEFAULT_INTERVAL};
use crate::application::random_source::Bounds;
use crate::application::snapshot_generator::GeneratorConfig;
use crate::domain::filter::FilterCatalog;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub live: LiveSettings,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub filters: FilterCatalog,
    #[serde(default)]
    pub random: RandomSettings,
    #[serde(default)]
    pub clock: ClockSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LiveSettings {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_increment")]
    pub increment: Bounds<u32>,
}

impl LiveSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            increment: default_increment(),
        }
    }
}

/// A fixed seed makes every snapshot and live tick reproducible.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RandomSettings {
    pub seed: Option<u64>,
}

/// Pins "now" for every snapshot, e.g. for demos or screenshots.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ClockSettings {
    pub fixed_now: Option<DateTime<Utc>>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL.as_millis() as u64
}

fn default_increment() -> Bounds<u32> {
    DEFAULT_INCREMENT
}

/// Loads `config/dashboard.*` (optional) overlaid with `OEE__SECTION__KEY` variables.
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(env_overrides())
        .build()
        .context("failed to read dashboard configuration")?;

    settings
        .try_deserialize()
        .context("invalid dashboard configuration")
}

/// List settings take comma-separated values, e.g. `OEE__FILTERS__PLANTS=North,South`.
fn env_overrides() -> config::Environment {
    config::Environment::with_prefix("OEE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("generator.skus")
        .with_list_parse_key("filters.plants")
        .with_list_parse_key("filters.machines")
}
