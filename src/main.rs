// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::application::clock::{Clock, FixedClock};
use crate::application::dashboard_service::DashboardService;
use crate::application::live_series::LiveSeriesUpdater;
use crate::application::random_source::{RandomSource, SeededRandom};
use crate::application::snapshot_generator::SnapshotGenerator;
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::system_clock::SystemClock;
use crate::presentation::app_state::AppState;
use crate::presentation::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_dashboard_config()?;

    // Randomness: one stream for snapshots, one for live ticks
    let (snapshot_rng, live_rng) = random_sources(config.random.seed);

    // Create services (application layer); malformed ranges stop start-up here
    let generator =
        SnapshotGenerator::new(config.generator.clone()).context("invalid generator ranges")?;
    let live = LiveSeriesUpdater::new(config.live.increment, live_rng)
        .context("invalid live increment")?;
    let dashboard_service = DashboardService::new(
        generator,
        live,
        config.live.interval(),
        clock(config.clock.fixed_now),
        snapshot_rng,
        config.filters.clone(),
    )
    .context("invalid live settings")?;

    // Seed the first snapshot so the live series runs from start-up
    dashboard_service.snapshot(None, None)?;

    // Create application state
    let state = Arc::new(AppState {
        dashboard_service: dashboard_service.clone(),
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.bind_addr))?;
    tracing::info!("Starting oee-dashboard service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    dashboard_service.shutdown();
    tracing::info!("oee-dashboard stopped");

    Ok(())
}

fn clock(fixed_now: Option<chrono::DateTime<chrono::Utc>>) -> Arc<dyn Clock> {
    match fixed_now {
        Some(now) => {
            tracing::info!("clock pinned to {}", now);
            Arc::new(FixedClock(now))
        }
        None => Arc::new(SystemClock),
    }
}

type BoxedRandom = Box<dyn RandomSource + Send>;

fn random_sources(seed: Option<u64>) -> (BoxedRandom, BoxedRandom) {
    match seed {
        Some(seed) => {
            tracing::info!("using fixed random seed {}", seed);
            (
                Box::new(SeededRandom::from_seed(seed)),
                Box::new(SeededRandom::from_seed(seed.wrapping_add(1))),
            )
        }
        None => (
            Box::new(SeededRandom::from_entropy()),
            Box::new(SeededRandom::from_entropy()),
        ),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        // Without a signal handler, keep serving
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
