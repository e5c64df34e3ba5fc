// Dashboard service - Use case behind filter changes, refreshes and the live chart
use crate::application::clock::Clock;
use crate::application::live_series::{LiveSeries, LiveSeriesHandle, LiveSeriesUpdater, LiveStatus};
use crate::application::random_source::RandomSource;
use crate::application::snapshot_generator::SnapshotGenerator;
use crate::domain::error::DashboardError;
use crate::domain::filter::{DashboardFilter, FilterCatalog};
use crate::domain::metrics::Snapshot;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;

const LIVE_CHANNEL_CAPACITY: usize = 16;

struct Current {
    snapshot: Arc<Snapshot>,
    live_handle: LiveSeriesHandle,
}

#[derive(Clone)]
pub struct DashboardService {
    generator: Arc<SnapshotGenerator>,
    clock: Arc<dyn Clock>,
    rng: Arc<Mutex<Box<dyn RandomSource + Send>>>,
    live: LiveSeriesUpdater,
    live_interval: Duration,
    catalog: FilterCatalog,
    current: Arc<Mutex<Option<Current>>>,
    updates: broadcast::Sender<LiveSeries>,
}

impl DashboardService {
    pub fn new(
        generator: SnapshotGenerator,
        live: LiveSeriesUpdater,
        live_interval: Duration,
        clock: Arc<dyn Clock>,
        rng: Box<dyn RandomSource + Send>,
        catalog: FilterCatalog,
    ) -> Result<Self, DashboardError> {
        if live_interval.is_zero() {
            return Err(DashboardError::InvalidInterval);
        }

        let (updates, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        Ok(Self {
            generator: Arc::new(generator),
            clock,
            rng: Arc::new(Mutex::new(rng)),
            live,
            live_interval,
            catalog,
            current: Arc::new(Mutex::new(None)),
            updates,
        })
    }

    pub fn catalog(&self) -> &FilterCatalog {
        &self.catalog
    }

    pub fn current_filter(&self) -> Option<DashboardFilter> {
        lock(&self.current)
            .as_ref()
            .map(|c| c.snapshot.filter.clone())
    }

    /// Snapshot for the requested selection. A new one is generated only when the
    /// selection differs from the current one or nothing has been generated yet.
    pub fn snapshot(
        &self,
        plant: Option<String>,
        machine: Option<String>,
    ) -> Result<Arc<Snapshot>, DashboardError> {
        let mut current = lock(&self.current);
        let filter = self.resolve(plant, machine, current.as_ref());

        if let Some(existing) = current.as_ref() {
            if existing.snapshot.filter == filter {
                return Ok(Arc::clone(&existing.snapshot));
            }
            tracing::info!(
                "filter changed to {} / {}, regenerating snapshot",
                filter.plant,
                filter.machine
            );
        }

        self.regenerate(&mut current, filter)
    }

    /// Manual refresh: always regenerates and re-seeds the live series.
    pub fn refresh(
        &self,
        plant: Option<String>,
        machine: Option<String>,
    ) -> Result<Arc<Snapshot>, DashboardError> {
        let mut current = lock(&self.current);
        let filter = self.resolve(plant, machine, current.as_ref());
        tracing::info!("manual refresh for {} / {}", filter.plant, filter.machine);
        self.regenerate(&mut current, filter)
    }

    pub fn live_series(&self) -> Option<LiveSeries> {
        self.live.current()
    }

    pub fn live_status(&self) -> LiveStatus {
        self.live.status()
    }

    /// Ticks the live series immediately instead of waiting for the timer.
    pub fn advance_live(&self) -> Option<LiveSeries> {
        self.live.advance()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveSeries> {
        self.updates.subscribe()
    }

    /// Stops the live updater; later requests seed it again.
    pub fn shutdown(&self) {
        if let Some(current) = lock(&self.current).take() {
            self.live.stop(current.live_handle);
        }
    }

    fn resolve(
        &self,
        plant: Option<String>,
        machine: Option<String>,
        current: Option<&Current>,
    ) -> DashboardFilter {
        self.catalog
            .resolve(plant, machine, current.map(|c| &c.snapshot.filter))
    }

    fn regenerate(
        &self,
        current: &mut Option<Current>,
        filter: DashboardFilter,
    ) -> Result<Arc<Snapshot>, DashboardError> {
        let now = self.clock.now();
        let snapshot = {
            let mut rng = lock(&self.rng);
            Arc::new(self.generator.generate(now, filter, &mut **rng))
        };

        // Full re-seed: the previous live series is discarded with its snapshot
        if let Some(previous) = current.take() {
            self.live.stop(previous.live_handle);
        }

        let updates = self.updates.clone();
        let live_handle = self.live.start(
            snapshot.fg_by_hour.clone(),
            self.live_interval,
            move |series| {
                // No subscribers is fine
                let _ = updates.send(series.clone());
            },
        )?;

        tracing::info!(
            "snapshot generated at {} for {} / {} (live handle={})",
            now,
            snapshot.filter.plant,
            snapshot.filter.machine,
            live_handle.id()
        );

        *current = Some(Current {
            snapshot: Arc::clone(&snapshot),
            live_handle,
        });
        Ok(snapshot)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
