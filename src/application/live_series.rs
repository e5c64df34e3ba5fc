// Live series updater - Periodic upward drift of the FG-by-hour series
use crate::application::random_source::{Bounds, RandomSource};
use crate::domain::error::DashboardError;
use crate::domain::metrics::HourlyFgBucket;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_INCREMENT: Bounds<u32> = Bounds::new(0, 3);

/// Identifies one `start` of an updater. Handles from earlier runs are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LiveSeriesHandle(pub(crate) u64);

impl LiveSeriesHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdaterState {
    Idle,
    Running,
}

/// Read-only view of the working series after a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveSeries {
    pub handle: LiveSeriesHandle,
    pub ticks: u64,
    pub buckets: Arc<Vec<HourlyFgBucket>>,
}

/// Updater state plus the working series while running.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveStatus {
    pub state: UpdaterState,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub series: Option<LiveSeries>,
}

/// Adds an independent increment to every SKU count of every bucket. Hours and
/// bucket order are kept; counts saturate at `u32::MAX`.
pub fn tick(
    series: &[HourlyFgBucket],
    increment: &Bounds<u32>,
    rng: &mut dyn RandomSource,
) -> Vec<HourlyFgBucket> {
    series
        .iter()
        .map(|bucket| {
            let counts = bucket
                .counts
                .iter()
                .map(|(sku, count)| (sku.clone(), count.saturating_add(increment.draw(rng))))
                .collect();
            HourlyFgBucket::new(bucket.hour, counts)
        })
        .collect()
}

type TickCallback = Box<dyn Fn(&LiveSeries) + Send + Sync>;

struct Run {
    handle: LiveSeriesHandle,
    series: Arc<Vec<HourlyFgBucket>>,
    ticks: u64,
    on_tick: TickCallback,
    task: Option<JoinHandle<()>>,
}

struct Inner {
    rng: Box<dyn RandomSource + Send>,
    run: Option<Run>,
    next_id: u64,
}

/// Owns the working copy of the FG series and advances it on a timer.
///
/// Idle -> Running on `start`, Running -> Idle on `stop`. Both transitions are
/// idempotent: `start` while running returns the live handle and ignores the new
/// seed, `stop` while idle (or with a stale handle) does nothing.
///
/// A tick mutates the series and invokes the callback while holding the
/// updater's lock, and `stop` takes the same lock, so once `stop` returns no
/// further mutation or callback happens. Callbacks must not call back into the
/// updater.
#[derive(Clone)]
pub struct LiveSeriesUpdater {
    inner: Arc<Mutex<Inner>>,
    increment: Bounds<u32>,
}

impl LiveSeriesUpdater {
    pub fn new(
        increment: Bounds<u32>,
        rng: Box<dyn RandomSource + Send>,
    ) -> Result<Self, DashboardError> {
        increment.validate("live_increment")?;
        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                rng,
                run: None,
                next_id: 1,
            })),
            increment,
        })
    }

    /// Seeds the working series and arms the timer. Requires a Tokio runtime.
    pub fn start<F>(
        &self,
        initial: Vec<HourlyFgBucket>,
        interval: Duration,
        on_tick: F,
    ) -> Result<LiveSeriesHandle, DashboardError>
    where
        F: Fn(&LiveSeries) + Send + Sync + 'static,
    {
        if interval.is_zero() {
            return Err(DashboardError::InvalidInterval);
        }

        let mut inner = lock(&self.inner);
        if let Some(run) = &inner.run {
            tracing::debug!("live updater already running (handle={})", run.handle.id());
            return Ok(run.handle);
        }

        let handle = LiveSeriesHandle(inner.next_id);
        inner.next_id += 1;

        let task = tokio::spawn(drive(
            Arc::downgrade(&self.inner),
            self.increment,
            handle,
            interval,
        ));
        inner.run = Some(Run {
            handle,
            series: Arc::new(initial),
            ticks: 0,
            on_tick: Box::new(on_tick),
            task: Some(task),
        });

        tracing::info!(
            "live updater started (handle={}, interval={:?})",
            handle.id(),
            interval
        );
        Ok(handle)
    }

    /// Disarms the timer. No-op when idle or when `handle` belongs to an earlier run.
    pub fn stop(&self, handle: LiveSeriesHandle) {
        let mut inner = lock(&self.inner);
        match &inner.run {
            Some(run) if run.handle == handle => {}
            Some(run) => {
                tracing::debug!(
                    "ignoring stop for stale handle {} (running {})",
                    handle.id(),
                    run.handle.id()
                );
                return;
            }
            None => return,
        }

        if let Some(mut run) = inner.run.take() {
            if let Some(task) = run.task.take() {
                task.abort();
            }
            tracing::info!(
                "live updater stopped (handle={}, ticks={})",
                handle.id(),
                run.ticks
            );
        }
    }

    /// Runs one tick right away. Returns `None` when idle.
    pub fn advance(&self) -> Option<LiveSeries> {
        let mut inner = lock(&self.inner);
        let handle = inner.run.as_ref()?.handle;
        apply_tick(&mut inner, handle, &self.increment)
    }

    pub fn current(&self) -> Option<LiveSeries> {
        lock(&self.inner).run.as_ref().map(Run::view)
    }

    pub fn status(&self) -> LiveStatus {
        let series = self.current();
        let state = match series {
            Some(_) => UpdaterState::Running,
            None => UpdaterState::Idle,
        };
        LiveStatus { state, series }
    }
}

impl Run {
    fn view(&self) -> LiveSeries {
        LiveSeries {
            handle: self.handle,
            ticks: self.ticks,
            buckets: Arc::clone(&self.series),
        }
    }
}

fn apply_tick(
    inner: &mut Inner,
    handle: LiveSeriesHandle,
    increment: &Bounds<u32>,
) -> Option<LiveSeries> {
    let Inner { rng, run, .. } = inner;
    let run = run.as_mut().filter(|run| run.handle == handle)?;

    run.series = Arc::new(tick(&run.series, increment, &mut **rng));
    run.ticks += 1;

    let view = run.view();
    tracing::debug!("live tick {} (handle={})", view.ticks, handle.id());
    (run.on_tick)(&view);
    Some(view)
}

/// Timer loop for one run. Ends when the run is stopped or the updater is dropped.
async fn drive(
    inner: Weak<Mutex<Inner>>,
    increment: Bounds<u32>,
    handle: LiveSeriesHandle,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    // A late tick is dropped rather than queued
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let Some(shared) = inner.upgrade() else {
            break;
        };
        let mut guard = lock(&shared);
        if apply_tick(&mut guard, handle, &increment).is_none() {
            break;
        }
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    // Every mutation completes under the guard, so a poisoned state is still whole
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
