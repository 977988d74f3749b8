//! Periodic sync driver.
//!
//! Fires the dispatcher on a fixed wall-clock cadence, independent of any
//! external request. Overlap protection lives in the dispatcher's gate: a
//! tick that lands while a sync is still running observes
//! [`GirderError::ConcurrentSync`] and is skipped with a log line, never
//! queued.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::db::repository::GirderRepository;
use crate::error::GirderError;
use crate::sources::SourceDispatcher;

/// Drives [`SourceDispatcher::sync`] on a fixed period, hourly by default.
pub struct SyncScheduler<R: GirderRepository + 'static> {
    dispatcher: Arc<SourceDispatcher<R>>,
    period: Duration,
}

impl<R: GirderRepository + 'static> SyncScheduler<R> {
    pub fn new(dispatcher: Arc<SourceDispatcher<R>>, period: Duration) -> Self {
        Self { dispatcher, period }
    }

    pub fn from_minutes(dispatcher: Arc<SourceDispatcher<R>>, minutes: u64) -> Self {
        Self::new(dispatcher, Duration::from_secs(minutes.max(1) * 60))
    }

    /// Register the recurring trigger on the current runtime.
    ///
    /// The first tick fires one full period after start, and the task runs
    /// for the life of the process; there is no stop handle.
    pub fn start(self) {
        info!(period_secs = self.period.as_secs(), "Sync scheduler started");
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + self.period, self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match self.dispatcher.sync().await {
                    Ok(outcome) => {
                        info!(records = outcome.records(), "Scheduled sync completed");
                    }
                    Err(GirderError::ConcurrentSync) => {
                        warn!("Previous sync still running, skipping this tick");
                    }
                    Err(e) => {
                        // Logged and dropped: the next tick is a full retry.
                        error!(error = %e, "Scheduled sync failed");
                    }
                }
            }
        });
    }
}
