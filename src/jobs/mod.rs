pub mod countdown_ticker;
pub mod notification_poller;

use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Work run on a fixed interval by a [`ScheduledTask`].
pub trait Job: Send + 'static {
    fn name(&self) -> &'static str;

    fn tick(&mut self) -> impl Future<Output = ()> + Send;

    /// Resolves when the job has to run ahead of its schedule. Never, unless
    /// the job follows some outside state.
    fn wake(&mut self) -> impl Future<Output = ()> + Send {
        std::future::pending()
    }
}

/// Handle to a fixed-interval background job. The first tick runs
/// immediately; a slow tick delays the next one instead of bunching them up.
/// A wake-up runs an extra tick without resetting the interval. Dropping the
/// handle aborts the job.
pub struct ScheduledTask {
    name: &'static str,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    pub fn spawn<J: Job>(mut job: J, period: Duration) -> Self {
        let name = job.name();
        let (shutdown, mut stop) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period.max(MIN_PERIOD));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(task = name, period_ms = period.as_millis() as u64, "scheduled task started");
            loop {
                tokio::select! {
                    _ = &mut stop => break,
                    _ = interval.tick() => job.tick().await,
                    _ = job.wake() => {
                        debug!(task = name, "woken ahead of schedule");
                        job.tick().await;
                    }
                }
            }
            debug!(task = name, "scheduled task stopped");
        });

        Self {
            name,
            shutdown: Some(shutdown),
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the job after its current tick and waits for it to exit.
    pub async fn cancel(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                warn!(task = self.name, error = ?err, "scheduled task ended abnormally");
            }
        }
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
