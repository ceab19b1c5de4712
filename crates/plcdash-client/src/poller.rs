//! Recurring refresh schedule.
//!
//! A [`Poller`] owns at most one background task. Starting it again
//! replaces the previous schedule, so a view that is shown twice never
//! ends up with two timers. Ticks that come due while the job is still
//! running are skipped, not queued.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// A named periodic job.
#[derive(Debug)]
pub struct Poller {
    name: String,
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    pub fn new(name: impl Into<String>, period: Duration) -> Self {
        Self {
            name: name.into(),
            period,
            handle: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run `job` now and then every period until stopped.
    ///
    /// Any schedule already running is cancelled first. Must be called
    /// from within a tokio runtime.
    pub fn start<F, Fut>(&mut self, mut job: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.stop();

        let period = self.period;
        let name = self.name.clone();
        info!("Starting poller '{}' every {:?}", self.name, period);

        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                debug!("poller '{}' tick", name);
                job().await;
            }
        }));
    }

    /// Cancel the schedule. Safe to call when not running.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("Stopped poller '{}'", self.name);
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_job(counter: &Arc<AtomicUsize>) -> impl FnMut() -> futures::future::Ready<()> {
        let counter = counter.clone();
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_is_immediate() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut poller = Poller::new("vars", Duration::from_secs(5));
        poller.start(counting_job(&counter));

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(poller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_keeps_single_schedule() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut poller = Poller::new("vars", Duration::from_secs(5));

        poller.start(counting_job(&counter));
        poller.start(counting_job(&counter));

        // ticks at 0s, 5s, 10s
        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut poller = Poller::new("stats", Duration::from_secs(60));
        poller.start(counting_job(&counter));
        tokio::time::sleep(Duration::from_millis(1)).await;

        poller.stop();
        poller.stop();
        assert!(!poller.is_running());

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_job_skips_ticks() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let mut poller = Poller::new("slow", Duration::from_secs(1));
        poller.start(move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2_500)).await;
            }
        });

        // runs start at 0s, 2.5s and 5s; never two at once
        tokio::time::sleep(Duration::from_millis(6_500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_schedule() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let mut poller = Poller::new("vars", Duration::from_secs(1));
            poller.start(counting_job(&counter));
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
