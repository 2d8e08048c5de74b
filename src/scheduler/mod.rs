use crate::error::IndexError;
use futures_util::future::join_all;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Owns the recurring background jobs: registration, interval ticking,
/// and shutdown. A tick that is mid-flight when shutdown is requested
/// runs to completion (durable writes drain); ticks that have not
/// started yet are dropped.
pub struct Scheduler {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shutdown_tx,
            handles: Vec::new(),
        }
    }

    /// Registers a recurring job. The first tick fires immediately, then
    /// every `interval`. Job failures are logged and contained within
    /// the tick; the loop itself never dies.
    pub fn spawn_interval<F, Fut>(&mut self, name: &str, interval: Duration, job: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), IndexError>> + Send + 'static,
    {
        let name = name.to_string();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("⏱️ job {} registered, interval {:?}", name, interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = job().await {
                            match e {
                                IndexError::Fetch { .. }
                                | IndexError::DegradedBasket { .. }
                                | IndexError::NoComparisonData(_) => {
                                    warn!("job {} skipped cycle: {}", name, e);
                                }
                                other => error!("job {} failed: {}", name, other),
                            }
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        info!("job {} stopping", name);
                        break;
                    }
                }
            }
        });

        self.handles.push(handle);
    }

    /// Signals every job loop and waits for them to drain.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        join_all(self.handles).await;
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_job_ticks_repeatedly() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut scheduler = Scheduler::new();

        let c = Arc::clone(&counter);
        scheduler.spawn_interval("tick", Duration::from_millis(10), move || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        tokio::time::sleep(Duration::from_millis(45)).await;
        scheduler.shutdown().await;

        assert!(counter.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_shutdown_drains_in_flight_tick() {
        let completed = Arc::new(AtomicUsize::new(0));
        let mut scheduler = Scheduler::new();

        let c = Arc::clone(&completed);
        scheduler.spawn_interval("slow", Duration::from_secs(3600), move || {
            let c = Arc::clone(&c);
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        // the immediate first tick is in flight when shutdown arrives
        tokio::time::sleep(Duration::from_millis(10)).await;
        scheduler.shutdown().await;

        assert_eq!(completed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_job_does_not_kill_the_loop() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let mut scheduler = Scheduler::new();

        let c = Arc::clone(&attempts);
        scheduler.spawn_interval("flaky", Duration::from_millis(10), move || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(IndexError::fetch("test", "provider down"))
            }
        });

        tokio::time::sleep(Duration::from_millis(45)).await;
        scheduler.shutdown().await;

        assert!(attempts.load(Ordering::SeqCst) >= 2);
    }
}
