//! Keeping background loops alive forever.
//!
//! A [`Supervised`] task is one unit of long-running work (the happenings
//! feed, the region sync). The [`Supervisor`] runs it, and whenever it
//! ends, successfully or not, logs the outcome, waits out a fixed cooldown
//! and runs it again. Only the [`ShutdownSignal`] stops it; an in-flight
//! run is dropped at its current suspension point and no error surfaces.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::shutdown::ShutdownSignal;

/// A unit of long-running work the [`Supervisor`] restarts on failure.
pub trait Supervised: Send + Sync + 'static {
    /// Error a single run can end with.
    type Error: Display + Send;

    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Run until failure. Returning `Ok` is treated like any other exit.
    fn run(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Restarts [`Supervised`] tasks after a cooldown until shutdown.
#[derive(Debug, Clone)]
pub struct Supervisor {
    cooldown: Duration,
    shutdown: ShutdownSignal,
}

impl Supervisor {
    /// Create a supervisor that waits `cooldown` between runs.
    pub const fn new(cooldown: Duration, shutdown: ShutdownSignal) -> Self {
        Self { cooldown, shutdown }
    }

    /// Supervise `task` until shutdown, returning how many times it failed.
    pub async fn supervise<T: Supervised>(&self, task: &T) -> u64 {
        let mut failures: u64 = 0;
        info!(task = task.name(), "Supervised task starting");

        loop {
            let outcome = tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                outcome = task.run() => outcome,
            };

            match outcome {
                Ok(()) => info!(
                    task = task.name(),
                    cooldown_ms = self.cooldown.as_millis(),
                    "Supervised task ended, restarting after cooldown"
                ),
                Err(e) => {
                    failures = failures.saturating_add(1);
                    warn!(
                        task = task.name(),
                        error = %e,
                        failures,
                        cooldown_ms = self.cooldown.as_millis(),
                        "Supervised task failed, restarting after cooldown"
                    );
                }
            }

            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                () = tokio::time::sleep(self.cooldown) => {}
            }
        }

        info!(task = task.name(), failures, "Supervised task stopped");
        failures
    }

    /// Spawn `task` under supervision on the Tokio runtime.
    pub fn spawn<T: Supervised>(&self, task: T) -> JoinHandle<u64> {
        let supervisor = self.clone();
        tokio::spawn(async move { supervisor.supervise(&task).await })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    /// Fails a fixed number of times, then blocks forever.
    struct Flaky {
        failures_left: AtomicU32,
        runs: Arc<AtomicU32>,
    }

    impl Supervised for Flaky {
        type Error = String;

        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn run(&self) -> Result<(), String> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left.saturating_sub(1), Ordering::SeqCst);
                return Err(format!("boom ({left} left)"));
            }
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn restarts_after_each_failure_until_shutdown() {
        let shutdown = ShutdownSignal::new();
        let runs = Arc::new(AtomicU32::new(0));
        let supervisor = Supervisor::new(Duration::from_secs(5), shutdown.clone());
        let handle = supervisor.spawn(Flaky {
            failures_left: AtomicU32::new(3),
            runs: Arc::clone(&runs),
        });

        // Three failures need three cooldowns before the fourth run.
        tokio::time::sleep(Duration::from_secs(16)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 4);

        shutdown.trigger();
        assert_eq!(handle.await.unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_delays_the_restart() {
        let shutdown = ShutdownSignal::new();
        let runs = Arc::new(AtomicU32::new(0));
        let supervisor = Supervisor::new(Duration::from_secs(60), shutdown.clone());
        let handle = supervisor.spawn(Flaky {
            failures_left: AtomicU32::new(1),
            runs: Arc::clone(&runs),
        });

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        shutdown.trigger();
        assert_eq!(handle.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn shutdown_before_start_never_runs() {
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();
        let runs = Arc::new(AtomicU32::new(0));
        let supervisor = Supervisor::new(Duration::from_secs(1), shutdown);
        let failures = supervisor
            .supervise(&Flaky {
                failures_left: AtomicU32::new(0),
                runs: Arc::clone(&runs),
            })
            .await;
        assert_eq!(failures, 0);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
