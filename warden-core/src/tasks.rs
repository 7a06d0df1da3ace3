use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rst_common::with_logging::log::{debug, error};
use rst_common::with_tokio::tokio;
use rst_common::with_tokio::tokio::sync::{Notify, Semaphore};

use crate::identity::types::IdentityError;

/// `TaskPool` runs fire-and-forget work on a bounded number of concurrent tasks.
///
/// A spawned task never reports back to its caller. Its failure is captured as an
/// [`IdentityError::AsyncTask`] and logged, which is all the caller can expect once it
/// already answered its own request.
#[derive(Clone)]
pub struct TaskPool {
    permits: Arc<Semaphore>,
    inflight: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

struct InflightGuard {
    inflight: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        if self.inflight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

impl TaskPool {
    pub fn new(size: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(size.max(1))),
            inflight: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(Notify::new()),
        }
    }

    pub fn inflight(&self) -> usize {
        self.inflight.load(Ordering::SeqCst)
    }

    pub fn spawn<F>(&self, label: impl Into<String>, task: F)
    where
        F: Future<Output = Result<(), IdentityError>> + Send + 'static,
    {
        let label = label.into();
        let permits = self.permits.clone();

        self.inflight.fetch_add(1, Ordering::SeqCst);
        let guard = InflightGuard {
            inflight: self.inflight.clone(),
            idle: self.idle.clone(),
        };

        tokio::spawn(async move {
            let _guard = guard;
            let _permit = permits.acquire_owned().await.ok();

            debug!("[task:{label}] started");
            match task.await {
                Ok(_) => debug!("[task:{label}] finished"),
                Err(err) => {
                    let failure = IdentityError::AsyncTask(format!("{label}: {err}"));
                    error!("[task:{label}] {failure}");
                }
            }
        });
    }

    /// `wait_idle` resolves once no spawned task is running anymore
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.inflight() == 0 {
                return;
            }

            notified.await;
        }
    }
}

impl Default for TaskPool {
    fn default() -> Self {
        Self::new(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[tokio::test]
    async fn test_spawn_and_wait_idle() {
        let pool = TaskPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let counter = counter.clone();
            pool.spawn("count", async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        pool.wait_idle().await;
        assert_eq!(counter.load(Ordering::SeqCst), 5);
        assert_eq!(pool.inflight(), 0);
    }

    #[tokio::test]
    async fn test_failed_task_does_not_leak() {
        let pool = TaskPool::new(1);
        let reached = Arc::new(AtomicBool::new(false));

        pool.spawn("failing", async {
            Err(IdentityError::Upstream("agent down".to_string()))
        });

        let flag = reached.clone();
        pool.spawn("after", async move {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });

        pool.wait_idle().await;
        assert!(reached.load(Ordering::SeqCst));
    }
}
