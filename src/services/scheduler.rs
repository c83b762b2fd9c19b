//! Scheduled Tasks
//!
//! Periodic and one-shot background jobs as cancellable handles. Whoever spawns a
//! job owns its handle; dropping the handle aborts the job, so a torn-down panel
//! can never keep refreshing a view that is gone.
//!
//! ```text
//! spawn_periodic("tunnels.poll", 30s, job)   ──► TaskHandle (owned by synchronizer)
//! spawn_delayed("tunnels.settle", 2s, job)   ──► TaskHandle ──► TaskSet
//! ```

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Handle to a spawned background job
#[derive(Debug)]
pub struct TaskHandle {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl TaskHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Abort the job. Idempotent.
    pub fn cancel(&self) {
        if !self.handle.is_finished() {
            tracing::debug!(task = self.name, "Cancelling task");
        }
        self.handle.abort();
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawn a named job on the current tokio runtime
pub fn spawn_named<F>(name: &'static str, future: F) -> TaskHandle
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::debug!(task = name, "Spawning task");
    let handle = tokio::spawn(async move {
        future.await;
        tracing::debug!(task = name, "Task completed");
    });
    TaskHandle { name, handle }
}

/// Run `job` every `period`. The first run happens one full period after spawning;
/// missed ticks are skipped rather than replayed in a burst.
pub fn spawn_periodic<F, Fut>(name: &'static str, period: Duration, mut job: F) -> TaskHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    spawn_named(name, async move {
        let start = tokio::time::Instant::now() + period;
        let mut ticker = tokio::time::interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            job().await;
        }
    })
}

/// Run `job` once after `delay`
pub fn spawn_delayed<Fut>(name: &'static str, delay: Duration, job: Fut) -> TaskHandle
where
    Fut: Future<Output = ()> + Send + 'static,
{
    spawn_named(name, async move {
        tokio::time::sleep(delay).await;
        job.await;
    })
}

/// Outstanding one-shot jobs of a single owner
#[derive(Debug, Default)]
pub struct TaskSet {
    tasks: Mutex<Vec<TaskHandle>>,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a handle, pruning jobs that already finished
    pub fn insert(&self, handle: TaskHandle) {
        let mut tasks = self.tasks.lock();
        tasks.retain(|t| !t.is_finished());
        tasks.push(handle);
    }

    /// Number of jobs that have not finished yet
    pub fn pending(&self) -> usize {
        self.tasks.lock().iter().filter(|t| !t.is_finished()).count()
    }

    pub fn cancel_all(&self) {
        let drained: Vec<TaskHandle> = self.tasks.lock().drain(..).collect();
        for task in &drained {
            task.cancel();
        }
    }
}
