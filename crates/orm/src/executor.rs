use futures::future::BoxFuture;
use tokio::runtime::Handle;

/// Runs fire-and-forget tasks for the asynchronous write variants.
///
/// Tasks report their own failures (they log them); `execute` returns
/// immediately and conveys nothing back to the caller.
pub trait Executor: Send + Sync + 'static {
    /// Submit a task.
    fn execute(&self, task: BoxFuture<'static, ()>);
}

/// [`Executor`] spawning onto a tokio runtime.
///
/// Without an explicit handle the ambient runtime of the submitting thread is
/// used. When no runtime is available the task is dropped and an error logged.
#[derive(Debug, Clone, Default)]
pub struct TokioExecutor {
    handle: Option<Handle>,
}

impl TokioExecutor {
    /// Spawn onto the given runtime.
    #[must_use]
    pub const fn new(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Capture the current thread's runtime, if any.
    #[must_use]
    pub fn current() -> Self {
        Self {
            handle: Handle::try_current().ok(),
        }
    }
}

impl Executor for TokioExecutor {
    fn execute(&self, task: BoxFuture<'static, ()>) {
        match self.handle.clone().or_else(|| Handle::try_current().ok()) {
            Some(handle) => drop(handle.spawn(task)),
            None => tracing::error!("no tokio runtime available, async write dropped"),
        }
    }
}
