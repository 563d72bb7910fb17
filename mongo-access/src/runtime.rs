use crate::access_config::AccessConfig;
use crate::errors::{ErrorKind, MongoAccessError, MongoAccessResult};
use once_cell::sync::OnceCell;
use std::future::Future;
use tokio::runtime::{Builder, EnterGuard, Handle, Runtime};

/// Lazily started multi-threaded runtime that drives the blocking API.
///
/// Nothing is started until first needed: a blocking call, a detached
/// operation, or the creation of the driver client, which always lives here
/// so that its background monitoring outlives any caller's runtime.
pub(crate) struct BlockingRuntime {
    runtime: OnceCell<Runtime>,
    worker_threads: usize,
    thread_name: String,
}

impl BlockingRuntime {
    pub(crate) fn new(config: &AccessConfig) -> Self {
        BlockingRuntime {
            runtime: OnceCell::new(),
            worker_threads: config.worker_threads(),
            thread_name: config.thread_name().to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn is_started(&self) -> bool {
        self.runtime.get().is_some()
    }

    fn runtime(&self) -> MongoAccessResult<&Runtime> {
        self.runtime.get_or_try_init(|| {
            log::debug!(
                "Starting blocking runtime with {} worker threads",
                self.worker_threads
            );
            let runtime = Builder::new_multi_thread()
                .worker_threads(self.worker_threads)
                .thread_name(self.thread_name.clone())
                .enable_all()
                .build()?;
            Ok(runtime)
        })
    }

    /// Runs `future` to completion on the owned runtime.
    ///
    /// # Errors
    ///
    /// Returns a `RuntimeError` when called from inside an async runtime,
    /// where blocking the thread would stall (or panic) the caller's executor.
    pub(crate) fn block_on<F: Future>(&self, future: F) -> MongoAccessResult<F::Output> {
        if Handle::try_current().is_ok() {
            log::error!("Blocking mongo_access call made from inside an async runtime");
            return Err(MongoAccessError::new(
                "Blocking operations cannot run inside an async runtime, use the async variant",
                ErrorKind::RuntimeError,
            ));
        }
        Ok(self.runtime()?.block_on(future))
    }

    /// Runs `future` on the owned runtime and waits for it from the caller's
    /// context, blocking or async.
    ///
    /// # Errors
    ///
    /// Returns a `RuntimeError` if the runtime cannot start or the task
    /// panics or is cancelled.
    pub(crate) async fn run_owned<F>(&self, future: F) -> MongoAccessResult<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let task = self.runtime()?.spawn(future);
        task.await.map_err(|err| {
            log::error!("Task on the blocking runtime failed: {}", err);
            MongoAccessError::new(
                &format!("Task on the blocking runtime failed: {}", err),
                ErrorKind::RuntimeError,
            )
        })
    }

    /// Enters the owned runtime's context, if it was ever started.
    pub(crate) fn enter(&self) -> Option<EnterGuard<'_>> {
        self.runtime.get().map(|runtime| runtime.enter())
    }

    /// Spawns `future` without observing its outcome.
    ///
    /// Uses the caller's runtime when there is one, otherwise the owned one.
    pub(crate) fn spawn_detached<F>(&self, future: F) -> MongoAccessResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(future);
            }
            Err(_) => {
                self.runtime()?.spawn(future);
            }
        }
        Ok(())
    }
}

impl Drop for BlockingRuntime {
    fn drop(&mut self) {
        // shutdown_background never blocks, so dropping from async code is safe
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
