//! Task handle that aborts its task when dropped.

use tokio::task::JoinHandle;
use tracing::trace;

/// Owns a spawned task and aborts it if dropped before the task finishes.
pub(crate) struct AbortOnDrop<T> {
    handle: JoinHandle<T>,
}

impl<T> AbortOnDrop<T>
where
    T: Send + 'static,
{
    pub(crate) fn spawn<F>(future: F) -> Self
    where
        F: std::future::Future<Output = T> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }

    /// Awaits the task's result.
    ///
    /// Returns `None` if the runtime cancelled the task; a panic inside the
    /// task is resumed on the caller.
    pub(crate) async fn join(&mut self) -> Option<T> {
        match (&mut self.handle).await {
            Ok(output) => Some(output),
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => {
                trace!(error = %err, "Bridged task cancelled by the runtime");
                None
            }
        }
    }
}

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        if !self.handle.is_finished() {
            trace!("Aborting bridged task");
            self.handle.abort();
        }
    }
}
