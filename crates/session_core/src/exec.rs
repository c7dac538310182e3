//! Deferred execution and failure isolation for handlers.
//!
//! Every externally reachable operation in the server - command handlers,
//! registration callbacks, broadcast deliveries - is normalized through the
//! [`AsyncExecutor`] so that dispatch code never special-cases synchronous
//! versus asynchronous work. The executor provides three guarantees:
//!
//! 1. **Deferral** - the submitted future runs on a later scheduling turn;
//!    the caller never observes it executing inline.
//! 2. **Isolation** - an `Err` returned by the future, or a panic raised
//!    inside it, is caught and routed to an [`ErrorSink`] instead of
//!    propagating. Neither is ever fatal to the process.
//! 3. **Completion** - the caller receives a [`Completion`] future that
//!    resolves to exactly the task's return value, or the caught error.
//!
//! Scheduling failures (no runtime available to accept the work) are the
//! one exception: they are returned to the caller immediately rather than
//! reported to the sink.

use crate::error::SessionError;
use futures::FutureExt;
use once_cell::sync::Lazy;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::error;

/// Destination for errors caught by the executor.
///
/// The process-wide default ([`LogErrorSink`]) reports through `tracing`;
/// call sites may substitute their own sink per invocation, for example to
/// collect faults for a specific player's session.
pub trait ErrorSink: Send + Sync + std::fmt::Debug {
    /// Records one caught error. Implementations must not panic.
    fn report(&self, error: &SessionError);
}

/// Default error sink that reports through the process-wide logger.
#[derive(Debug, Default)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn report(&self, error: &SessionError) {
        error!("❌ Handler error: {error}");
    }
}

static DEFAULT_SINK: Lazy<Arc<LogErrorSink>> = Lazy::new(|| Arc::new(LogErrorSink));

/// Returns the process-wide default error sink.
pub fn default_error_sink() -> Arc<dyn ErrorSink> {
    DEFAULT_SINK.clone()
}

/// The outcome of a task submitted to the [`AsyncExecutor`].
///
/// Resolves to the task's return value, or the error the executor caught
/// (already reported to the sink by the time the completion resolves). If
/// the runtime drops the task before it finishes - shutdown, for example -
/// the completion resolves to a [`SessionError::Scheduling`] error.
pub struct Completion<T> {
    receiver: oneshot::Receiver<Result<T, SessionError>>,
}

impl<T> Future for Completion<T> {
    type Output = Result<T, SessionError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(SessionError::Scheduling(
                "task dropped before completion".to_string(),
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Uniform deferred-execution wrapper for handlers.
///
/// Cheap to clone and share; the only state is the default error sink.
///
/// # Examples
///
/// ```rust
/// use session_core::{AsyncExecutor, SessionError};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), SessionError> {
/// let executor = AsyncExecutor::new();
/// let completion = executor.run(async { Ok::<_, SessionError>(21 * 2) })?;
/// assert_eq!(completion.await?, 42);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AsyncExecutor {
    default_sink: Arc<dyn ErrorSink>,
}

impl AsyncExecutor {
    /// Creates an executor reporting to the process-wide default sink.
    pub fn new() -> Self {
        Self {
            default_sink: default_error_sink(),
        }
    }

    /// Creates an executor with a custom default sink.
    pub fn with_sink(sink: Arc<dyn ErrorSink>) -> Self {
        Self { default_sink: sink }
    }

    /// Schedules `task` on the current runtime, reporting failures to the
    /// executor's default sink.
    ///
    /// # Returns
    ///
    /// `Ok(Completion)` once the task has been queued, or
    /// `Err(SessionError::Scheduling)` if no runtime is available to accept
    /// it. Scheduling failures are never reported to the sink - the caller
    /// must handle them.
    pub fn run<T, F>(&self, task: F) -> Result<Completion<T>, SessionError>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, SessionError>> + Send + 'static,
    {
        self.run_with_sink(task, self.default_sink.clone())
    }

    /// Schedules `task` with a per-invocation error sink override.
    pub fn run_with_sink<T, F>(
        &self,
        task: F,
        sink: Arc<dyn ErrorSink>,
    ) -> Result<Completion<T>, SessionError>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, SessionError>> + Send + 'static,
    {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| SessionError::Scheduling(e.to_string()))?;
        let (sender, receiver) = oneshot::channel();

        handle.spawn(async move {
            let outcome = match std::panic::AssertUnwindSafe(task).catch_unwind().await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => {
                    sink.report(&err);
                    Err(err)
                }
                Err(panic) => {
                    let err = SessionError::HandlerFailure(panic_message(panic));
                    sink.report(&err);
                    Err(err)
                }
            };
            // The caller may have dropped the completion; that is fine, the
            // error has already been reported.
            let _ = sender.send(outcome);
        });

        Ok(Completion { receiver })
    }
}

impl Default for AsyncExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts a readable message from a caught panic payload.
fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}
