//! Handles for operations running in the background.

use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use tokio::task::JoinHandle;

use crate::error::{ControlError, Result};

/// A create, update or delete running on its own task.
///
/// Await it for the outcome. Dropping the handle leaves the operation
/// running; [`Operation::abort`] stops it.
#[derive(Debug)]
#[must_use = "an operation's outcome is only observed by awaiting it"]
pub struct Operation<T> {
    handle: JoinHandle<Result<T>>,
}

impl<T: Send + 'static> Operation<T> {
    /// Run `work` on a new task.
    pub(crate) fn spawn<F>(work: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(work),
        }
    }
}

impl<T> Operation<T> {
    /// Stop the operation. Awaiting it afterwards yields
    /// `ControlError::Cancelled` unless it had already finished.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Whether the operation has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T> Future for Operation<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Poll::Ready(match ready!(Pin::new(&mut self.handle).poll(cx)) {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => Err(ControlError::Cancelled),
            Err(e) => Err(ControlError::Internal(format!("operation task failed: {e}"))),
        })
    }
}
