//! Single-resolution completion tokens.
//!
//! A [`CompletionToken`] is the producer half of a oneshot channel that can be
//! resolved from any thread, any number of times: the first resolution wins and
//! every later attempt is a no-op. The consumer half, [`Completion`], is an
//! awaitable that yields the result.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::{AppResult, CameraError};

/// Create a linked token/completion pair.
pub fn completion<T>() -> (CompletionToken<T>, Completion<T>) {
    let (tx, rx) = oneshot::channel();
    (
        CompletionToken {
            tx: Mutex::new(Some(tx)),
        },
        Completion { rx },
    )
}

/// Producer side. Resolving it twice is harmless.
#[derive(Debug)]
pub struct CompletionToken<T> {
    tx: Mutex<Option<oneshot::Sender<AppResult<T>>>>,
}

impl<T> CompletionToken<T> {
    /// Deliver the result. Returns `false` if the token was already resolved
    /// or the waiting side is gone.
    pub fn resolve(&self, result: AppResult<T>) -> bool {
        match self.tx.lock().take() {
            Some(tx) => tx.send(result).is_ok(),
            None => false,
        }
    }

    /// Resolve with a value.
    pub fn succeed(&self, value: T) -> bool {
        self.resolve(Ok(value))
    }

    /// Resolve with an error.
    pub fn fail(&self, error: CameraError) -> bool {
        self.resolve(Err(error))
    }

    /// Whether a result has already been delivered.
    pub fn is_resolved(&self) -> bool {
        self.tx.lock().is_none()
    }
}

/// Consumer side. A token dropped without resolving reads as `Disposed`.
#[derive(Debug)]
pub struct Completion<T> {
    rx: oneshot::Receiver<AppResult<T>>,
}

impl<T> Completion<T> {
    /// Await the result for at most `timeout`.
    pub async fn wait(self, timeout: Duration) -> AppResult<T> {
        match tokio::time::timeout(timeout, self).await {
            Ok(result) => result,
            Err(_) => Err(CameraError::CaptureTimeout(timeout)),
        }
    }
}

impl<T> Future for Completion<T> {
    type Output = AppResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(CameraError::Disposed)),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_resolution_wins() {
        let (token, done) = completion::<u32>();
        assert!(token.succeed(1));
        assert!(!token.succeed(2));
        assert!(!token.fail(CameraError::NoDevice));
        assert!(token.is_resolved());
        assert_eq!(done.await, Ok(1));
    }

    #[tokio::test]
    async fn test_dropped_token_reads_as_disposed() {
        let (token, done) = completion::<()>();
        drop(token);
        assert_eq!(done.await, Err(CameraError::Disposed));
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let (_token, done) = completion::<()>();
        let timeout = Duration::from_millis(20);
        assert_eq!(
            done.wait(timeout).await,
            Err(CameraError::CaptureTimeout(timeout))
        );
    }

    #[tokio::test]
    async fn test_resolve_after_waiter_gone_is_noop() {
        let (token, done) = completion::<()>();
        drop(done);
        assert!(!token.succeed(()));
        assert!(token.is_resolved());
    }
}
