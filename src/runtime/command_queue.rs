//! Dedicated worker thread with a FIFO command queue.
//!
//! Hardware that must only ever be touched from one thread is moved into a
//! [`CommandQueue`] as its context. Callers on any thread submit closures with
//! [`CommandQueue::invoke`] and await the result; the worker runs them one at a
//! time in submission order. Whenever the queue is empty the worker calls
//! [`WorkerContext::poll_events`] and sleeps for the idle interval, which is
//! where asynchronous hardware callbacks get delivered.
//!
//! # Shutdown
//!
//! Shutdown flips a flag checked between items, so the item currently running
//! always completes. Items still queued are dropped unexecuted and their callers
//! see [`CameraError::Disposed`]. The worker then runs
//! [`WorkerContext::teardown`] on itself and exits; shutdown joins it.

use std::any::Any;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::{debug, error, info, trace, warn};

use super::completion::completion;
use crate::error::{AppResult, CameraError};

/// State owned by the worker thread.
pub trait WorkerContext: Send + 'static {
    /// Called whenever the queue is empty, before the idle sleep.
    fn poll_events(&mut self);

    /// Called once on the worker after the loop has stopped.
    fn teardown(&mut self);
}

type Job<C> = Box<dyn FnOnce(&mut C) + Send>;

/// FIFO queue drained by a single named worker thread.
pub struct CommandQueue<C: WorkerContext> {
    name: String,
    tx: mpsc::UnboundedSender<Job<C>>,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<C: WorkerContext> CommandQueue<C> {
    /// Start the worker thread and move `context` into it.
    pub fn spawn(name: &str, context: C, idle_poll: Duration) -> AppResult<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let running = Arc::new(AtomicBool::new(true));

        let flag = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run_worker(context, rx, flag, idle_poll))
            .map_err(|e| CameraError::Internal(format!("failed to spawn worker: {e}")))?;

        Ok(Self {
            name: name.to_string(),
            tx,
            running,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Submit `op` to run on the worker.
    ///
    /// The closure is enqueued before this returns, so the order of `invoke`
    /// calls is the execution order regardless of when the futures are polled.
    pub fn invoke<T, F>(&self, op: F) -> impl Future<Output = AppResult<T>> + Send + 'static
    where
        T: Send + 'static,
        F: FnOnce(&mut C) -> AppResult<T> + Send + 'static,
    {
        let pending = if self.running.load(Ordering::Acquire) {
            let (token, done) = completion();
            let job: Job<C> = Box::new(move |ctx: &mut C| {
                let result = catch_unwind(AssertUnwindSafe(|| op(ctx)))
                    .unwrap_or_else(|payload| {
                        let message = panic_message(payload.as_ref());
                        error!(%message, "Queued operation panicked");
                        Err(CameraError::Internal(message))
                    });
                token.resolve(result);
            });
            self.tx
                .send(job)
                .map(|()| done)
                .map_err(|_| CameraError::Disposed)
        } else {
            Err(CameraError::Disposed)
        };

        async move { pending?.await }
    }

    /// False once shutdown has been signalled.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stop the worker and wait for it to exit.
    ///
    /// Blocks the calling thread for at most the duration of the item being
    /// executed plus one idle interval. Use [`shutdown_async`](Self::shutdown_async)
    /// from async code.
    pub fn shutdown(&self) {
        self.signal_stop();
        if let Some(handle) = self.handle.lock().take() {
            if handle.thread().id() == thread::current().id() {
                warn!(worker = %self.name, "Shutdown requested from the worker itself; not joining");
                return;
            }
            if handle.join().is_err() {
                error!(worker = %self.name, "Worker thread panicked during shutdown");
            }
        }
    }

    /// Stop the worker and join it on the blocking pool.
    pub async fn shutdown_async(&self) {
        self.signal_stop();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            match tokio::task::spawn_blocking(move || handle.join()).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => error!(worker = %self.name, "Worker thread panicked during shutdown"),
                Err(e) => error!(worker = %self.name, error = %e, "Failed to join worker thread"),
            }
        }
    }

    fn signal_stop(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            debug!(worker = %self.name, "Stopping worker");
        }
    }
}

impl<C: WorkerContext> Drop for CommandQueue<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker<C: WorkerContext>(
    mut context: C,
    mut rx: mpsc::UnboundedReceiver<Job<C>>,
    running: Arc<AtomicBool>,
    idle_poll: Duration,
) {
    info!("Worker started");

    while running.load(Ordering::Acquire) {
        match rx.try_recv() {
            Ok(job) => job(&mut context),
            Err(TryRecvError::Empty) => {
                if catch_unwind(AssertUnwindSafe(|| context.poll_events())).is_err() {
                    error!("Event poll panicked");
                }
                thread::sleep(idle_poll);
            }
            Err(TryRecvError::Disconnected) => break,
        }
    }

    // Refuse new work, then drop what is left so every waiter sees Disposed.
    rx.close();
    let mut dropped = 0usize;
    while let Ok(job) = rx.try_recv() {
        drop(job);
        dropped += 1;
    }
    if dropped > 0 {
        debug!(dropped, "Discarded queued operations at shutdown");
    }

    trace!("Running worker teardown");
    if catch_unwind(AssertUnwindSafe(|| context.teardown())).is_err() {
        error!("Worker teardown panicked");
    }
    info!("Worker stopped");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "operation panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default, Clone)]
    struct Probe {
        log: Arc<Mutex<Vec<usize>>>,
        polls: Arc<AtomicUsize>,
        torn_down: Arc<AtomicBool>,
    }

    impl WorkerContext for Probe {
        fn poll_events(&mut self) {
            self.polls.fetch_add(1, Ordering::SeqCst);
        }

        fn teardown(&mut self) {
            self.torn_down.store(true, Ordering::SeqCst);
        }
    }

    fn spawn(probe: &Probe) -> CommandQueue<Probe> {
        CommandQueue::spawn("test-worker", probe.clone(), Duration::from_millis(1)).unwrap()
    }

    #[tokio::test]
    async fn test_operations_run_in_submission_order() {
        let probe = Probe::default();
        let queue = spawn(&probe);

        let pending: Vec<_> = (0..50)
            .map(|i| {
                queue.invoke(move |ctx: &mut Probe| {
                    ctx.log.lock().push(i);
                    Ok(i)
                })
            })
            .collect();

        // Await in reverse; execution order must not depend on it.
        let mut results = Vec::new();
        for fut in pending.into_iter().rev() {
            results.push(fut.await.unwrap());
        }

        assert_eq!(*probe.log.lock(), (0..50).collect::<Vec<_>>());
        assert_eq!(results.len(), 50);
    }

    #[tokio::test]
    async fn test_operations_run_on_named_worker() {
        let queue = spawn(&Probe::default());
        let name = queue
            .invoke(|_ctx: &mut Probe| Ok(thread::current().name().map(str::to_owned)))
            .await
            .unwrap();
        assert_eq!(name.as_deref(), Some("test-worker"));
    }

    #[tokio::test]
    async fn test_errors_propagate_to_caller() {
        let queue = spawn(&Probe::default());
        let result: AppResult<()> = queue
            .invoke(|_ctx: &mut Probe| Err(CameraError::NoDevice))
            .await;
        assert_eq!(result, Err(CameraError::NoDevice));
    }

    #[tokio::test]
    async fn test_panic_does_not_kill_worker() {
        let queue = spawn(&Probe::default());
        let result: AppResult<()> = queue
            .invoke(|_ctx: &mut Probe| -> AppResult<()> { panic!("boom") })
            .await;
        assert_eq!(result, Err(CameraError::Internal("boom".into())));

        let after = queue.invoke(|_ctx: &mut Probe| Ok(7)).await;
        assert_eq!(after, Ok(7));
    }

    #[tokio::test]
    async fn test_idle_worker_polls_events() {
        let probe = Probe::default();
        let _queue = spawn(&probe);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(probe.polls.load(Ordering::SeqCst) > 0);
    }

    #[tokio::test]
    async fn test_submissions_after_shutdown_are_disposed() {
        let probe = Probe::default();
        let queue = spawn(&probe);
        queue.shutdown_async().await;

        assert!(!queue.is_running());
        assert!(probe.torn_down.load(Ordering::SeqCst));
        let result = queue.invoke(|_ctx: &mut Probe| Ok(())).await;
        assert_eq!(result, Err(CameraError::Disposed));
    }

    #[tokio::test]
    async fn test_shutdown_finishes_current_item_and_drops_the_rest() {
        let probe = Probe::default();
        let queue = spawn(&probe);
        let (started_tx, started_rx) = tokio::sync::oneshot::channel();

        let first = queue.invoke(move |ctx: &mut Probe| {
            let _ = started_tx.send(());
            thread::sleep(Duration::from_millis(100));
            ctx.log.lock().push(1);
            Ok(1)
        });
        let second = queue.invoke(|ctx: &mut Probe| {
            ctx.log.lock().push(2);
            Ok(2)
        });

        started_rx.await.unwrap();
        queue.shutdown_async().await;

        assert_eq!(first.await, Ok(1));
        assert_eq!(second.await, Err(CameraError::Disposed));
        assert_eq!(*probe.log.lock(), vec![1]);
    }
}
