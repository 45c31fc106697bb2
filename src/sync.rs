//! Cancellation primitives shared by the scan and connect paths.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;

/// Wraps a stop action so that concurrent or repeated invocations execute it
/// at most once.
///
/// Callers racing the first invocation block until the action has completed;
/// every later call is a no-op. Clones share the same underlying action.
#[derive(Clone)]
pub struct StopOnce {
    action: Arc<Mutex<Option<Box<dyn FnOnce() + Send>>>>,
}

impl StopOnce {
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            action: Arc::new(Mutex::new(Some(Box::new(action)))),
        }
    }

    /// Runs the wrapped action if no other caller has already done so.
    pub fn stop(&self) {
        // The guard is held while the action runs so that racing callers
        // return only after it has completed.
        let Ok(mut slot) = self.action.lock() else {
            return;
        };
        if let Some(action) = slot.take() {
            action();
        }
    }
}

/// Cooperative cancellation signal for the whole run, normally fired by
/// Ctrl-C. The receiving half is cheap to clone and share across tasks.
#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

/// Sending half of [`Shutdown`]. Cancelling is idempotent.
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn channel() -> (ShutdownHandle, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (ShutdownHandle { tx }, Shutdown { rx })
    }

    /// Resolves once the run is cancelled. A dropped handle counts as
    /// cancellation so waiters are never stranded.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl ShutdownHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn stop_once_runs_action_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let gate = StopOnce::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        gate.stop();
        gate.stop();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stop_once_is_idempotent_under_concurrency() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let gate = StopOnce::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                std::thread::spawn(move || gate.stop())
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn shutdown_wakes_waiters() {
        let (handle, shutdown) = Shutdown::channel();

        let waiter = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { shutdown.cancelled().await })
        };

        handle.cancel();
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn dropped_handle_counts_as_cancellation() {
        let (handle, shutdown) = Shutdown::channel();
        drop(handle);
        shutdown.cancelled().await;
    }
}
