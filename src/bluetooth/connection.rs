//! Pair-then-connect retry loop.
//!
//! Attempts run immediately and then on a fixed interval until one succeeds
//! or the run is cancelled. Individual attempt failures are expected while
//! the peripheral is still coming up and are logged, never surfaced.

use std::future::Future;
use std::time::Duration;

use bluer::{Adapter, Address};
use tokio::time::{self, MissedTickBehavior};
use tracing::info;

use crate::error::{AttemptError, Error};
use crate::sync::Shutdown;

/// Delay between connection attempts.
pub const RETRY_INTERVAL: Duration = Duration::from_secs(3);

/// Connects to `target`, pairing first if necessary, retrying every
/// `interval` until success or cancellation.
pub async fn connect_with_retry(
    shutdown: &Shutdown,
    adapter: &Adapter,
    target: Address,
    interval: Duration,
) -> Result<(), Error> {
    retry_loop(shutdown, interval, || attempt(adapter, target)).await
}

/// Drives `attempt` once per tick. The first tick fires immediately; later
/// ticks follow `interval`. Only one attempt is ever in flight, and an
/// in-flight attempt is never preempted by cancellation.
async fn retry_loop<F, Fut, E>(
    shutdown: &Shutdown,
    interval: Duration,
    mut attempt: F,
) -> Result<(), Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    let mut tick = time::interval(interval);
    // A slow attempt delays later ticks instead of bursting to catch up.
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            // Checked first so shutdown wins when a tick is also pending.
            biased;
            _ = shutdown.cancelled() => return Err(Error::Cancelled),
            _ = tick.tick() => {}
        }

        match attempt().await {
            Ok(()) => return Ok(()),
            Err(err) => info!("try to connect: {err} (retry in {interval:?})"),
        }
    }
}

async fn attempt(adapter: &Adapter, target: Address) -> Result<(), AttemptError> {
    let device = adapter.device(target).map_err(AttemptError::Resolve)?;

    let paired = device.is_paired().await.map_err(AttemptError::PairingState)?;
    if !paired {
        device.pair().await.map_err(AttemptError::Pair)?;
    }

    device.connect().await.map_err(AttemptError::Connect)?;

    info!("device connected successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct TestError(&'static str);

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_first_tick_runs_no_attempt() {
        let (handle, shutdown) = Shutdown::channel();
        handle.cancel();
        let attempts = AtomicUsize::new(0);

        let result = retry_loop(&shutdown, Duration::from_secs(3), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Ok::<(), TestError>(()) }
        })
        .await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn first_attempt_is_immediate() {
        let (_handle, shutdown) = Shutdown::channel();
        let started = time::Instant::now();

        let result = retry_loop(&shutdown, Duration::from_secs(3), || async {
            Ok::<(), TestError>(())
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let (_handle, shutdown) = Shutdown::channel();
        let attempts = AtomicUsize::new(0);
        let started = time::Instant::now();

        // Pairing-state query fails once, then connect fails once, then the
        // third attempt goes through.
        let result = retry_loop(&shutdown, Duration::from_secs(3), || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                match n {
                    0 => Err(TestError("adapter busy")),
                    1 => Err(TestError("peripheral not reachable")),
                    _ => Ok(()),
                }
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_attempt_completes_despite_cancellation() {
        let (handle, shutdown) = Shutdown::channel();

        // Cancellation arrives while the attempt is in flight; the attempt
        // still finishes and its success wins.
        let result = retry_loop(&shutdown, Duration::from_secs(3), || {
            handle.cancel();
            async { Ok::<(), TestError>(()) }
        })
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_after_failed_attempt() {
        let (handle, shutdown) = Shutdown::channel();
        let attempts = AtomicUsize::new(0);

        let result = retry_loop(&shutdown, Duration::from_secs(3), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            handle.cancel();
            async { Err::<(), _>(TestError("adapter busy")) }
        })
        .await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
