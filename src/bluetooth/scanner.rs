//! Device discovery.
//!
//! Runs the adapter's discovery session in a background task, watching the
//! event stream for the target address. The scan is torn down exactly once,
//! whether the target was found, the caller cancelled, or the stream closed.

use bluer::{Adapter, AdapterEvent, Address};
use futures::{Stream, StreamExt};
use tokio::sync::oneshot;
use tracing::{info, trace};

use crate::error::Error;
use crate::sync::{Shutdown, StopOnce};

/// An active discovery session.
///
/// Dropping the session stops the scan if nothing else has already done so.
pub struct Discovery {
    stop: StopOnce,
    done: oneshot::Receiver<()>,
}

/// Starts discovery on `adapter` and watches for `target` in the background.
///
/// Fails if the adapter rejects the scan request; that is fatal to the run.
pub async fn start(adapter: &Adapter, target: Address) -> Result<Discovery, Error> {
    let events = adapter
        .discover_devices()
        .await
        .map_err(Error::DiscoveryStart)?;

    let (stop_tx, stop_rx) = oneshot::channel();
    let stop = StopOnce::new(move || {
        let _ = stop_tx.send(());
    });

    let (done_tx, done) = oneshot::channel();
    let gate = stop.clone();
    tokio::spawn(async move {
        // Dropped on exit: closes the completion signal, and the event
        // stream going out of scope ends the underlying discovery session.
        let _done = done_tx;
        scan_loop(events, target, stop_rx, gate).await;
    });

    Ok(Discovery { stop, done })
}

impl Discovery {
    /// Stops the scan. Safe to call repeatedly or from concurrent paths;
    /// the underlying teardown runs at most once.
    pub fn cancel(&self) {
        self.stop.stop();
    }

    /// Blocks until discovery has concluded or the run is cancelled,
    /// whichever happens first. Does not itself stop the scan.
    pub async fn wait(&mut self, shutdown: &Shutdown) -> Result<(), Error> {
        tokio::select! {
            _ = shutdown.cancelled() => Err(Error::Cancelled),
            _ = &mut self.done => Ok(()),
        }
    }
}

impl Drop for Discovery {
    fn drop(&mut self) {
        self.stop.stop();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanOutcome {
    Matched,
    StreamEnded,
    Stopped,
}

async fn scan_loop<S>(
    events: S,
    target: Address,
    mut stop_rx: oneshot::Receiver<()>,
    gate: StopOnce,
) -> ScanOutcome
where
    S: Stream<Item = AdapterEvent>,
{
    tokio::pin!(events);
    info!("discovery started");

    loop {
        tokio::select! {
            _ = &mut stop_rx => {
                info!("discovery stopped");
                return ScanOutcome::Stopped;
            }
            event = events.next() => match event {
                Some(AdapterEvent::DeviceAdded(addr)) => {
                    trace!("scanned device {addr}");
                    if addr == target {
                        info!("expected device found");
                        gate.stop();
                        return ScanOutcome::Matched;
                    }
                }
                Some(event) => trace!("ignoring adapter event {event:?}"),
                None => {
                    info!("discovery stream closed");
                    return ScanOutcome::StreamEnded;
                }
            }
        }
    }
}
