//! Error taxonomy for the discovery and connection paths.

use thiserror::Error;

/// Terminal conditions surfaced to the operator.
#[derive(Debug, Error)]
pub enum Error {
    /// The local controller could not be opened or powered on. Fatal.
    #[error("get default adapter: {0}")]
    Setup(#[source] bluer::Error),

    /// The adapter rejected the discovery request. Fatal, no retry.
    #[error("discover devices: {0}")]
    DiscoveryStart(#[source] bluer::Error),

    /// The run was cancelled by the operator. Not an application failure.
    #[error("cancelled")]
    Cancelled,
}

/// Failure of a single pair-and-connect attempt. Never surfaced to the
/// caller; logged and retried on the next tick.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("get device: {0}")]
    Resolve(#[source] bluer::Error),

    #[error("check already paired: {0}")]
    PairingState(#[source] bluer::Error),

    #[error("pair with device: {0}")]
    Pair(#[source] bluer::Error),

    #[error("connect to device: {0}")]
    Connect(#[source] bluer::Error),
}
