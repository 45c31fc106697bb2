//! Local Bluetooth controller access.

use bluer::{Adapter, Session};
use tracing::info;

use crate::error::Error;

/// Handle to the local Bluetooth controller.
///
/// Owns the underlying BlueZ session for the lifetime of the process. The
/// adapter identifier never changes once the handle exists.
pub struct AdapterHandle {
    _session: Session,
    adapter: Adapter,
}

impl AdapterHandle {
    /// Opens the default controller and powers it on.
    pub async fn default_adapter() -> Result<Self, Error> {
        let session = Session::new().await.map_err(Error::Setup)?;
        let adapter = session.default_adapter().await.map_err(Error::Setup)?;
        adapter.set_powered(true).await.map_err(Error::Setup)?;

        info!("using bluetooth adapter {}", adapter.name());

        Ok(Self {
            _session: session,
            adapter,
        })
    }

    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }
}
