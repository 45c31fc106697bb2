//! Bluetooth Module
//!
//! Locates a device by MAC address and establishes a paired connection.
//!
//! ## Modules
//!
//! - [`adapter`] - local controller access
//! - [`scanner`] - background device discovery with once-only teardown
//! - [`connection`] - pair-then-connect retry loop

pub mod adapter;
pub mod connection;
pub mod scanner;
