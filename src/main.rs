mod bluetooth;
mod error;
mod logging;
mod sync;

use std::path::PathBuf;
use std::process::ExitCode;

use bluer::Address;
use clap::Parser;
use tracing::{error, info};

use crate::bluetooth::{adapter::AdapterHandle, connection, scanner};
use crate::error::Error;
use crate::sync::Shutdown;

#[derive(Parser)]
#[command(name = "bctl", version, about = "Console utility to connect to Bluetooth devices")]
struct Args {
    /// MAC address of device to connect to
    #[arg(long, value_parser = parse_address)]
    mac: Address,

    /// Enable debug logging
    #[arg(long, hide = true)]
    debug: bool,

    /// Write daily-rotated log files to this directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,
}

fn parse_address(s: &str) -> Result<Address, String> {
    s.parse().map_err(|err| format!("incorrect mac address: {err}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = logging::LogConfig {
        level: if args.debug { "debug".into() } else { "info".into() },
        log_dir: args.log_dir.clone(),
    };
    let _logging = match logging::init(&config) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("failed to initialize logging: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Cancelled) => {
            // Operator interrupt is not an application failure.
            info!("cancelled");
            ExitCode::from(130)
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Error> {
    let (shutdown_handle, shutdown) = Shutdown::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
        }
        shutdown_handle.cancel();
    });

    let adapter = AdapterHandle::default_adapter().await?;

    let mut discovery = scanner::start(adapter.adapter(), args.mac).await?;

    let result = connection::connect_with_retry(
        &shutdown,
        adapter.adapter(),
        args.mac,
        connection::RETRY_INTERVAL,
    )
    .await;

    // Stop the scan regardless of outcome and let it wind down.
    discovery.cancel();
    let _ = discovery.wait(&shutdown).await;

    result
}
