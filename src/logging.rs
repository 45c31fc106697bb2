use std::path::PathBuf;
use std::str::FromStr;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub struct LogConfig {
    pub level: String,
    pub log_dir: Option<PathBuf>,
}

pub struct LoggingGuard {
    // We need to keep this guard alive for logs to be flushed
    _guards: Vec<WorkerGuard>,
}

pub fn init(config: &LogConfig) -> anyhow::Result<LoggingGuard> {
    let mut guards = Vec::new();

    // RUST_LOG takes precedence over the CLI-selected level
    let level_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::from_str(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    // Optional daily-rotated file layer
    let file_layer = match &config.log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "bctl.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            guards.push(guard);
            Some(
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false), // File logs shouldn't have ANSI colors
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(level_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(LoggingGuard { _guards: guards })
}
