//! Structured logging using tracing.

use anyhow::Context;
use std::io;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use modeler_core::EngineConfig;

/// Initialize structured logging on stderr
pub fn init_logging(config: &EngineConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json_logs {
        // JSON logs for log aggregation
        let json_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_writer(io::stderr);

        registry
            .with(json_layer)
            .try_init()
            .context("Failed to set global default subscriber")?;
    } else {
        let fmt_layer = fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(io::stderr);

        registry
            .with(fmt_layer)
            .try_init()
            .context("Failed to set global default subscriber")?;
    }

    info!(json = config.json_logs, "Structured logging initialized");
    Ok(())
}
