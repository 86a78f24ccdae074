//! cat-facts entry point.

use anyhow::Context;
use cat_facts::{FactClient, LOGGER_CONTEXT, ServiceConfig, render_home};
use std::sync::Arc;
use structured_logger::{InMemoryMetrics, LoggerConfig, StructuredLogger, TracingConfig, init_tracing};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger_config = LoggerConfig::from_env();
    let tracing_config = TracingConfig::for_environment(logger_config.environment);
    init_tracing(&tracing_config).context("installing tracing subscriber")?;

    info!(environment = %logger_config.environment, "Starting cat-facts");

    let config = ServiceConfig::from_env().context("loading configuration")?;
    let print_metrics = config.print_metrics;

    let metrics = Arc::new(InMemoryMetrics::new());
    let logger = StructuredLogger::builder(LOGGER_CONTEXT)
        .config(&logger_config)
        .metrics(metrics.clone())
        .build()?;

    let client = FactClient::new(config, logger)?;
    let page = render_home(&client).await;

    println!("{page}");

    if print_metrics {
        let exposition = metrics
            .to_prometheus()
            .context("rendering metrics registry")?;
        println!();
        print!("{exposition}");
    }

    Ok(())
}
