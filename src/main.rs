//! db-prune - Main entry point.
//!
//! Reads `db.json` and `queries.sql`, then runs every statement against its
//! database. Any fatal error ends the process with a non-zero status.

use db_prune::config::Config;
use db_prune::db::{ConnectionRegistry, VendorConnector};
use db_prune::dispatch::Dispatcher;
use db_prune::models::{BatchConfig, StatementSet};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(false).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse_args();

    // Initialize logging
    init_tracing(&config);

    info!("Starting db-prune v{}", env!("CARGO_PKG_VERSION"));

    let config_path = config.resolved_config_path()?;
    let statements_path = config.resolved_statements_path()?;

    let batch = BatchConfig::load(&config_path).await?;
    let statements = StatementSet::load(&statements_path).await?;
    info!(
        databases = batch.databases.len(),
        statement_sets = statements.len(),
        "Loaded batch"
    );

    let registry = Arc::new(ConnectionRegistry::new(VendorConnector::new(
        config.connect_options(),
    )));
    let dispatcher = Dispatcher::new(registry.clone());

    let result = dispatcher.run_batch(&batch, &statements).await;
    registry.close_all().await;

    match result {
        Ok(report) => {
            if report.failed_count() > 0 {
                info!(
                    failed = report.failed_count(),
                    "Some document deletions failed, see warnings above"
                );
            }
            Ok(())
        }
        Err(e) => {
            error!(error = %e, suggestion = ?e.suggestion(), "Run failed");
            Err(e.into())
        }
    }
}
