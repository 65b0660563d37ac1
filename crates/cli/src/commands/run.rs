//! `run` command implementation.

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tracing::{info, warn};

use config_loader::{BulkConfig, ConfigLoader};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let config = resolve_config(args)?;

    info!(
        block_size = config.block_size,
        output_dir = %config.output_dir.display(),
        sinks = config.sinks.len(),
        "Configuration loaded"
    );

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let pipeline = Pipeline::new(PipelineConfig { bulk: config })
        .context("Failed to set up sinks")?;

    let input = BufReader::new(tokio::io::stdin());
    let shutdown_signal = setup_shutdown_signal();

    tokio::select! {
        result = pipeline.run(input) => {
            match result {
                Ok(stats) => stats.log_summary(),
                Err(e) => {
                    pipeline.shutdown().await;
                    return Err(e).context("Pipeline execution failed");
                }
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, flushing open session...");
            pipeline.shutdown().await;
        }
    }

    Ok(())
}

/// Merge the config file (if any) with command-line overrides
fn resolve_config(args: &RunArgs) -> Result<BulkConfig> {
    let mut config = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()).into());
            }
            info!(config = %path.display(), "Loading configuration");
            ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => BulkConfig {
            block_size: args.block_size.ok_or(CliError::MissingBlockSize)?,
            ..BulkConfig::default()
        },
    };

    // Apply CLI overrides
    if let Some(block_size) = args.block_size {
        config.block_size = block_size;
    }
    if let Some(ref output_dir) = args.output_dir {
        config.output_dir = output_dir.clone();
    }

    ConfigLoader::validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
