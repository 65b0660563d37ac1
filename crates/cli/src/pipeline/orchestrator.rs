//! Pipeline orchestrator: reads commands and feeds them to one session.

use std::time::Instant;

use anyhow::{Context, Result};
use contracts::BulkConfig;
use dispatcher::{DispatcherError, Registry, RegistryBuilder};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use super::PipelineStats;

/// Token that ends input early
pub const STOP_TOKEN: &str = ":stop";

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Resolved bulk configuration
    pub bulk: BulkConfig,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
    registry: Registry,
}

impl Pipeline {
    /// Create the pipeline and start every configured sink
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let registry = RegistryBuilder::new(&config.bulk)
            .build()
            .context("Failed to build sink registry")?;

        info!(sinks = registry.sink_count(), "Sinks started");
        Ok(Self { config, registry })
    }

    /// Feed whitespace-separated commands from `input` into a single session
    ///
    /// Stops at end of input or at [`STOP_TOKEN`]. The session is closed
    /// afterwards, which flushes the pending bulk and stops all sinks.
    pub async fn run<R>(&self, input: R) -> Result<PipelineStats>
    where
        R: AsyncBufRead + Unpin,
    {
        let start_time = Instant::now();
        let session = self
            .registry
            .open_session(self.config.bulk.block_size)
            .context("Failed to open session")?;

        let mut stats = PipelineStats {
            active_sinks: self.registry.sink_count(),
            ..Default::default()
        };

        // Raw lines: bytes that are not UTF-8 still make up ordinary commands
        let mut lines = input.split(b'\n');
        'input: while let Some(raw) = lines.next_segment().await.context("Failed to read input")? {
            let line = String::from_utf8_lossy(&raw);
            for command in line.split_whitespace() {
                if command == STOP_TOKEN {
                    debug!("Stop token received");
                    break 'input;
                }

                stats.commands_received += 1;
                match self.registry.receive(command, session) {
                    Ok(()) => {}
                    Err(DispatcherError::Contract(e)) => {
                        stats.commands_rejected += 1;
                        warn!(command, error = %e, "Command rejected");
                    }
                    Err(e) => return Err(e).context("Failed to dispatch command"),
                }
            }
        }

        self.registry
            .close_session(session)
            .await
            .context("Failed to close session")?;

        stats.sinks = self.registry.sink_metrics();
        stats.duration = start_time.elapsed();
        Ok(stats)
    }

    /// Close whatever is still open and stop the sinks
    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
    }
}
