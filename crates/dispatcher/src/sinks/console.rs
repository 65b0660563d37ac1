//! ConsoleSink - writes `bulk:` lines to stdout or any writer

use std::io::{self, Stdout, Write};

use contracts::{Batch, BatchSink, ContractError};
use tracing::{debug, instrument};

use super::bulk_line;

/// Sink that prints one `bulk: ...` line per batch
pub struct ConsoleSink<W = Stdout> {
    name: String,
    out: W,
}

impl ConsoleSink<Stdout> {
    /// Console sink on the process stdout
    pub fn stdout(name: impl Into<String>) -> Self {
        Self::new(name, io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    /// Create a console sink over an arbitrary writer
    pub fn new(name: impl Into<String>, out: W) -> Self {
        Self {
            name: name.into(),
            out,
        }
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, batch: &Batch) -> io::Result<()> {
        writeln!(self.out, "{}", bulk_line(batch))?;
        self.out.flush()
    }
}

impl<W: Write + Send> BatchSink for ConsoleSink<W> {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "console_sink_write",
        skip(self, batch),
        fields(sink = %self.name, batch_len = batch.len())
    )]
    async fn write(&mut self, batch: &Batch) -> Result<(), ContractError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.write_line(batch)
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "console_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.out
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "console_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, "ConsoleSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_sink_output() {
        let mut sink = ConsoleSink::new("test_console", Vec::new());

        sink.write(&Batch::empty()).await.unwrap();
        sink.write(&Batch::from(vec!["cmd1"])).await.unwrap();
        sink.write(&Batch::from(vec!["cmd2", "cmd3", "cmd4"]))
            .await
            .unwrap();
        sink.write(&Batch::empty()).await.unwrap();
        sink.write(&Batch::from(vec!["cmd5", "cmd6"])).await.unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            output,
            "bulk: cmd1\nbulk: cmd2, cmd3, cmd4\nbulk: cmd5, cmd6\n"
        );
    }

    #[tokio::test]
    async fn test_console_sink_name() {
        let sink = ConsoleSink::stdout("my_console");
        assert_eq!(sink.name(), "my_console");
    }
}
