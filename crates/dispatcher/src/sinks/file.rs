//! FileSink - appends `bulk:` lines to a timestamped log file

use contracts::{Batch, BatchSink, ContractError};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, instrument};

use super::bulk_line;

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Directory the log file is created in
    pub output_dir: PathBuf,
    /// Appended to the file stem, e.g. `_1` gives `bulk<nanos>_1.log`
    pub suffix: String,
}

impl FileSinkConfig {
    /// Create config from params map
    ///
    /// `output_dir` in the params overrides the given default directory.
    pub fn from_params(params: &HashMap<String, String>, default_dir: &Path) -> Self {
        let output_dir = params
            .get("output_dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_dir.to_path_buf());
        let suffix = params.get("suffix").cloned().unwrap_or_default();

        Self { output_dir, suffix }
    }
}

/// Sink that writes batches to a log file
pub struct FileSink {
    name: String,
    path: PathBuf,
    out: BufWriter<File>,
}

impl FileSink {
    /// Create a new FileSink; the file is created immediately
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.output_dir)?;

        let (path, file) = create_bulk_file(&config.output_dir, &config.suffix)?;
        debug!(path = %path.display(), "FileSink created");

        Ok(Self {
            name: name.into(),
            path,
            out: BufWriter::new(file),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
        default_dir: &Path,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params, default_dir);
        Self::new(name, config)
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist_batch(&mut self, batch: &Batch) -> Result<(), ContractError> {
        writeln!(self.out, "{}", bulk_line(batch))
            .and_then(|()| self.out.flush())
            .map_err(|e| {
                error!(sink = %self.name, path = %self.path.display(), error = %e, "Write failed");
                ContractError::sink_write(&self.name, e.to_string())
            })
    }
}

/// Attempts before giving up on finding a free file name
const MAX_NAME_ATTEMPTS: u32 = 64;

/// Create `bulk<unix-nanos><suffix>.log`, never reusing an existing file
fn create_bulk_file(dir: &Path, suffix: &str) -> std::io::Result<(PathBuf, File)> {
    let nanos = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default();
    open_unique(dir, nanos, suffix)
}

/// On collision, `-<n>` is appended to the stem
fn open_unique(dir: &Path, nanos: i64, suffix: &str) -> std::io::Result<(PathBuf, File)> {
    let mut attempt = 0;
    loop {
        let file_name = if attempt == 0 {
            format!("bulk{nanos}{suffix}.log")
        } else {
            format!("bulk{nanos}{suffix}-{attempt}.log")
        };
        let path = dir.join(file_name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt + 1 < MAX_NAME_ATTEMPTS => {
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

impl BatchSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, batch),
        fields(sink = %self.name, batch_len = batch.len())
    )]
    async fn write(&mut self, batch: &Batch) -> Result<(), ContractError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.persist_batch(batch)
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.out.flush()?;
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, path = %self.path.display(), "FileSink closed");
        Ok(())
    }
}
