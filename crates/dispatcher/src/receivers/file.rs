//! FileReceiver - appends sources to a JSON lines file

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use contracts::{ContractError, Source, SourceReceiver};
use tracing::{debug, instrument};

/// Configuration for FileReceiver
#[derive(Debug, Clone)]
pub struct FileReceiverConfig {
    /// Output file, one JSON source per line
    pub path: PathBuf,
}

impl FileReceiverConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let path = params
            .get("path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./sources.jsonl"));

        Self { path }
    }
}

/// Receiver that appends every source to a file
pub struct FileReceiver {
    name: String,
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileReceiver {
    /// Open (or create) the output file in append mode
    pub fn new(name: impl Into<String>, config: FileReceiverConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)?;

        Ok(Self {
            name: name.into(),
            path: config.path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        Self::new(name, FileReceiverConfig::from_params(params))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&self, source: &Source) -> Result<(), ContractError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| ContractError::receiver_write(&self.name, "writer lock poisoned"))?;
        serde_json::to_writer(&mut *writer, source)
            .map_err(|e| ContractError::receiver_write(&self.name, e.to_string()))?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

impl SourceReceiver for FileReceiver {
    fn name(&self) -> &str {
        &self.name
    }

    fn receive(&self, source: Source) -> Result<(), ContractError> {
        self.write_line(&source)
    }

    #[instrument(name = "file_receiver_flush", skip(self), fields(receiver = %self.name))]
    fn flush(&self) -> Result<(), ContractError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| ContractError::receiver_write(&self.name, "writer lock poisoned"))?;
        writer.flush()?;
        debug!(receiver = %self.name, "FileReceiver flushed");
        Ok(())
    }
}
