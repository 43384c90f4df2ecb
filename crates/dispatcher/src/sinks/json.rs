//! JsonSink - writes frames as JSON lines

use contracts::{ContractError, OverlaySink, RenderedFrame};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Sink that appends one JSON object per frame to a file
pub struct JsonSink {
    name: String,
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonSink {
    /// Create (truncate) the output file, creating parent directories
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&path)?;

        Ok(Self {
            name: name.into(),
            path,
            writer: BufWriter::new(file),
        })
    }

    /// Create from params map (for factory); `path` is the output file
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        Self::new(name, super::path_param(params)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&mut self, frame: &RenderedFrame) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, frame)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.writer.write_all(b"\n")
    }

    fn sink_error(&self, e: std::io::Error) -> ContractError {
        ContractError::sink_write(&self.name, e.to_string())
    }
}

impl OverlaySink for JsonSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "json_sink_write",
        skip(self, frame),
        fields(sink = %self.name, frame_index = frame.frame_index)
    )]
    async fn write(&mut self, frame: &RenderedFrame) -> Result<(), ContractError> {
        self.write_line(frame).map_err(|e| self.sink_error(e))
    }

    #[instrument(name = "json_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.writer.flush().map_err(|e| self.sink_error(e))
    }

    #[instrument(name = "json_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.writer.flush().map_err(|e| self.sink_error(e))?;
        debug!(sink = %self.name, path = %self.path.display(), "JsonSink closed");
        Ok(())
    }
}
