use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::telemetry::record::TelemetryRecord;

/// Destination for training telemetry.
pub trait TelemetrySink {
    fn record(&mut self, record: &TelemetryRecord) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Appends one JSON object per line to a file.
pub struct JsonlTelemetry {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonlTelemetry {
    pub fn create(path: &Path) -> Result<JsonlTelemetry> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(JsonlTelemetry {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TelemetrySink for JsonlTelemetry {
    fn record(&mut self, record: &TelemetryRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemoryTelemetry {
    pub records: Vec<TelemetryRecord>,
}

impl TelemetrySink for MemoryTelemetry {
    fn record(&mut self, record: &TelemetryRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}
