//! JSON and NDJSON output writer

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use super::{OutputError, OutputFormat, OutputResult, OutputWriter, RecordsWriter};
use crate::Record;

const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Writes records as a JSON array or as NDJSON
pub struct JsonRecordsWriter<W: Write> {
    writer: BufWriter<W>,
    format: OutputFormat,
    records_written: u64,
}

impl JsonRecordsWriter<File> {
    /// Create a writer on a new file, creating parent directories as needed
    pub fn create<P: AsRef<Path>>(path: P, format: OutputFormat) -> OutputResult<Self> {
        let path = path.as_ref();
        info!("Creating {:?} writer: path={}", format, path.display());

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::IoError(format!("Failed to create directory: {e}")))?;
        }

        let file = File::create(path)
            .map_err(|e| OutputError::IoError(format!("Failed to create file: {e}")))?;
        Self::new(file, format)
    }
}

impl JsonRecordsWriter<io::Stdout> {
    /// Create a writer on standard output
    pub fn stdout(format: OutputFormat) -> OutputResult<Self> {
        Self::new(io::stdout(), format)
    }
}

impl<W: Write> JsonRecordsWriter<W> {
    /// Wrap any writer
    pub fn new(inner: W, format: OutputFormat) -> OutputResult<Self> {
        let mut writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, inner);
        if format == OutputFormat::Json {
            writer.write_all(b"[").map_err(io_error)?;
        }
        Ok(Self {
            writer,
            format,
            records_written: 0,
        })
    }

    /// Number of records written so far
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Finish the document and hand back the inner writer
    pub fn into_inner(mut self) -> OutputResult<W> {
        self.finish()?;
        self.writer
            .into_inner()
            .map_err(|e| OutputError::FlushError(e.to_string()))
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.format == OutputFormat::Json {
            let tail: &[u8] = if self.records_written == 0 { b"]\n" } else { b"\n]\n" };
            self.writer.write_all(tail).map_err(io_error)?;
        }
        self.flush()
    }
}

impl<W: Write> RecordsWriter for JsonRecordsWriter<W> {
    fn write_record(&mut self, record: &Record) -> OutputResult<()> {
        match self.format {
            OutputFormat::Json => {
                let separator: &[u8] = if self.records_written == 0 { b"\n" } else { b",\n" };
                self.writer.write_all(separator).map_err(io_error)?;
                serde_json::to_writer_pretty(&mut self.writer, record)
                    .map_err(|e| OutputError::SerializationError(e.to_string()))?;
            }
            OutputFormat::Ndjson => {
                serde_json::to_writer(&mut self.writer, record)
                    .map_err(|e| OutputError::SerializationError(e.to_string()))?;
                self.writer.write_all(b"\n").map_err(io_error)?;
            }
        }

        self.records_written += 1;
        if self.records_written % 10_000 == 0 {
            debug!("Progress: {} records written", self.records_written);
        }
        Ok(())
    }
}

impl<W: Write> OutputWriter for JsonRecordsWriter<W> {
    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {e}")))
    }

    fn close(mut self) -> OutputResult<()> {
        self.finish()?;
        info!("Writer closed: {} records written", self.records_written);
        Ok(())
    }
}

fn io_error(e: io::Error) -> OutputError {
    OutputError::IoError(e.to_string())
}
