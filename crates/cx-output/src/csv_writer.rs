//! CSV output backend.
//!
//! One file per session with a `time,event` header and one row per event:
//!
//! ```csv
//! time,event
//! 0.512,lever
//! 3.004,1
//! ```

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::Writer;
use cx_core::EventTime;

use crate::sink::EventSink;
use crate::{EventRow, OutputError, OutputResult};

/// Writes recorded events to a CSV file (or any `Write`).
pub struct CsvEventWriter<W: Write = File> {
    writer:   Writer<W>,
    finished: bool,
}

impl CsvEventWriter<File> {
    /// Create (or truncate) the file at `path` and write the header row.
    pub fn create(path: &Path) -> OutputResult<Self> {
        Self::from_writer(File::create(path)?)
    }
}

impl<W: Write> CsvEventWriter<W> {
    /// Wrap an arbitrary writer and write the header row.
    pub fn from_writer(inner: W) -> OutputResult<Self> {
        let mut writer = Writer::from_writer(inner);
        writer.write_record(["time", "event"])?;
        Ok(Self { writer, finished: false })
    }
}

impl<W: Write + Send> CsvEventWriter<W> {
    /// Finish and return the underlying writer.
    pub fn into_inner(mut self) -> OutputResult<W> {
        self.finish()?;
        self.writer.into_inner().map_err(|e| OutputError::Io(e.into_error()))
    }
}

impl<W: Write + Send> EventSink for CsvEventWriter<W> {
    fn write_events(&mut self, events: &[EventTime]) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Finished);
        }
        for event in events {
            let row = EventRow::from(event);
            self.writer.write_record(&[row.time.to_string(), row.event])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.writer.flush()?;
        Ok(())
    }
}
