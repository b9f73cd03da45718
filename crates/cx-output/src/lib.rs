//! `cx-output` — where recorded events end up.
//!
//! Backends, selected by Cargo feature:
//!
//! | Feature   | Backend            | Output                                        |
//! |-----------|--------------------|-----------------------------------------------|
//! | *(none)*  | [`CsvEventWriter`] | one `time,event` CSV file                     |
//! | *(none)*  | [`MemorySink`]     | in-process `Vec<EventTime>` (tests, demos)    |
//! | `sqlite`  | `SqliteEventWriter`| `events` table in an SQLite database          |
//!
//! All backends implement [`EventSink`].  The Recorder agent buffers events
//! for the whole session and hands them to its sink in one batch when it
//! shuts down, then calls [`EventSink::finish`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use cx_output::{CsvEventWriter, NameOptions, namefile};
//!
//! let path = out_dir.join(namefile(&config.metadata, &NameOptions::default()));
//! let sink = CsvEventWriter::create(&path)?;
//! let recorder = cx_agent::recorder(Box::new(sink));
//! ```

pub mod csv_writer;
pub mod error;
pub mod memory;
pub mod naming;
pub mod row;
pub mod sink;

#[cfg(feature = "sqlite")]
pub mod sqlite;


pub use csv_writer::CsvEventWriter;
pub use error::{OutputError, OutputResult};
pub use memory::MemorySink;
pub use naming::{NameOptions, namefile, namefile_at};
pub use row::EventRow;
pub use sink::EventSink;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteEventWriter;
