//! A device backed by a byte stream.
//!
//! `StreamDevice` reads newline-terminated lines from any `BufRead` (a
//! capture file, a pipe, a serial port opened elsewhere) and writes pin
//! changes as `"<pin> <LEVEL>\n"` to an optional sink.
//!
//! # Timeouts
//!
//! A plain `BufRead` cannot be interrupted, so `timeout` only applies once
//! the stream reaches end of input: from then on the device behaves like an
//! idle port and each read waits out its timeout.

use std::io::{BufRead, Write};
use std::time::Duration;

use tracing::debug;

use crate::{Device, DeviceResult, Level};

pub struct StreamDevice<R, W = std::io::Sink> {
    input:  R,
    output: W,
    eof:    bool,
}

impl<R: BufRead + Send> StreamDevice<R> {
    /// A read-only device; writes are discarded.
    pub fn new(input: R) -> Self {
        Self { input, output: std::io::sink(), eof: false }
    }
}

impl<R: BufRead + Send, W: Write + Send> StreamDevice<R, W> {
    /// Send pin changes to `output`.
    pub fn with_output<W2: Write + Send>(self, output: W2) -> StreamDevice<R, W2> {
        StreamDevice { input: self.input, output, eof: self.eof }
    }

    /// `true` once the input stream is exhausted.
    pub fn at_eof(&self) -> bool {
        self.eof
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead + Send, W: Write + Send> Device for StreamDevice<R, W> {
    fn read_line(&mut self, timeout: Duration) -> DeviceResult<Option<Vec<u8>>> {
        if !self.eof {
            let mut buf = Vec::new();
            if self.input.read_until(b'\n', &mut buf)? > 0 {
                while matches!(buf.last(), Some(b'\n' | b'\r')) {
                    buf.pop();
                }
                return Ok(Some(buf));
            }
            debug!("device stream reached end of input");
            self.eof = true;
        }
        std::thread::sleep(timeout);
        Ok(None)
    }

    fn digital_write(&mut self, pin: u8, level: Level) -> DeviceResult<()> {
        writeln!(self.output, "{pin} {level}")?;
        self.output.flush()?;
        Ok(())
    }

    fn cancel_read(&mut self) -> DeviceResult<()> {
        self.eof = true;
        Ok(())
    }
}
