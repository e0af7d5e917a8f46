//! A [log] logger writing plain text lines through a [SharedSerial].

use core::fmt::Write;

use log::{LevelFilter, Log, Metadata, Record};

use crate::SharedSerial;

// don't go too crazy here
const LINE_LEN: usize = 128;

/// A single log line, truncated to fit, always ending in a newline.
struct LineBuffer {
    len: usize,
    buffer: [u8; LINE_LEN],
}

impl LineBuffer {
    fn new() -> Self {
        Self {
            len: 0,
            buffer: [0; LINE_LEN],
        }
    }

    fn finish(&mut self) -> &[u8] {
        self.buffer[self.len] = b'\n';
        &self.buffer[..self.len + 1]
    }
}

impl Write for LineBuffer {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        // one byte is always kept back for the newline
        let amt = s.len().min(LINE_LEN - 1 - self.len);
        self.buffer[self.len..self.len + amt].copy_from_slice(&s.as_bytes()[..amt]);
        self.len += amt;
        Ok(())
    }
}

/// Logs to the same serial line the host frames go over.
///
/// Lines are written whole, so they never split a frame, but the host has
/// to be prepared to see them. A host reading with [crate::Client] takes a
/// line's leading `[` for a length prefix, so run this at
/// [LevelFilter::Error] or below unless the host skips text lines. The
/// bridge logs nothing routine above `debug`.
#[derive(Debug)]
pub struct SerialLogger<'a, T> {
    serial: &'a SharedSerial<T>,
    level: LevelFilter,
}

impl<'a, T> SerialLogger<'a, T> {
    pub const fn new(serial: &'a SharedSerial<T>, level: LevelFilter) -> Self {
        Self { serial, level }
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }
}

impl<T> SerialLogger<'static, T>
where
    T: embedded_io::Write + Send + 'static,
{
    /// Install as the global logger.
    pub fn install(&'static self) -> Result<(), log::SetLoggerError> {
        log::set_logger(self)?;
        log::set_max_level(self.level);
        Ok(())
    }
}

impl<T> Log for SerialLogger<'_, T>
where
    T: embedded_io::Write + Send,
{
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut line = LineBuffer::new();
        // intentionally ignore possible errors. This is best-effort,
        // it should not panic.
        let _ = write!(line, "[{}] {}", record.level(), record.args());
        let _ = self.serial.write_all(line.finish());
    }

    fn flush(&self) {
        let _ = self.serial.with(|tx| tx.flush());
    }
}
