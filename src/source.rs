use crate::traits::{ByteSource, TickSource};
use anyhow::{Context, Result};
use log::debug;
use std::cell::Cell;
use std::io::{ErrorKind, Read};
use std::time::Instant;

/// Millisecond counter backed by the monotonic clock, truncated to 32 bits.
pub struct SystemTicks {
    start: Instant,
}

impl SystemTicks {
    pub fn new() -> Self {
        SystemTicks { start: Instant::now() }
    }
}

impl Default for SystemTicks {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for SystemTicks {
    fn millis(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }
}

/// Settable counter for replaying recorded streams with synthetic time.
#[derive(Debug, Default)]
pub struct ManualTicks {
    now: Cell<u32>,
}

impl ManualTicks {
    pub fn new(start: u32) -> Self {
        ManualTicks { now: Cell::new(start) }
    }

    pub fn set(&self, millis: u32) {
        self.now.set(millis);
    }

    pub fn advance(&self, millis: u32) {
        self.now.set(self.now.get().wrapping_add(millis));
    }
}

impl TickSource for ManualTicks {
    fn millis(&self) -> u32 {
        self.now.get()
    }
}

const READ_CHUNK: usize = 256;

/// Buffered byte source over any reader (file, stdin, serial device node).
pub struct ReaderSource<R: Read> {
    reader: R,
    buf: [u8; READ_CHUNK],
    pos: usize,
    len: usize,
    exhausted: bool,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        ReaderSource {
            reader,
            buf: [0u8; READ_CHUNK],
            pos: 0,
            len: 0,
            exhausted: false,
        }
    }

    fn fill(&mut self) -> Result<()> {
        match self.reader.read(&mut self.buf) {
            Ok(0) => {
                debug!("Byte source reached end of stream");
                self.exhausted = true;
            }
            Ok(n) => {
                self.pos = 0;
                self.len = n;
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e).context("Failed to read NMEA byte stream"),
        }
        Ok(())
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn read_byte(&mut self) -> Result<Option<u8>> {
        if self.pos >= self.len {
            if self.exhausted {
                return Ok(None);
            }
            self.fill()?;
            if self.pos >= self.len {
                return Ok(None);
            }
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(Some(b))
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted && self.pos >= self.len
    }

    fn reset(&mut self) -> Result<()> {
        // Drop whatever was buffered before the stream was handed off.
        self.pos = 0;
        self.len = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reader_source_drains_then_exhausts() {
        let mut src = ReaderSource::new(Cursor::new(b"$GP".to_vec()));
        assert!(!src.is_exhausted());
        assert_eq!(src.read_byte().unwrap(), Some(b'$'));
        assert_eq!(src.read_byte().unwrap(), Some(b'G'));
        assert_eq!(src.read_byte().unwrap(), Some(b'P'));
        assert_eq!(src.read_byte().unwrap(), None);
        assert!(src.is_exhausted());
        assert_eq!(src.read_byte().unwrap(), None);
    }

    #[test]
    fn test_reader_source_spans_chunks() {
        let data: Vec<u8> = (0..READ_CHUNK * 2 + 7).map(|i| (i % 251) as u8).collect();
        let mut src = ReaderSource::new(Cursor::new(data.clone()));
        let mut out = Vec::new();
        while let Some(b) = src.read_byte().unwrap() {
            out.push(b);
        }
        assert_eq!(out, data);
    }

    #[test]
    fn test_reset_discards_buffered_bytes() {
        let mut src = ReaderSource::new(Cursor::new(b"abc".to_vec()));
        assert_eq!(src.read_byte().unwrap(), Some(b'a'));
        src.reset().unwrap();
        // Cursor is already drained into the buffer, so nothing remains.
        assert_eq!(src.read_byte().unwrap(), None);
    }

    #[test]
    fn test_manual_ticks_wrap() {
        let ticks = ManualTicks::new(u32::MAX - 5);
        ticks.advance(10);
        assert_eq!(ticks.millis(), 4);
        ticks.set(1_000);
        assert_eq!(ticks.millis(), 1_000);
    }

    #[test]
    fn test_system_ticks_advance() {
        let ticks = SystemTicks::new();
        let t1 = ticks.millis();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let t2 = ticks.millis();
        assert!(t2 > t1, "Tick counter should increase over time");
    }
}
