//! Byte level transport to the PSU: flushing stale receive data, writing command lines and
//! collecting a single reply line under a two tier timeout.
//!
//! The link runs at 2400 baud, roughly 4ms per byte. A query waits up to
//! [`Timings::first_byte_timeout`] for the PSU to start answering, then up to
//! [`Timings::inter_byte_timeout`] for each following byte. A gap longer than that ends the line.

use embedded_io::{Read, ReadReady, Write};
use fugit::{MicrosDurationU32, MicrosDurationU64, TimerInstantU64};
use log::trace;

use crate::{
    config::{MAX_REPLY_LEN, REPLY_BUFFER_LEN, Timings},
    error::{Error, Result},
};

/// Monotonic timestamp in microseconds.
pub type Instant = TimerInstantU64<1_000_000>;

/// Source of time for the transport's timeouts.
///
/// The transport only ever waits by calling [`Clock::delay`] between readiness checks.
pub trait Clock {
    fn now(&self) -> Instant;
    fn delay(&mut self, duration: MicrosDurationU32);
}

/// A reply line collected from the PSU.
///
/// The backing buffer is always null terminated directly after the captured data.
#[derive(Clone, PartialEq, Eq)]
pub struct ReplyLine {
    buf: [u8; REPLY_BUFFER_LEN],
    len: usize,
}

impl Default for ReplyLine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyLine {
    pub const fn new() -> Self {
        Self {
            buf: [0; REPLY_BUFFER_LEN],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len >= MAX_REPLY_LEN
    }

    /// Captured data, terminator excluded.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Captured data including the trailing null byte.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.buf[..=self.len]
    }

    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(self.as_bytes()).ok()
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.buf[0] = 0;
    }

    /// Append a data byte. Returns `false` once the line is full.
    fn push(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.buf[self.len] = byte;
        self.len += 1;
        self.buf[self.len] = 0;
        true
    }
}

impl core::fmt::Debug for ReplyLine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("ReplyLine")
            .field(&self.as_str().unwrap_or("<binary>"))
            .finish()
    }
}

/// Bytes which end a reply line. They are not stored.
pub const fn is_line_terminator(byte: u8) -> bool {
    matches!(byte, b'\r' | b'\n' | b'\0')
}

/// Owns the serial session to the PSU.
///
/// Every operation takes `&mut self`, so a new transaction cannot start while a reply read is
/// still outstanding.
pub struct LineTransport<S, C> {
    port: S,
    clock: C,
    timings: Timings,
}

impl<S, C> LineTransport<S, C>
where
    S: Read + Write + ReadReady,
    C: Clock,
{
    /// Wrap an already configured serial port. See [`crate::config::SerialConfig`].
    pub fn new(port: S, clock: C) -> Self {
        Self {
            port,
            clock,
            timings: Timings::default(),
        }
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn port_mut(&mut self) -> &mut S {
        &mut self.port
    }

    /// Give back the port and clock.
    pub fn release(self) -> (S, C) {
        (self.port, self.clock)
    }

    /// Drain and discard anything already sitting in the receive buffer.
    ///
    /// Waits one flush poll interval before every check and stops at the first check which finds
    /// nothing to read. Returns the number of bytes discarded.
    pub fn flush_receive(&mut self) -> Result<usize, S::Error> {
        let mut scratch = [0u8; 8];
        let mut discarded = 0;
        loop {
            self.clock.delay(self.timings.flush_poll_interval);
            if !self.port.read_ready().map_err(Error::SerialError)? {
                break;
            }
            while self.port.read_ready().map_err(Error::SerialError)? {
                let bytes_read = self.port.read(&mut scratch).map_err(Error::SerialError)?;
                if bytes_read == 0 {
                    break;
                }
                discarded += bytes_read;
            }
        }
        if discarded > 0 {
            log::debug!("Flushed {} stale bytes", discarded);
        }
        Ok(discarded)
    }

    /// Transmit all of `data`, blocking until done.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), S::Error> {
        self.port.write_all(data).map_err(Error::SerialError)?;
        self.port.flush().map_err(Error::SerialError)?;
        trace!("Sent {}", data.escape_ascii());
        Ok(())
    }

    /// Collect a single reply line into `line`, returning the number of data bytes captured.
    ///
    /// Returns 0 if nothing arrives within the first byte timeout. The first byte is always stored.
    /// After that, stops on a CR, LF or null byte (not stored), after [`MAX_REPLY_LEN`] bytes, or
    /// when the next byte does not arrive within the inter byte timeout. Any previous content of
    /// `line` is discarded.
    pub fn read_line(&mut self, line: &mut ReplyLine) -> Result<usize, S::Error> {
        line.clear();
        if !self.readable_within(self.timings.first_byte_timeout)? {
            trace!(
                "No reply within {}ms",
                self.timings.first_byte_timeout.to_millis()
            );
            return Ok(0);
        }
        loop {
            let Some(byte) = self.read_byte()? else {
                break;
            };
            // The first byte is always kept, even a stray terminator left over from a CR LF.
            if !line.is_empty() && is_line_terminator(byte) {
                break;
            }
            line.push(byte);
            if line.is_full() {
                log::debug!("Reply truncated at {} bytes", MAX_REPLY_LEN);
                break;
            }
            if !self.readable_within(self.timings.inter_byte_timeout)? {
                break;
            }
        }
        trace!("Received {:?}", line);
        Ok(line.len())
    }

    /// Poll until a byte is ready to read or `timeout` has elapsed.
    fn readable_within(&mut self, timeout: MicrosDurationU32) -> Result<bool, S::Error> {
        let deadline = self.clock.now() + MicrosDurationU64::micros(u64::from(timeout.ticks()));
        loop {
            if self.port.read_ready().map_err(Error::SerialError)? {
                return Ok(true);
            }
            if self.clock.now() >= deadline {
                return Ok(false);
            }
            self.clock.delay(self.timings.poll_interval);
        }
    }

    fn read_byte(&mut self) -> Result<Option<u8>, S::Error> {
        let mut byte = [0u8; 1];
        match self.port.read(&mut byte).map_err(Error::SerialError)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }
}
