//! We use this mocking module in unit tests to emulate a serial port attached to the PSU.
//!
//! Time is simulated. [`MockClock`] shares its time with the [`MockSerial`] it came from, and
//! scripted receive bytes only become readable once the clock has reached their arrival time.

use std::{cell::Cell, rc::Rc};

use fugit::MicrosDurationU32;
use thiserror::Error;

use crate::transport::{Clock, Instant};

/// Time one character takes on the wire at 2400 baud 8N1.
pub const BYTE_TIME_US: u64 = 4_166;

/// Delay between the end of a command and the start of the scripted PSU response.
pub const RESPONSE_LATENCY_US: u64 = 20_000;

/// Simulated clock. Only moves forward when someone waits on it.
#[derive(Clone, Default)]
pub struct MockClock {
    now_us: Rc<Cell<u64>>,
    delays: Rc<Cell<usize>>,
}

impl MockClock {
    /// Microseconds since the mock was created.
    pub fn elapsed_us(&self) -> u64 {
        self.now_us.get()
    }

    /// Number of times [`Clock::delay`] has been called.
    pub fn delay_count(&self) -> usize {
        self.delays.get()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        Instant::from_ticks(self.now_us.get())
    }

    fn delay(&mut self, duration: MicrosDurationU32) {
        self.now_us.set(self.now_us.get() + u64::from(duration.ticks()));
        self.delays.set(self.delays.get() + 1);
    }
}

/// Our mock type used to emulate a serial port.
pub struct MockSerial {
    /// Buffer to store data written to the mock serial port
    write_buffer: heapless::Vec<u8, 256>,
    /// Pre-configured response bytes, each with the time in microseconds it becomes readable
    read_buffer: heapless::Vec<(u8, u64), 256>,
    /// Current position in the read buffer
    read_position: usize,
    /// Response to schedule after the next write
    pending_response: heapless::Vec<u8, 64>,
    clock: MockClock,
    /// Flag to simulate write errors
    should_error_on_write: bool,
    /// Flag to simulate read errors
    should_error_on_read: bool,
}

#[derive(Error, Debug)]
pub enum MockSerialError {
    /// Simulated buffer overflow
    #[error("Buffer overflow")]
    BufferOverflow,
    /// Generic simulated error for testing
    #[error("Simulated error")]
    SimulatedError,
    /// Would block - no data available
    #[error("Would block")]
    WouldBlock,
}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::BufferOverflow => embedded_io::ErrorKind::OutOfMemory,
            MockSerialError::SimulatedError => embedded_io::ErrorKind::Other,
            MockSerialError::WouldBlock => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }

        let available_space = self.write_buffer.capacity() - self.write_buffer.len();
        if buf.len() > available_space {
            return Err(MockSerialError::BufferOverflow);
        }

        self.write_buffer
            .extend_from_slice(buf)
            .map_err(|_| MockSerialError::BufferOverflow)?;

        if !self.pending_response.is_empty() {
            let response = core::mem::take(&mut self.pending_response);
            let start = self.clock.elapsed_us() + RESPONSE_LATENCY_US;
            self.schedule_at(&response, start)?;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }

        let now = self.clock.elapsed_us();
        let arrived = self.read_buffer[self.read_position..]
            .iter()
            .take_while(|(_, at)| *at <= now)
            .count();
        if arrived == 0 {
            return Err(MockSerialError::WouldBlock);
        }

        let bytes_to_read = core::cmp::min(buf.len(), arrived);
        for (slot, (byte, _)) in buf
            .iter_mut()
            .zip(&self.read_buffer[self.read_position..self.read_position + bytes_to_read])
        {
            *slot = *byte;
        }

        self.read_position += bytes_to_read;
        Ok(bytes_to_read)
    }
}

impl embedded_io::ReadReady for MockSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }
        let now = self.clock.elapsed_us();
        Ok(self
            .read_buffer
            .get(self.read_position)
            .is_some_and(|(_, at)| *at <= now))
    }
}

impl MockSerial {
    /// Create a new MockSerial instance with empty buffers and its own clock
    pub fn new() -> Self {
        Self {
            write_buffer: heapless::Vec::new(),
            read_buffer: heapless::Vec::new(),
            read_position: 0,
            pending_response: heapless::Vec::new(),
            clock: MockClock::default(),
            should_error_on_write: false,
            should_error_on_read: false,
        }
    }

    /// A handle to the simulated clock driving this port.
    pub fn clock(&self) -> MockClock {
        self.clock.clone()
    }

    /// Replace the receive data with `data`, all of it readable straight away.
    pub fn set_read_data(&mut self, data: &[u8]) -> Result<(), MockSerialError> {
        self.read_buffer.clear();
        self.read_position = 0;
        let now = self.clock.elapsed_us();
        for &byte in data {
            self.read_buffer
                .push((byte, now))
                .map_err(|_| MockSerialError::BufferOverflow)?;
        }
        Ok(())
    }

    /// Append `data` arriving at the line rate, the first byte `start` after the mock was created.
    pub fn schedule_read_data(&mut self, data: &[u8], start: MicrosDurationU32) {
        self.schedule_at(data, u64::from(start.ticks()))
            .expect("mock read buffer full");
    }

    /// Have the PSU answer the next written command with `data`.
    pub fn respond_with(&mut self, data: &[u8]) {
        self.pending_response.clear();
        self.pending_response
            .extend_from_slice(data)
            .expect("mock response too long");
    }

    fn schedule_at(&mut self, data: &[u8], start_us: u64) -> Result<(), MockSerialError> {
        for (i, &byte) in data.iter().enumerate() {
            self.read_buffer
                .push((byte, start_us + i as u64 * BYTE_TIME_US))
                .map_err(|_| MockSerialError::BufferOverflow)?;
        }
        Ok(())
    }

    /// Number of receive bytes not yet read, whether they have arrived or not.
    pub fn remaining_read_data(&self) -> usize {
        self.read_buffer.len() - self.read_position
    }

    /// Get a reference to the data that was written to this mock serial port
    pub fn written_data(&self) -> &[u8] {
        &self.write_buffer
    }

    /// Clear the write buffer
    pub fn clear_written_data(&mut self) {
        self.write_buffer.clear();
    }

    /// Configure whether write operations should fail with an error
    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }

    /// Configure whether read operations should fail with an error
    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Error, Read, ReadReady, Write};

    #[test]
    fn test_new_mock_serial() {
        let mock = MockSerial::new();
        assert_eq!(mock.written_data().len(), 0);
        assert_eq!(mock.remaining_read_data(), 0);
        assert_eq!(mock.clock().elapsed_us(), 0);
    }

    #[test]
    fn test_write_multiple_times() {
        let mut mock = MockSerial::new();
        mock.write(b"VSET1 ").unwrap();
        mock.write(b"5.000\r\n").unwrap();
        assert_eq!(mock.written_data(), b"VSET1 5.000\r\n");

        mock.clear_written_data();
        assert!(mock.written_data().is_empty());
    }

    #[test]
    fn test_write_buffer_overflow() {
        let mut mock = MockSerial::new();
        let large_data = [0u8; 300]; // Larger than 256 byte capacity

        let result = mock.write(&large_data);
        assert!(matches!(result, Err(MockSerialError::BufferOverflow)));
    }

    #[test]
    fn test_read_when_no_data() {
        let mut mock = MockSerial::new();
        let mut buffer = [0u8; 10];

        assert!(!mock.read_ready().unwrap());
        assert!(matches!(
            mock.read(&mut buffer),
            Err(MockSerialError::WouldBlock)
        ));
    }

    #[test]
    fn test_read_partial_data() {
        let mut mock = MockSerial::new();
        mock.set_read_data(b"Long response data").unwrap();

        let mut buffer = [0u8; 5];
        assert_eq!(mock.read(&mut buffer).unwrap(), 5);
        assert_eq!(&buffer, b"Long ");
        assert_eq!(mock.remaining_read_data(), 13);
    }

    #[test]
    fn test_scheduled_bytes_arrive_over_time() {
        let mut mock = MockSerial::new();
        let mut clock = mock.clock();
        mock.schedule_read_data(b"ab", MicrosDurationU32::millis(1));

        assert!(!mock.read_ready().unwrap());
        clock.delay(MicrosDurationU32::millis(1));
        assert!(mock.read_ready().unwrap());

        // Only the first byte has arrived so far.
        let mut buffer = [0u8; 4];
        assert_eq!(mock.read(&mut buffer).unwrap(), 1);
        assert!(!mock.read_ready().unwrap());

        clock.delay(MicrosDurationU32::micros(BYTE_TIME_US as u32));
        assert_eq!(mock.read(&mut buffer).unwrap(), 1);
        assert_eq!(buffer[0], b'b');
    }

    #[test]
    fn test_respond_with_schedules_after_write() {
        let mut mock = MockSerial::new();
        let mut clock = mock.clock();
        mock.respond_with(b"1.0\r\n");
        assert_eq!(mock.remaining_read_data(), 0);

        mock.write(b"VOUT1\r\n").unwrap();
        assert_eq!(mock.remaining_read_data(), 5);
        assert!(!mock.read_ready().unwrap());

        clock.delay(MicrosDurationU32::micros(RESPONSE_LATENCY_US as u32));
        assert!(mock.read_ready().unwrap());

        // Only answers once.
        mock.write(b"VOUT1\r\n").unwrap();
        assert_eq!(mock.remaining_read_data(), 5);
    }

    #[test]
    fn test_clock_counts_delays() {
        let mut clock = MockClock::default();
        clock.delay(MicrosDurationU32::millis(10));
        clock.delay(MicrosDurationU32::micros(5));
        assert_eq!(clock.elapsed_us(), 10_005);
        assert_eq!(clock.delay_count(), 2);
        assert_eq!(clock.now(), Instant::from_ticks(10_005));
    }

    #[test]
    fn test_error_simulation() {
        let mut mock = MockSerial::new();
        mock.set_read_data(b"data").unwrap();
        mock.set_read_error(true);
        mock.set_write_error(true);

        let mut buffer = [0u8; 10];
        assert!(matches!(
            mock.read(&mut buffer),
            Err(MockSerialError::SimulatedError)
        ));
        assert!(mock.read_ready().is_err());
        assert!(mock.write(b"test").is_err());
        assert!(mock.flush().is_err());
        assert_eq!(mock.written_data().len(), 0);

        mock.set_read_error(false);
        mock.set_write_error(false);
        assert_eq!(mock.read(&mut buffer).unwrap(), 4);
        assert!(mock.write(b"test").is_ok());
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(
            MockSerialError::BufferOverflow.kind(),
            embedded_io::ErrorKind::OutOfMemory
        ));
        assert!(matches!(
            MockSerialError::SimulatedError.kind(),
            embedded_io::ErrorKind::Other
        ));
    }
}
