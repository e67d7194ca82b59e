//! Serial line and timing configuration for talking to the PSU.
//!
//! The PSU link is fixed at 2400 baud 8N1 with inverted signal levels. Bringing the UART up is
//! left to the platform, [`SerialConfig`] only describes what it must look like.

use fugit::MicrosDurationU32;

/// Size of the buffer an outbound command line is formatted into, terminator included.
pub const COMMAND_BUFFER_LEN: usize = 32;

/// Size of the buffer a reply line is collected into.
pub const REPLY_BUFFER_LEN: usize = 32;

/// Maximum number of data bytes captured from a single reply line.
///
/// Leaves room for the null terminator inside [`REPLY_BUFFER_LEN`].
pub const MAX_REPLY_LEN: usize = 30;

/// Parity setting of the serial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
}

/// Electrical configuration of the PSU serial session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub stop_bits: u8,
    pub parity: Parity,
    /// Invert both TX and RX so a bare UART pin presents RS232-like levels.
    pub invert_signals: bool,
}

impl Default for SerialConfig {
    /// The only configuration the PSU accepts.
    fn default() -> Self {
        Self {
            baud_rate: 2400,
            data_bits: 8,
            stop_bits: 1,
            parity: Parity::None,
            invert_signals: true,
        }
    }
}

impl SerialConfig {
    /// Time taken to transmit a single character frame, start and stop bits included.
    ///
    /// About 4.2ms at 2400 baud 8N1.
    pub fn byte_time(&self) -> MicrosDurationU32 {
        let parity_bits = match self.parity {
            Parity::None => 0,
            Parity::Even | Parity::Odd => 1,
        };
        let frame_bits = 1 + self.data_bits as u32 + parity_bits + self.stop_bits as u32;
        MicrosDurationU32::micros(frame_bits * 1_000_000 / self.baud_rate.max(1))
    }
}

/// Timeouts and poll intervals used by [`crate::transport::LineTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// How long to wait for the PSU to start answering a query.
    pub first_byte_timeout: MicrosDurationU32,
    /// How long to wait for each following byte before the reply is considered complete.
    pub inter_byte_timeout: MicrosDurationU32,
    /// Wait before each check for stale receive data when flushing.
    pub flush_poll_interval: MicrosDurationU32,
    /// Sleep between readiness checks while waiting on a timeout.
    pub poll_interval: MicrosDurationU32,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            first_byte_timeout: MicrosDurationU32::millis(300),
            // Comfortably above one byte time at 2400 baud.
            inter_byte_timeout: MicrosDurationU32::millis(10),
            flush_poll_interval: MicrosDurationU32::millis(10),
            poll_interval: MicrosDurationU32::micros(100),
        }
    }
}

impl Timings {
    pub fn with_first_byte_timeout(mut self, timeout: MicrosDurationU32) -> Self {
        self.first_byte_timeout = timeout;
        self
    }

    pub fn with_inter_byte_timeout(mut self, timeout: MicrosDurationU32) -> Self {
        self.inter_byte_timeout = timeout;
        self
    }

    pub fn with_flush_poll_interval(mut self, interval: MicrosDurationU32) -> Self {
        self.flush_poll_interval = interval;
        self
    }

    pub fn with_poll_interval(mut self, interval: MicrosDurationU32) -> Self {
        self.poll_interval = interval;
        self
    }
}
