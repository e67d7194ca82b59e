//! This crate adapts channel-addressed instrument requests to a bench power supply that only
//! speaks a line-oriented ASCII protocol over a slow asynchronous serial link.
//!
//! It supports `no-std` environments by default. Enable the `std` feature for [`std_clock::StdClock`].
//!
//! Supported operations, per channel:
//! * Set / read back output voltage (`VSET<ch> <v>` / `VOUT<ch>`)
//! * Set / read back output current (`ISET<ch> <v>` / `IOUT<ch>`)
//! * Enable / disable the output (`OUT<0|1>` for channels 1 and 2, `VDD0`/`VDD5` for channel 3)
//!
//! Channels 1 and 2 are adjustable and share one output enable. Channel 3 is a fixed output with
//! a 0V and a 5V preset.
//!
//! The serial port used for PSU comms should be configured like so (see [`config::SerialConfig`]):
//! * Baud rate: 2400
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: None
//! * TX and RX signal levels inverted, so the UART looks like RS232 to the PSU.
//!
//! The port must implement [`embedded_io::Read`], [`embedded_io::Write`] and
//! [`embedded_io::ReadReady`]. Timing comes from a [`transport::Clock`].

#![cfg_attr(not(any(feature = "std", test)), no_std)]

pub mod command;
pub mod config;
pub mod error;
pub mod psu;
pub mod reply;
pub mod scpi;
#[cfg(feature = "std")]
pub mod std_clock;
pub mod transport;
pub mod types;

#[cfg(test)]
mod mock_serial;
