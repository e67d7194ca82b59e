//! Builds the ASCII command lines understood by the PSU.
//!
//! | Command        | Meaning                                  | Reply          |
//! |----------------|------------------------------------------|----------------|
//! | `VSET<ch> <v>` | set voltage on channel 1 or 2            | none           |
//! | `ISET<ch> <v>` | set current on channel                   | none           |
//! | `VOUT<ch>`     | query voltage on channel                 | one number     |
//! | `IOUT<ch>`     | query current on channel                 | one number     |
//! | `OUT<0\|1>`    | enable/disable channels 1 and 2 together | none           |
//! | `VDD0`/`VDD5`  | select the channel 3 preset              | none           |
//!
//! Every line is terminated with CR LF. Setpoints are sent with three decimal places and are not
//! range checked here.

use core::fmt::Write;

use thiserror::Error;

use crate::{
    config::COMMAND_BUFFER_LEN,
    types::{Channel, State},
};

/// A single formatted command, terminator included.
pub type CommandLine = heapless::String<COMMAND_BUFFER_LEN>;

pub const LINE_TERMINATOR: &str = "\r\n";

/// The formatted command would overflow [`COMMAND_BUFFER_LEN`].
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
#[error("Command too long")]
pub struct CommandTooLong;

/// One logical PSU operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SetVoltage(Channel, f32),
    SetCurrent(Channel, f32),
    GetVoltage(Channel),
    GetCurrent(Channel),
    SetOutputState(Channel, State),
}

impl Command {
    /// Whether the PSU answers this command with a reply line.
    pub const fn expects_reply(&self) -> bool {
        matches!(self, Command::GetVoltage(_) | Command::GetCurrent(_))
    }

    /// Format the command line to send.
    ///
    /// Returns `Ok(None)` when the channel does not support the operation, in which case nothing
    /// should be sent. Currently only a voltage setpoint on channel 3.
    pub fn encode(&self) -> Result<Option<CommandLine>, CommandTooLong> {
        let mut line = CommandLine::new();
        let written = match *self {
            Command::SetVoltage(channel, volts) => {
                if !channel.is_adjustable() {
                    return Ok(None);
                }
                write!(line, "VSET{} {:.3}", channel, volts)
            }
            Command::SetCurrent(channel, amps) => write!(line, "ISET{} {:.3}", channel, amps),
            Command::GetVoltage(channel) => write!(line, "VOUT{}", channel),
            Command::GetCurrent(channel) => write!(line, "IOUT{}", channel),
            // Channels 1 and 2 can only be enabled/disabled together.
            Command::SetOutputState(Channel::One | Channel::Two, state) => {
                write!(line, "OUT{}", state as u8)
            }
            Command::SetOutputState(Channel::Three, State::Off) => line.write_str("VDD0"),
            Command::SetOutputState(Channel::Three, State::On) => line.write_str("VDD5"),
        };
        written.map_err(|_| CommandTooLong)?;
        line.push_str(LINE_TERMINATOR).map_err(|_| CommandTooLong)?;
        Ok(Some(line))
    }
}
