use embedded_io::{Read, ReadReady, Write};
use log::debug;

use crate::{
    command::Command,
    error::Result,
    reply::{self, NO_REPLY},
    transport::{Clock, LineTransport, ReplyLine},
    types::{Channel, State},
};

/// Something to show the user that a setpoint was just sent, typically an LED.
pub trait ActivityIndicator {
    fn set_active(&mut self);
}

/// Indicator which does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIndicator;

impl ActivityIndicator for NoIndicator {
    fn set_active(&mut self) {}
}

/// You can create a PsuAdapter from any [`LineTransport`], which itself needs a port implementing
/// [embedded_io::Read], [embedded_io::Write] & [embedded_io::ReadReady].
///
/// "set" methods are fire-and-forget, the PSU does not acknowledge them. "get" methods send a
/// query and read back the measured value, or [`NO_REPLY`] if the PSU does not answer with a
/// number.
pub struct PsuAdapter<S, C, A = NoIndicator> {
    transport: LineTransport<S, C>,
    indicator: A,
}

impl<S, C> PsuAdapter<S, C, NoIndicator>
where
    S: Read + Write + ReadReady,
    C: Clock,
{
    /// Create a new PsuAdapter without an activity indicator.
    pub fn new(transport: LineTransport<S, C>) -> Self {
        Self::with_indicator(transport, NoIndicator)
    }
}

impl<S, C, A> PsuAdapter<S, C, A>
where
    S: Read + Write + ReadReady,
    C: Clock,
    A: ActivityIndicator,
{
    pub fn with_indicator(transport: LineTransport<S, C>, indicator: A) -> Self {
        Self {
            transport,
            indicator,
        }
    }

    pub fn transport_mut(&mut self) -> &mut LineTransport<S, C> {
        &mut self.transport
    }

    /// Give back the transport and indicator.
    pub fn release(self) -> (LineTransport<S, C>, A) {
        (self.transport, self.indicator)
    }

    /// Set the output voltage of channel 1 or 2, in volts.
    ///
    /// Channel 3 has no adjustable voltage, nothing is sent for it.
    pub fn set_voltage(&mut self, channel: Channel, volts: f32) -> Result<(), S::Error> {
        let sent = self.send(Command::SetVoltage(channel, volts));
        self.indicator.set_active();
        sent
    }

    /// Return the measured output voltage in volts.
    pub fn get_voltage(&mut self, channel: Channel) -> Result<f32, S::Error> {
        self.query(Command::GetVoltage(channel))
    }

    /// Set the output current limit, in amps.
    pub fn set_current(&mut self, channel: Channel, amps: f32) -> Result<(), S::Error> {
        let sent = self.send(Command::SetCurrent(channel, amps));
        self.indicator.set_active();
        sent
    }

    /// Return the measured output current in amps.
    pub fn get_current(&mut self, channel: Channel) -> Result<f32, S::Error> {
        self.query(Command::GetCurrent(channel))
    }

    /// Enable/disable an output.
    ///
    /// Channels 1 and 2 are switched together. On channel 3 this selects the 5V (on) or 0V (off)
    /// preset.
    pub fn set_output_state(
        &mut self,
        channel: Channel,
        state: impl Into<State>,
    ) -> Result<(), S::Error> {
        self.send(Command::SetOutputState(channel, state.into()))
    }

    /// Run any command, returning the decoded reply for queries.
    pub fn execute(&mut self, command: Command) -> Result<Option<f32>, S::Error> {
        if command.expects_reply() {
            return self.query(command).map(Some);
        }
        let sent = match command {
            Command::SetVoltage(channel, volts) => self.set_voltage(channel, volts),
            Command::SetCurrent(channel, amps) => self.set_current(channel, amps),
            _ => self.send(command),
        };
        sent.map(|_| None)
    }

    fn send(&mut self, command: Command) -> Result<(), S::Error> {
        match command.encode()? {
            Some(line) => self.transport.write_bytes(line.as_bytes()),
            None => {
                debug!("{:?} not supported, nothing sent", command);
                Ok(())
            }
        }
    }

    fn query(&mut self, command: Command) -> Result<f32, S::Error> {
        // Anything still buffered belongs to an earlier command.
        self.transport.flush_receive()?;
        self.send(command)?;

        let mut line = ReplyLine::new();
        self.transport.read_line(&mut line)?;
        let value = reply::decode_or_sentinel(line.as_bytes());
        if value == NO_REPLY {
            debug!("No usable reply to {:?}: {:?}", command, line);
        }
        Ok(value)
    }
}
