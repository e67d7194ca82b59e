//! Glue between an SCPI style command dispatcher and the [`PsuAdapter`].
//!
//! The dispatcher itself (pattern matching, parameter parsing, result formatting) lives
//! elsewhere. It is reached through the narrow [`CommandContext`] interface: the handlers here
//! pull the channel suffix and parameter out of it and push back either a result or an error.
//!
//! Register the handlers under the patterns in [`SOURCE_COMMANDS`], where `#` is the channel
//! suffix (1-3), e.g. `SOUR2:VOLT:LEV:IMM:AMPL 12.5` or `SOUR1:CURR:LEV:IMM:AMPL?`.

use embedded_io::{Read, ReadReady, Write};
use log::warn;
use strum_macros::EnumIter;

use crate::{
    error::Error,
    psu::{ActivityIndicator, PsuAdapter},
    transport::Clock,
    types::{Channel, InvalidChannel},
};

/// Errors reported back to the dispatcher, with their SCPI error queue codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum ScpiError {
    /// -109, a required parameter was not supplied.
    MissingParameter = -109,
    /// -114, header suffix out of range. The channel is not 1-3.
    InvalidSuffix = -114,
    /// -240, the PSU could not be talked to.
    HardwareError = -240,
}

impl ScpiError {
    pub const fn code(self) -> i16 {
        self as i16
    }
}

/// Outcome of a handler, as returned to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    Ok,
    Error,
}

/// What the handlers need from the dispatcher for the command being processed.
pub trait CommandContext {
    /// Numeric suffix of the command header, i.e. the `#` in `SOURce#`.
    fn channel_suffix(&mut self) -> i32;
    /// Next parameter as a float, `None` if missing or not a number.
    fn param_f32(&mut self) -> Option<f32>;
    /// Next parameter as an integer, `None` if missing or not a number.
    fn param_i32(&mut self) -> Option<i32>;
    /// Report a query result.
    fn result_f32(&mut self, value: f32);
    /// Queue an error.
    fn push_error(&mut self, error: ScpiError);
}

/// The PSU command handlers.
#[derive(Debug, EnumIter, PartialEq, Eq, Clone, Copy)]
pub enum SourceCommand {
    Voltage,
    VoltageQuery,
    Current,
    CurrentQuery,
    OutputState,
}

/// Command patterns in SCPI long/short form, paired with their handler.
pub const SOURCE_COMMANDS: [(&str, SourceCommand); 5] = [
    (
        "SOURce#:VOLTage:LEVel:IMMediate:AMPlitude",
        SourceCommand::Voltage,
    ),
    (
        "SOURce#:VOLTage:LEVel:IMMediate:AMPlitude?",
        SourceCommand::VoltageQuery,
    ),
    (
        "SOURce#:CURRent:LEVel:IMMediate:AMPlitude",
        SourceCommand::Current,
    ),
    (
        "SOURce#:CURRent:LEVel:IMMediate:AMPlitude?",
        SourceCommand::CurrentQuery,
    ),
    ("SOURce#:OUTPut:STATe", SourceCommand::OutputState),
];

impl SourceCommand {
    pub fn pattern(self) -> &'static str {
        SOURCE_COMMANDS
            .iter()
            .find(|(_, command)| *command == self)
            .map(|(pattern, _)| *pattern)
            .unwrap_or_default()
    }

    pub fn from_pattern(pattern: &str) -> Option<Self> {
        SOURCE_COMMANDS
            .iter()
            .find(|(candidate, _)| *candidate == pattern)
            .map(|(_, command)| *command)
    }

    /// Run the handler for this command.
    pub fn handle<X, S, C, A>(
        self,
        context: &mut X,
        psu: &mut PsuAdapter<S, C, A>,
    ) -> CommandResult
    where
        X: CommandContext,
        S: Read + Write + ReadReady,
        C: Clock,
        A: ActivityIndicator,
    {
        match self {
            SourceCommand::Voltage => source_voltage(context, psu),
            SourceCommand::VoltageQuery => source_voltage_query(context, psu),
            SourceCommand::Current => source_current(context, psu),
            SourceCommand::CurrentQuery => source_current_query(context, psu),
            SourceCommand::OutputState => source_output_state(context, psu),
        }
    }
}

/// Take the PSU channel from the command suffix.
pub fn channel_from_context(context: &mut impl CommandContext) -> Result<Channel, InvalidChannel> {
    Channel::try_from(context.channel_suffix())
}

/// `SOURce#:VOLTage:LEVel:IMMediate:AMPlitude <volts>`
pub fn source_voltage<X, S, C, A>(context: &mut X, psu: &mut PsuAdapter<S, C, A>) -> CommandResult
where
    X: CommandContext,
    S: Read + Write + ReadReady,
    C: Clock,
    A: ActivityIndicator,
{
    let Some(channel) = require_channel(context) else {
        return CommandResult::Error;
    };
    let Some(volts) = require(context, CommandContext::param_f32) else {
        return CommandResult::Error;
    };
    complete(context, psu.set_voltage(channel, volts))
}

/// `SOURce#:VOLTage:LEVel:IMMediate:AMPlitude?`
pub fn source_voltage_query<X, S, C, A>(
    context: &mut X,
    psu: &mut PsuAdapter<S, C, A>,
) -> CommandResult
where
    X: CommandContext,
    S: Read + Write + ReadReady,
    C: Clock,
    A: ActivityIndicator,
{
    let Some(channel) = require_channel(context) else {
        return CommandResult::Error;
    };
    let value = psu.get_voltage(channel);
    report(context, value)
}

/// `SOURce#:CURRent:LEVel:IMMediate:AMPlitude <amps>`
pub fn source_current<X, S, C, A>(context: &mut X, psu: &mut PsuAdapter<S, C, A>) -> CommandResult
where
    X: CommandContext,
    S: Read + Write + ReadReady,
    C: Clock,
    A: ActivityIndicator,
{
    let Some(channel) = require_channel(context) else {
        return CommandResult::Error;
    };
    let Some(amps) = require(context, CommandContext::param_f32) else {
        return CommandResult::Error;
    };
    complete(context, psu.set_current(channel, amps))
}

/// `SOURce#:CURRent:LEVel:IMMediate:AMPlitude?`
pub fn source_current_query<X, S, C, A>(
    context: &mut X,
    psu: &mut PsuAdapter<S, C, A>,
) -> CommandResult
where
    X: CommandContext,
    S: Read + Write + ReadReady,
    C: Clock,
    A: ActivityIndicator,
{
    let Some(channel) = require_channel(context) else {
        return CommandResult::Error;
    };
    let value = psu.get_current(channel);
    report(context, value)
}

/// `SOURce#:OUTPut:STATe <0|1>`
pub fn source_output_state<X, S, C, A>(
    context: &mut X,
    psu: &mut PsuAdapter<S, C, A>,
) -> CommandResult
where
    X: CommandContext,
    S: Read + Write + ReadReady,
    C: Clock,
    A: ActivityIndicator,
{
    let Some(channel) = require_channel(context) else {
        return CommandResult::Error;
    };
    let Some(state) = require(context, CommandContext::param_i32) else {
        return CommandResult::Error;
    };
    complete(context, psu.set_output_state(channel, state))
}

fn require_channel(context: &mut impl CommandContext) -> Option<Channel> {
    match channel_from_context(context) {
        Ok(channel) => Some(channel),
        Err(err) => {
            warn!("{}", err);
            context.push_error(ScpiError::InvalidSuffix);
            None
        }
    }
}

fn require<X: CommandContext, T>(
    context: &mut X,
    param: impl FnOnce(&mut X) -> Option<T>,
) -> Option<T> {
    let value = param(context);
    if value.is_none() {
        context.push_error(ScpiError::MissingParameter);
    }
    value
}

fn complete<X: CommandContext, I: embedded_io::Error>(
    context: &mut X,
    result: Result<(), Error<I>>,
) -> CommandResult {
    match result {
        Ok(()) => CommandResult::Ok,
        Err(err) => {
            warn!("PSU command failed: {}", err);
            context.push_error(ScpiError::HardwareError);
            CommandResult::Error
        }
    }
}

fn report<X: CommandContext, I: embedded_io::Error>(
    context: &mut X,
    result: Result<f32, Error<I>>,
) -> CommandResult {
    match result {
        Ok(value) => {
            context.result_f32(value);
            CommandResult::Ok
        }
        Err(err) => {
            warn!("PSU query failed: {}", err);
            context.push_error(ScpiError::HardwareError);
            CommandResult::Error
        }
    }
}
