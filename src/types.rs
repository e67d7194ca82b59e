//! This module contains the channel and output state types used across the adapter.

use strum_macros::EnumIter;
use thiserror::Error;

/// One of the three PSU outputs.
#[derive(Debug, EnumIter, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum Channel {
    /// Adjustable output, shares its output enable with [`Channel::Two`].
    One = 1,
    /// Adjustable output, shares its output enable with [`Channel::One`].
    Two = 2,
    /// Fixed output with a 0V and a 5V preset. No voltage or current setpoint.
    Three = 3,
}

/// Raised for channel numbers outside of 1-3.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
#[error("Invalid channel {0}")]
pub struct InvalidChannel(pub i32);

impl Channel {
    /// Channel number as used on the wire.
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Whether the output voltage of this channel can be set to an arbitrary value.
    pub const fn is_adjustable(self) -> bool {
        matches!(self, Channel::One | Channel::Two)
    }
}

impl TryFrom<i32> for Channel {
    type Error = InvalidChannel;
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Channel::One),
            2 => Ok(Channel::Two),
            3 => Ok(Channel::Three),
            _ => Err(InvalidChannel(value)),
        }
    }
}

impl From<Channel> for u8 {
    fn from(value: Channel) -> Self {
        value.index()
    }
}

impl core::fmt::Display for Channel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Used to be less ambiguous about whether an output is on or off.
#[repr(u8)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum State {
    /// Disabled. Selects the 0V preset on channel 3.
    #[default]
    Off = 0x00,
    /// Enabled. Selects the 5V preset on channel 3.
    On = 0x01,
}

impl From<State> for bool {
    fn from(value: State) -> Self {
        match value {
            State::Off => false,
            State::On => true,
        }
    }
}

impl From<bool> for State {
    fn from(value: bool) -> Self {
        match value {
            true => State::On,
            false => State::Off,
        }
    }
}

/// Any nonzero value enables the output.
impl From<i32> for State {
    fn from(value: i32) -> Self {
        State::from(value != 0)
    }
}
