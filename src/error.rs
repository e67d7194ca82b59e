//! Our error types for the PSU line adapter.

use thiserror::Error;

use crate::{command::CommandTooLong, types::InvalidChannel};

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Custom error type for PSU serial communications.
///
/// A PSU that stays silent or answers with garbage is not an error, see [`crate::reply::NO_REPLY`].
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Serial communication error")]
    SerialError(I),
    #[error("Invalid channel {0}, expected 1-3")]
    InvalidChannel(i32),
    #[error("Command does not fit the command buffer")]
    CommandTooLong,
}

impl<I: embedded_io::Error> From<InvalidChannel> for Error<I> {
    fn from(err: InvalidChannel) -> Self {
        Error::InvalidChannel(err.0)
    }
}

impl<I: embedded_io::Error> From<CommandTooLong> for Error<I> {
    fn from(_: CommandTooLong) -> Self {
        Error::CommandTooLong
    }
}
