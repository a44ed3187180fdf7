//! Error types for the bus.
//!
//! Small `Copy` enums with manual `Display`, no error-handling crate.
//! [`ErrorCode`] additionally backs the process-wide last-error slot of the
//! contract layer and is converted from `u8` with `num_enum`.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

/// The idiomatic error type returned by [`crate::bus::Bus`]'s `Result`-based
/// API.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BusError {
    /// The descriptor does not refer to an open channel: out of range,
    /// negative (at the contract layer), or the slot is empty.
    NoChannel,
    /// The operation could not make progress without suspending.
    WouldBlock,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::NoChannel => write!(f, "no such channel"),
            BusError::WouldBlock => write!(f, "operation would block"),
        }
    }
}

impl std::error::Error for BusError {}

/// Process-wide error code, mirrored by the `errno`-style contract layer.
/// `None` and `NotImplemented` exist only at this layer; the idiomatic
/// API never produces them itself.
#[derive(Debug, PartialEq, Eq, Clone, Copy, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ErrorCode {
    /// No error; meaningless to read after a success.
    None = 0,
    /// Descriptor is invalid or the channel is closed.
    NoChannel = 1,
    /// Try-form could not make progress.
    WouldBlock = 2,
    /// Catch-all for conditions the blocking loop does not recognise.
    NotImplemented = 3,
}

impl From<BusError> for ErrorCode {
    fn from(e: BusError) -> Self {
        match e {
            BusError::NoChannel => ErrorCode::NoChannel,
            BusError::WouldBlock => ErrorCode::WouldBlock,
        }
    }
}
