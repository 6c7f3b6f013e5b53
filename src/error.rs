// Copyright (C) 2025 Paul Hampson
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License version 3 as  published by the
// Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.

use core::fmt;

/// Errors reported by the driver. `E` is the error type of the acquisition backend's transport
/// (GPIO pins or pulse generator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// A setting outside of the supported set, for example a gain other than 1, 2 or 3
    InvalidConfiguration,
    /// The operation needs state that has not been established yet
    PreconditionFailed,
    /// Division by zero or a zero scalar
    ArithmeticFailure,
    /// The data line never reported ready within the configured wait
    DeviceNotResponding,
    /// No free pulse generator resources to bind a session to
    ResourceExhausted,
    /// Transport error from the underlying backend
    Link(E),
}

/// A gain setting outside of 1, 2 or 3
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidGain(pub u8);

impl<E> From<InvalidGain> for Error<E> {
    fn from(_: InvalidGain) -> Self {
        Error::InvalidConfiguration
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfiguration => f.write_str("invalid configuration"),
            Error::PreconditionFailed => f.write_str("precondition not met"),
            Error::ArithmeticFailure => f.write_str("arithmetic failure"),
            Error::DeviceNotResponding => f.write_str("device not responding"),
            Error::ResourceExhausted => f.write_str("no free pulse generator resources"),
            Error::Link(e) => write!(f, "link error: {:?}", e),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for Error<E> {}
