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

use crate::codec::DATA_BITS;
use crate::error::InvalidGain;

/// Gain and input channel used for the conversion following the current readout.
///
/// | Setting | Channel | Gain | Trailing pulses |
/// | :-----: | :-----: | ---: | :-------------: |
/// | 1       | A       | 128  | 1               |
/// | 2       | B       | 32   | 2               |
/// | 3       | A       | 64   | 3               |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Gain {
    #[default]
    Gain128 = 1,
    Gain32ChannelB = 2,
    Gain64 = 3,
}

impl Gain {
    /// Clock pulses issued after the data bits to select this gain
    pub fn extra_pulses(&self) -> u8 {
        *self as u8
    }

    /// Clock pulses in one complete acquisition cycle
    pub fn total_pulses(&self) -> u8 {
        DATA_BITS + self.extra_pulses()
    }

    /// The numeric setting, 1 to 3
    pub fn setting(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for Gain {
    type Error = InvalidGain;

    fn try_from(setting: u8) -> Result<Self, Self::Error> {
        match setting {
            1 => Ok(Gain::Gain128),
            2 => Ok(Gain::Gain32ChannelB),
            3 => Ok(Gain::Gain64),
            _ => Err(InvalidGain(setting)),
        }
    }
}

pub const DEFAULT_READY_TIMEOUT_US: u32 = 1_000_000;
pub const DEFAULT_READY_POLL_INTERVAL_US: u32 = 10_000;

/// Bounds the wait for the data line to signal a completed conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadyWait {
    timeout_us: u32,
    poll_interval_us: u32,
}

impl ReadyWait {
    /// The data line is always polled at least once, so a zero timeout checks readiness without
    /// waiting. The poll interval is at least 1us.
    pub fn new(timeout_us: u32, poll_interval_us: u32) -> Self {
        Self {
            timeout_us,
            poll_interval_us: poll_interval_us.max(1),
        }
    }

    pub fn timeout_us(&self) -> u32 {
        self.timeout_us
    }

    pub fn poll_interval_us(&self) -> u32 {
        self.poll_interval_us
    }
}

impl Default for ReadyWait {
    fn default() -> Self {
        Self::new(DEFAULT_READY_TIMEOUT_US, DEFAULT_READY_POLL_INTERVAL_US)
    }
}

/// Driver construction parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub gain: Gain,
    /// Zero reference. `None` reads as 0 but does not count as established for scalar
    /// determination.
    pub offset: Option<i32>,
    /// Raw counts per unit of weight, must be positive
    pub scalar: f32,
    /// Tare once the backend is up
    pub tare: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gain: Gain::default(),
            offset: None,
            scalar: 1.0,
            tare: false,
        }
    }
}

impl Config {
    pub fn with_gain(mut self, gain: Gain) -> Self {
        self.gain = gain;
        self
    }

    pub fn with_offset(mut self, offset: i32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_scalar(mut self, scalar: f32) -> Self {
        self.scalar = scalar;
        self
    }

    pub fn with_tare(mut self, tare: bool) -> Self {
        self.tare = tare;
        self
    }
}
