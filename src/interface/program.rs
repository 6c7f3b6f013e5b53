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

//! Description of the acquisition program run by a fixed-frequency pulse generator, and the
//! narrow capability such a generator has to offer.

use crate::codec::DATA_BITS;
use crate::config::Gain;
use crate::error::Error;

/// Captured words are padded to this width, pad bits land in the high bits.
pub const WORD_BITS: u8 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

/// One acquisition cycle, as the generator should run it:
///
/// 1. shift in `pad_bits` samples so the data ends up right-aligned in a [WORD_BITS] word
/// 2. wait for `ready_level` on the data line
/// 3. `data_bits` times: clock high for `clock_high_cycles`, low for `clock_low_cycles`, then
///    sample data
/// 4. `gain_pulses` more clock pulses without sampling, counted down from a register preloaded
///    before the readout starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseProgram {
    pub pad_bits: u8,
    pub data_bits: u8,
    pub ready_level: Level,
    pub gain_pulses: u8,
    pub clock_high_cycles: u8,
    pub clock_low_cycles: u8,
}

impl PulseProgram {
    pub fn for_gain(gain: Gain) -> Self {
        Self {
            pad_bits: WORD_BITS - DATA_BITS,
            data_bits: DATA_BITS,
            ready_level: Level::Low,
            gain_pulses: gain.extra_pulses(),
            clock_high_cycles: 4,
            clock_low_cycles: 2,
        }
    }

    pub fn word_bits(&self) -> u8 {
        self.pad_bits + self.data_bits
    }

    pub fn data_mask(&self) -> u32 {
        match self.data_bits {
            0 => 0,
            bits if bits >= 32 => u32::MAX,
            bits => (1u32 << bits) - 1,
        }
    }

    pub fn total_pulses(&self) -> u8 {
        self.data_bits + self.gain_pulses
    }
}

/// A fixed-frequency peripheral able to run a [PulseProgram] on one clock/data pin pair.
///
/// Turning the program into peripheral instructions is entirely up to the implementation.
pub trait PulseGenerator {
    type Error;

    /// Bind a channel and start running `program` at `frequency_hz`. Implementations return
    /// [Error::ResourceExhausted] when no channel or program memory is free.
    fn configure(&mut self, program: &PulseProgram, frequency_hz: u32)
        -> Result<(), Error<Self::Error>>;

    /// Drop any words captured but not read yet
    fn clear_pending(&mut self) -> Result<(), Self::Error>;

    /// Block until one packed word is available and return it. Gives up with
    /// [Error::DeviceNotResponding] if the data line has not reported ready within `timeout_us`.
    fn read_word(&mut self, timeout_us: u32) -> Result<u32, Error<Self::Error>>;

    /// Stop the program and free the channel bound by [PulseGenerator::configure]
    fn release(&mut self) -> Result<(), Self::Error>;
}
