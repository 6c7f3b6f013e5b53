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

use crate::codec::decode;
use crate::config::{Gain, DEFAULT_READY_TIMEOUT_US};
use crate::error::Error;
use crate::interface::program::{PulseGenerator, PulseProgram};
use crate::interface::StrainGaugeInterface;

pub const DEFAULT_PULSE_FREQUENCY_HZ: u32 = 4_000_000;

/// A pulse generator channel bound to one gain program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AcquisitionSession {
    pub program: PulseProgram,
    pub frequency_hz: u32,
}

/// HX711 link where the clocking and sampling is done by a [PulseGenerator]. Waiting for a
/// conversion is a wait on the generator's buffer rather than a polling loop.
///
/// A session is bound by [StrainGaugeInterface::initialize] and rebuilt on every gain change.
/// It is released on [StrainGaugeInterface::release] or when the link is dropped.
pub struct HardwareLink<G: PulseGenerator> {
    generator: G,
    frequency_hz: u32,
    gain: Gain,
    ready_timeout_us: u32,
    session: Option<AcquisitionSession>,
}

impl<G: PulseGenerator> HardwareLink<G> {
    pub fn new(generator: G) -> Self {
        Self::with_frequency(generator, DEFAULT_PULSE_FREQUENCY_HZ)
    }

    pub fn with_frequency(generator: G, frequency_hz: u32) -> Self {
        Self {
            generator,
            frequency_hz,
            gain: Gain::default(),
            ready_timeout_us: DEFAULT_READY_TIMEOUT_US,
            session: None,
        }
    }

    /// Longest wait for a conversion before a read fails with [Error::DeviceNotResponding]
    pub fn with_ready_timeout_us(mut self, timeout_us: u32) -> Self {
        self.ready_timeout_us = timeout_us;
        self
    }

    pub fn ready_timeout_us(&self) -> u32 {
        self.ready_timeout_us
    }

    pub fn session(&self) -> Option<&AcquisitionSession> {
        self.session.as_ref()
    }

    pub fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    fn open_session(&mut self, gain: Gain) -> Result<(), Error<G::Error>> {
        if self.frequency_hz == 0 {
            return Err(Error::InvalidConfiguration);
        }

        self.close_session()?;

        let program = PulseProgram::for_gain(gain);
        self.generator.configure(&program, self.frequency_hz)?;
        self.session = Some(AcquisitionSession {
            program,
            frequency_hz: self.frequency_hz,
        });
        self.generator.clear_pending().map_err(Error::Link)?;

        debug!(
            "Pulse session bound: {} gain pulses at {}Hz",
            program.gain_pulses, self.frequency_hz
        );
        Ok(())
    }

    fn close_session(&mut self) -> Result<(), Error<G::Error>> {
        if self.session.take().is_some() {
            self.generator.release().map_err(Error::Link)?;
            debug!("Pulse session released");
        }
        Ok(())
    }
}

impl<G: PulseGenerator> StrainGaugeInterface for HardwareLink<G> {
    type Error = G::Error;

    /// Tears down the current session and binds a new one for `gain`. If binding fails the link
    /// is left without a session, reads fail with [Error::PreconditionFailed] and
    /// [StrainGaugeInterface::gain] keeps reporting the previous gain until a later `set_gain`
    /// succeeds.
    fn set_gain(&mut self, gain: Gain) -> Result<(), Error<Self::Error>> {
        self.open_session(gain)?;
        self.gain = gain;
        Ok(())
    }

    fn gain(&self) -> Gain {
        self.gain
    }

    fn acquire_raw(&mut self) -> Result<i32, Error<Self::Error>> {
        let mask = match &self.session {
            Some(session) => session.program.data_mask(),
            None => return Err(Error::PreconditionFailed),
        };

        self.generator.clear_pending().map_err(Error::Link)?;
        let word = match self.generator.read_word(self.ready_timeout_us) {
            Ok(word) => word,
            Err(Error::DeviceNotResponding) => {
                warn!("HX711 not ready after {}us", self.ready_timeout_us);
                return Err(Error::DeviceNotResponding);
            }
            Err(e) => return Err(e),
        };

        let reading = decode(word & mask);
        trace!("Raw reading = {}", reading);
        Ok(reading)
    }

    fn release(&mut self) -> Result<(), Error<Self::Error>> {
        self.close_session()
    }
}

impl<G: PulseGenerator> Drop for HardwareLink<G> {
    fn drop(&mut self) {
        if self.close_session().is_err() {
            warn!("Failed to release pulse session");
        }
    }
}
