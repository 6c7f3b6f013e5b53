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

use crate::calibration::{average_read, Calibration};
use crate::config::{Config, Gain};
use crate::error::Error;
use crate::interface::StrainGaugeInterface;

/// HX711 load cell driver over any [StrainGaugeInterface] backend.
pub struct Hx711<L> {
    link: L,
    calibration: Calibration,
}

impl<L, LinkE> Hx711<L>
where
    L: StrainGaugeInterface<Error = LinkE>,
{
    /// Bring up the backend, then apply the calibration from `config`, then tare if asked to.
    pub fn new(mut link: L, config: Config) -> Result<Self, Error<LinkE>> {
        // Validate before touching the hardware, apply once it is up
        let calibration = Calibration::new::<LinkE>(config.offset, config.scalar)?;

        link.initialize(config.gain)?;

        let mut hx711 = Self { link, calibration };
        debug!(
            "HX711 up: gain setting {}, offset = {}, scalar = {}",
            config.gain.setting(),
            hx711.calibration.offset(),
            hx711.calibration.scalar()
        );

        if config.tare {
            hx711.tare()?;
        }

        Ok(hx711)
    }

    pub fn gain(&self) -> Gain {
        self.link.gain()
    }

    pub fn set_gain(&mut self, gain: Gain) -> Result<(), Error<LinkE>> {
        self.link.set_gain(gain)
    }

    /// Like [Hx711::set_gain] for a raw setting of 1, 2 or 3
    pub fn set_gain_setting(&mut self, setting: u8) -> Result<(), Error<LinkE>> {
        let gain = Gain::try_from(setting)?;
        self.set_gain(gain)
    }

    pub fn offset(&self) -> i32 {
        self.calibration.offset()
    }

    pub fn set_offset(&mut self, offset: i32) {
        self.calibration.set_offset(offset);
    }

    pub fn scalar(&self) -> f32 {
        self.calibration.scalar()
    }

    pub fn set_scalar(&mut self, scalar: f32) -> Result<(), Error<LinkE>> {
        self.calibration.set_scalar(scalar)
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Tare after flushing a few readings
    pub fn tare(&mut self) -> Result<(), Error<LinkE>> {
        self.tare_with(true)
    }

    pub fn tare_with(&mut self, pre_read: bool) -> Result<(), Error<LinkE>> {
        self.calibration.tare(&mut self.link, pre_read)
    }

    pub fn determine_scalar(&mut self, added_weight: f32) -> Result<f32, Error<LinkE>> {
        self.calibration.determine_scalar(&mut self.link, added_weight)
    }

    /// Weight from a single reading
    pub fn read(&mut self) -> Result<f32, Error<LinkE>> {
        self.calibration.read(&mut self.link, 1)
    }

    /// Weight from the mean of `average_count` readings
    pub fn read_averaged(&mut self, average_count: usize) -> Result<f32, Error<LinkE>> {
        self.calibration.read(&mut self.link, average_count)
    }

    /// Mean raw count over `count` readings, see [crate::calibration::DEFAULT_AVERAGE_COUNT]
    pub fn read_average(&mut self, count: usize) -> Result<i32, Error<LinkE>> {
        average_read(&mut self.link, count)
    }

    pub fn read_raw(&mut self) -> Result<i32, Error<LinkE>> {
        self.link.acquire_raw()
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Release the backend's resources and hand it back
    pub fn release(mut self) -> Result<L, Error<LinkE>> {
        self.link.release()?;
        Ok(self.link)
    }
}
