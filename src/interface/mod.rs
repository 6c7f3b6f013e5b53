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

pub mod hardware;
pub mod program;
#[cfg(feature = "rp2040")]
pub mod rp2040;
pub mod software;

use crate::config::Gain;
use crate::error::Error;

/// One way of running the HX711 serial protocol and acquiring raw samples.
pub trait StrainGaugeInterface {
    type Error;

    /// Bring the backend up for `gain` and flush the first conversion, which was taken with
    /// whatever gain the device had before.
    fn initialize(&mut self, gain: Gain) -> Result<(), Error<Self::Error>> {
        self.set_gain(gain)?;
        self.acquire_raw().map(|_| ())
    }

    /// Select the gain applied from the next completed acquisition cycle onwards.
    fn set_gain(&mut self, gain: Gain) -> Result<(), Error<Self::Error>>;

    fn gain(&self) -> Gain;

    /// Block until the device has a conversion ready, clock it out and return the signed reading.
    fn acquire_raw(&mut self) -> Result<i32, Error<Self::Error>>;

    /// Give back any resources bound by the backend.
    fn release(&mut self) -> Result<(), Error<Self::Error>> {
        Ok(())
    }
}
