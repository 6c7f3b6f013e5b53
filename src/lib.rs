#![cfg_attr(not(test), no_std)]
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

//! Blocking driver for the HX711 24 bit load cell ADC.
//!
//! The serial protocol can be run by the host itself through any `embedded-hal` pins
//! ([SoftwareLink]) or handed to a fixed-frequency pulse generator ([HardwareLink]), for example
//! an RP2040 PIO state machine with the `rp2040` feature. Both give identical readings.
//! [Hx711] adds tare and scalar calibration on top of either.
//!
//! ```ignore
//! let link = SoftwareLink::new(clock_pin, data_pin, delay);
//! let mut scale = Hx711::new(link, Config::default().with_tare(true))?;
//! scale.determine_scalar(500.0)?;
//! let grams = scale.read()?;
//! ```

#[macro_use]
mod fmt;

pub mod calibration;
pub mod codec;
pub mod config;
pub mod driver;
pub mod error;
pub mod interface;

pub use calibration::Calibration;
pub use config::{Config, Gain, ReadyWait};
pub use driver::Hx711;
pub use error::{Error, InvalidGain};
pub use interface::hardware::{AcquisitionSession, HardwareLink, DEFAULT_PULSE_FREQUENCY_HZ};
pub use interface::program::{PulseGenerator, PulseProgram};
#[cfg(feature = "rp2040")]
pub use interface::rp2040::PioPulseGenerator;
pub use interface::software::{PinError, SoftwareLink};
pub use interface::StrainGaugeInterface;
