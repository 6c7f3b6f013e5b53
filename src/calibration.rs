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

use crate::error::Error;
use crate::interface::StrainGaugeInterface;

/// Readings averaged by a plain tare or an averaged read
pub const DEFAULT_AVERAGE_COUNT: usize = 10;
/// Readings thrown away before taring to flush settling state
const TARE_FLUSH_COUNT: usize = 5;

/// Offset and scalar turning raw counts into weight, plus the operations that determine them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    offset: Option<i32>,
    scalar: f32,
}

fn validate_scalar<E>(scalar: f32) -> Result<f32, Error<E>> {
    if scalar == 0.0 {
        Err(Error::ArithmeticFailure)
    } else if !scalar.is_finite() || scalar < 0.0 {
        Err(Error::InvalidConfiguration)
    } else {
        Ok(scalar)
    }
}

/// Mean of `count` raw readings, rounded towards negative infinity.
pub fn average_read<L: StrainGaugeInterface>(
    link: &mut L,
    count: usize,
) -> Result<i32, Error<L::Error>> {
    if count == 0 {
        return Err(Error::ArithmeticFailure);
    }

    let mut sum: i64 = 0;
    for _ in 0..count {
        sum += link.acquire_raw()? as i64;
    }

    Ok(sum.div_euclid(count as i64) as i32)
}

impl Calibration {
    pub fn new<E>(offset: Option<i32>, scalar: f32) -> Result<Self, Error<E>> {
        Ok(Self {
            offset,
            scalar: validate_scalar::<E>(scalar)?,
        })
    }

    pub fn offset(&self) -> i32 {
        self.offset.unwrap_or(0)
    }

    pub fn is_offset_established(&self) -> bool {
        self.offset.is_some()
    }

    pub fn set_offset(&mut self, offset: i32) {
        self.offset = Some(offset);
    }

    pub fn scalar(&self) -> f32 {
        self.scalar
    }

    pub fn set_scalar<E>(&mut self, scalar: f32) -> Result<(), Error<E>> {
        self.scalar = validate_scalar::<E>(scalar)?;
        Ok(())
    }

    /// Zero future readings on the current load. With `pre_read` a few readings are discarded
    /// first.
    pub fn tare<L: StrainGaugeInterface>(
        &mut self,
        link: &mut L,
        pre_read: bool,
    ) -> Result<(), Error<L::Error>> {
        if pre_read {
            average_read(link, TARE_FLUSH_COUNT)?;
        }

        let offset = average_read(link, DEFAULT_AVERAGE_COUNT)?;
        self.offset = Some(offset);
        debug!("Tare offset = {}", offset);
        Ok(())
    }

    /// Work out the scalar from a known weight placed on a tared scale. Returns the new scalar.
    pub fn determine_scalar<L: StrainGaugeInterface>(
        &mut self,
        link: &mut L,
        added_weight: f32,
    ) -> Result<f32, Error<L::Error>> {
        let offset = self.offset.ok_or(Error::<L::Error>::PreconditionFailed)?;
        if added_weight == 0.0 || !added_weight.is_finite() {
            return Err(Error::ArithmeticFailure);
        }

        // First reading may still be from before the weight went on
        link.acquire_raw()?;
        let reading = link.acquire_raw()?;

        let difference = (reading as i64 - offset as i64).unsigned_abs();
        let scalar = difference as f32 / added_weight;
        self.set_scalar::<L::Error>(scalar)?;
        debug!("Scalar = {} counts per unit", scalar);
        Ok(scalar)
    }

    /// Calibrated weight from a single reading, or the mean of `average_count` readings.
    pub fn read<L: StrainGaugeInterface>(
        &self,
        link: &mut L,
        average_count: usize,
    ) -> Result<f32, Error<L::Error>> {
        let reading = if average_count > 1 {
            average_read(link, average_count)?
        } else {
            link.acquire_raw()?
        };

        let tared_reading = reading as i64 - self.offset() as i64;
        trace!("Tared reading = {}", tared_reading);
        Ok(tared_reading as f32 / self.scalar)
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            offset: None,
            scalar: 1.0,
        }
    }
}
