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

use crate::codec::{decode, shift_in, DATA_BITS};
use crate::config::{Gain, ReadyWait};
use crate::error::Error;
use crate::interface::StrainGaugeInterface;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

const POWER_MODE_CHANGE_DELAY_US: u32 = 60;
const CLK_HALF_PERIOD_US: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError<ClkE, DataE> {
    Clock(ClkE),
    Data(DataE),
}

/// Bit-banged HX711 link, all timing comes from the host via `DELAY`.
pub struct SoftwareLink<CLK, DATA, DELAY> {
    clock_pin: CLK,
    data_pin: DATA,
    delay: DELAY,
    gain: Gain,
    ready_wait: ReadyWait,
    clock_half_period_us: u32,
    powered_up: bool,
}

type LinkResult<T, ClkE, DataE> = Result<T, Error<PinError<ClkE, DataE>>>;

impl<CLK, DATA, DELAY, ClkE, DataE> SoftwareLink<CLK, DATA, DELAY>
where
    CLK: OutputPin<Error = ClkE>,
    DATA: InputPin<Error = DataE>,
    DELAY: DelayNs,
{
    pub fn new(clock_pin: CLK, data_pin: DATA, delay: DELAY) -> Self {
        Self {
            clock_pin,
            data_pin,
            delay,
            gain: Gain::default(),
            ready_wait: ReadyWait::default(),
            clock_half_period_us: CLK_HALF_PERIOD_US,
            powered_up: false,
        }
    }

    pub fn with_ready_wait(mut self, ready_wait: ReadyWait) -> Self {
        self.ready_wait = ready_wait;
        self
    }

    /// The clock must not stay high for 60us or more during a readout or the device powers down.
    pub fn with_clock_half_period_us(mut self, half_period_us: u32) -> Self {
        self.clock_half_period_us = half_period_us.min(POWER_MODE_CHANGE_DELAY_US / 2);
        self
    }

    pub fn ready_wait(&self) -> ReadyWait {
        self.ready_wait
    }

    pub fn is_powered_up(&self) -> bool {
        self.powered_up
    }

    /// Hand back the pins and delay
    pub fn free(self) -> (CLK, DATA, DELAY) {
        (self.clock_pin, self.data_pin, self.delay)
    }

    pub fn power_down(&mut self) -> LinkResult<(), ClkE, DataE> {
        self.clock_pin
            .set_high()
            .map_err(|e| Error::Link(PinError::<ClkE, DataE>::Clock(e)))?;
        self.delay.delay_us(POWER_MODE_CHANGE_DELAY_US);
        self.powered_up = false;
        Ok(())
    }

    pub fn power_up(&mut self) -> LinkResult<(), ClkE, DataE> {
        self.clock_pin
            .set_low()
            .map_err(|e| Error::Link(PinError::<ClkE, DataE>::Clock(e)))?;
        self.delay.delay_us(POWER_MODE_CHANGE_DELAY_US);
        self.powered_up = true;
        Ok(())
    }

    fn data_is_high(&mut self) -> LinkResult<bool, ClkE, DataE> {
        self.data_pin
            .is_high()
            .map_err(|e| Error::Link(PinError::<ClkE, DataE>::Data(e)))
    }

    /// DOUT goes low when a conversion is ready
    fn wait_ready(&mut self) -> LinkResult<(), ClkE, DataE> {
        let mut waited_us: u32 = 0;
        loop {
            if !self.data_is_high()? {
                return Ok(());
            }
            if waited_us >= self.ready_wait.timeout_us() {
                warn!("HX711 not ready after {}us", waited_us);
                return Err(Error::DeviceNotResponding);
            }
            self.delay.delay_us(self.ready_wait.poll_interval_us());
            waited_us = waited_us.saturating_add(self.ready_wait.poll_interval_us());
        }
    }

    /// One high-then-low clock pulse. The data line is sampled straight after the falling edge
    /// when `sample` is set.
    fn clock_pulse(&mut self, sample: bool) -> LinkResult<bool, ClkE, DataE> {
        self.clock_pin
            .set_high()
            .map_err(|e| Error::Link(PinError::<ClkE, DataE>::Clock(e)))?;
        self.delay.delay_us(self.clock_half_period_us);
        self.clock_pin
            .set_low()
            .map_err(|e| Error::Link(PinError::<ClkE, DataE>::Clock(e)))?;
        let bit = if sample { self.data_is_high()? } else { false };
        self.delay.delay_us(self.clock_half_period_us);
        Ok(bit)
    }
}

impl<CLK, DATA, DELAY, ClkE, DataE> StrainGaugeInterface for SoftwareLink<CLK, DATA, DELAY>
where
    CLK: OutputPin<Error = ClkE>,
    DATA: InputPin<Error = DataE>,
    DELAY: DelayNs,
{
    type Error = PinError<ClkE, DataE>;

    fn initialize(&mut self, gain: Gain) -> Result<(), Error<Self::Error>> {
        self.gain = gain;
        self.power_up()?;
        self.acquire_raw().map(|_| ())
    }

    fn set_gain(&mut self, gain: Gain) -> Result<(), Error<Self::Error>> {
        self.gain = gain;
        Ok(())
    }

    fn gain(&self) -> Gain {
        self.gain
    }

    fn acquire_raw(&mut self) -> Result<i32, Error<Self::Error>> {
        if !self.powered_up {
            self.power_up()?;
        }

        self.wait_ready()?;

        let mut data: u32 = 0;
        for _ in 0..DATA_BITS {
            let bit = self.clock_pulse(true)?;
            data = shift_in(data, bit);
        }

        // Every pulse has to go out, a partial sequence leaves the device in an unknown state
        for _ in 0..self.gain.extra_pulses() {
            self.clock_pulse(false)?;
        }

        let reading = decode(data);
        trace!("Raw reading = {}", reading);
        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    fn clock_transactions(power_up: bool, pulses: usize) -> Vec<Transaction> {
        let mut transactions = Vec::new();
        if power_up {
            transactions.push(Transaction::set(State::Low));
        }
        for _ in 0..pulses {
            transactions.push(Transaction::set(State::High));
            transactions.push(Transaction::set(State::Low));
        }
        transactions
    }

    fn data_transactions(busy_polls: usize, word: u32) -> Vec<Transaction> {
        let mut transactions = Vec::new();
        for _ in 0..busy_polls {
            transactions.push(Transaction::get(State::High));
        }
        transactions.push(Transaction::get(State::Low));
        for bit in (0..24).rev() {
            let state = if (word >> bit) & 1 == 1 { State::High } else { State::Low };
            transactions.push(Transaction::get(state));
        }
        transactions
    }

    #[test]
    fn reads_negative_word_with_gain_pulses() {
        for gain in [Gain::Gain128, Gain::Gain32ChannelB, Gain::Gain64] {
            let clock = PinMock::new(&clock_transactions(true, gain.total_pulses() as usize));
            let data = PinMock::new(&data_transactions(3, 0x80_0001));
            let mut link = SoftwareLink::new(clock.clone(), data.clone(), NoopDelay::new());
            link.set_gain(gain).unwrap();

            assert_eq!(link.acquire_raw().unwrap(), -8_388_607);

            let (mut clock, mut data, _) = link.free();
            clock.done();
            data.done();
        }
    }

    #[test]
    fn times_out_when_data_stays_high() {
        let clock = PinMock::new(&clock_transactions(true, 0));
        let data = PinMock::new(&vec![Transaction::get(State::High); 4]);
        let mut link = SoftwareLink::new(clock, data, NoopDelay::new())
            .with_ready_wait(ReadyWait::new(30_000, 10_000));

        assert!(matches!(link.acquire_raw(), Err(Error::DeviceNotResponding)));

        let (mut clock, mut data, _) = link.free();
        clock.done();
        data.done();
    }

    #[test]
    fn powers_up_again_after_power_down() {
        let mut clock_expectations = vec![Transaction::set(State::High)];
        clock_expectations.extend(clock_transactions(true, 25));
        let clock = PinMock::new(&clock_expectations);
        let data = PinMock::new(&data_transactions(0, 0x00_0042));
        let mut link = SoftwareLink::new(clock, data, NoopDelay::new());

        link.power_down().unwrap();
        assert!(!link.is_powered_up());
        assert_eq!(link.acquire_raw().unwrap(), 0x42);
        assert!(link.is_powered_up());

        let (mut clock, mut data, _) = link.free();
        clock.done();
        data.done();
    }
}
