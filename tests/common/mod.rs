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

//! A simulated HX711 that both the GPIO pins and the pulse generator below talk to, so the two
//! backends can be fed exactly the same waveform.

#![allow(dead_code)]

use core::convert::Infallible;
use hx711_link::interface::program::Level;
use hx711_link::{Error, PulseGenerator, PulseProgram};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

pub struct DeviceState {
    conversions: VecDeque<u32>,
    busy_polls: usize,
    busy_remaining: usize,
    pulses: usize,
    clock_high: bool,
    /// Clock pulses seen in each acquisition cycle
    pub cycle_pulses: Vec<usize>,
}

impl DeviceState {
    fn end_cycle(&mut self) {
        self.conversions.pop_front();
        self.pulses = 0;
        self.busy_remaining = self.busy_polls;
    }

    fn data_high(&mut self) -> bool {
        if self.pulses > 24 {
            self.end_cycle();
        }

        match self.pulses {
            0 => {
                if self.conversions.is_empty() {
                    true
                } else if self.busy_remaining > 0 {
                    self.busy_remaining -= 1;
                    true
                } else {
                    false
                }
            }
            bit => match self.conversions.front() {
                Some(word) => (word >> (24 - bit)) & 1 == 1,
                None => true,
            },
        }
    }

    fn clock_rise(&mut self) {
        if self.clock_high {
            return;
        }
        self.clock_high = true;
        if self.pulses == 0 {
            self.cycle_pulses.push(0);
        }
        self.pulses += 1;
        if let Some(count) = self.cycle_pulses.last_mut() {
            *count += 1;
        }
    }

    fn clock_fall(&mut self) {
        self.clock_high = false;
    }
}

/// Shared handle to one simulated device
#[derive(Clone)]
pub struct SimulatedHx711 {
    state: Rc<RefCell<DeviceState>>,
}

impl SimulatedHx711 {
    /// `conversions` are 24 bit words handed out in order. Before each one the data line reports
    /// busy for `busy_polls` samples. Once they run out the device never becomes ready again.
    pub fn new(conversions: &[u32], busy_polls: usize) -> Self {
        Self {
            state: Rc::new(RefCell::new(DeviceState {
                conversions: conversions.iter().copied().collect(),
                busy_polls,
                busy_remaining: busy_polls,
                pulses: 0,
                clock_high: false,
                cycle_pulses: Vec::new(),
            })),
        }
    }

    pub fn data_high(&self) -> bool {
        self.state.borrow_mut().data_high()
    }

    pub fn clock_rise(&self) {
        self.state.borrow_mut().clock_rise()
    }

    pub fn clock_fall(&self) {
        self.state.borrow_mut().clock_fall()
    }

    pub fn cycle_pulses(&self) -> Vec<usize> {
        self.state.borrow().cycle_pulses.clone()
    }

    pub fn pins(&self) -> (SimClockPin, SimDataPin) {
        (
            SimClockPin {
                device: self.clone(),
            },
            SimDataPin {
                device: self.clone(),
            },
        )
    }
}

pub struct SimClockPin {
    device: SimulatedHx711,
}

impl embedded_hal::digital::ErrorType for SimClockPin {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for SimClockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.device.clock_fall();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.device.clock_rise();
        Ok(())
    }
}

pub struct SimDataPin {
    device: SimulatedHx711,
}

impl embedded_hal::digital::ErrorType for SimDataPin {
    type Error = Infallible;
}

impl embedded_hal::digital::InputPin for SimDataPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.device.data_high())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.device.data_high())
    }
}

/// Delay that only adds up how long it was asked to wait
#[derive(Clone, Default)]
pub struct CountingDelay {
    pub total_ns: Rc<Cell<u64>>,
}

impl embedded_hal::delay::DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns.set(self.total_ns.get() + ns as u64);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorError {
    NotConfigured,
}

#[derive(Debug, Default)]
pub struct GeneratorLog {
    pub configured: Vec<(PulseProgram, u32)>,
    pub releases: usize,
    pub clears: usize,
}

/// Runs a [PulseProgram] against a [SimulatedHx711] the way a PIO state machine would. Each
/// check of the data line while waiting for ready counts as 1us.
pub struct SimulatedGenerator {
    device: SimulatedHx711,
    program: Option<PulseProgram>,
    pub channel_free: Rc<Cell<bool>>,
    /// Words captured before the current program ran, as if left in the FIFO
    pub stale: Rc<RefCell<VecDeque<u32>>>,
    pub log: Rc<RefCell<GeneratorLog>>,
}

impl SimulatedGenerator {
    pub fn new(device: &SimulatedHx711) -> Self {
        Self {
            device: device.clone(),
            program: None,
            channel_free: Rc::new(Cell::new(true)),
            stale: Rc::new(RefCell::new(VecDeque::new())),
            log: Rc::new(RefCell::new(GeneratorLog::default())),
        }
    }

    fn run(&self, program: &PulseProgram, timeout_us: u32) -> Result<u32, Error<GeneratorError>> {
        let ready_high = program.ready_level == Level::High;
        let mut word: u32 = 0;

        for _ in 0..program.pad_bits {
            word = (word << 1) | self.device.data_high() as u32;
        }

        let mut waited_us: u32 = 0;
        while self.device.data_high() != ready_high {
            if waited_us >= timeout_us {
                return Err(Error::DeviceNotResponding);
            }
            waited_us += 1;
        }

        for _ in 0..program.data_bits {
            self.device.clock_rise();
            self.device.clock_fall();
            word = (word << 1) | self.device.data_high() as u32;
        }

        for _ in 0..program.gain_pulses {
            self.device.clock_rise();
            self.device.clock_fall();
        }

        Ok(word)
    }
}

impl PulseGenerator for SimulatedGenerator {
    type Error = GeneratorError;

    fn configure(
        &mut self,
        program: &PulseProgram,
        frequency_hz: u32,
    ) -> Result<(), Error<Self::Error>> {
        if !self.channel_free.get() || self.program.is_some() {
            return Err(Error::ResourceExhausted);
        }
        self.program = Some(*program);
        self.log.borrow_mut().configured.push((*program, frequency_hz));
        Ok(())
    }

    fn clear_pending(&mut self) -> Result<(), Self::Error> {
        self.stale.borrow_mut().clear();
        self.log.borrow_mut().clears += 1;
        Ok(())
    }

    fn read_word(&mut self, timeout_us: u32) -> Result<u32, Error<Self::Error>> {
        if let Some(word) = self.stale.borrow_mut().pop_front() {
            return Ok(word);
        }
        let program = self
            .program
            .ok_or(Error::Link(GeneratorError::NotConfigured))?;
        self.run(&program, timeout_us)
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        self.program = None;
        self.log.borrow_mut().releases += 1;
        Ok(())
    }
}
