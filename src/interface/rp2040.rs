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

//! [PulseGenerator] on an RP2040 PIO state machine.
//!
//! The PIO block's interrupt handler has to be bound by the application and an `embassy-time`
//! driver must be running, for example
//!
//! ```ignore
//! bind_interrupts!(struct PioIrqs {
//!     PIO0_IRQ_0 => pio::InterruptHandler<PIO0>;
//! });
//! let Pio { common, sm0, .. } = Pio::new(p.PIO0, PioIrqs);
//! let generator = PioPulseGenerator::new(common, sm0, p.PIN_14, p.PIN_15);
//! ```

use crate::error::Error;
use crate::interface::program::{Level as ReadyLevel, PulseGenerator, PulseProgram};
use core::convert::Infallible;
use core::future::Future;
use core::pin::pin;
use core::task::{Context, Poll, Waker};
use embassy_rp::clocks::clk_sys_freq;
use embassy_rp::gpio::Level;
use embassy_rp::pio::{
    Common, Config, Direction, FifoJoin, Instance, LoadedProgram, Pin, PioPin, ShiftConfig,
    ShiftDirection, StateMachine,
};
use embassy_rp::Peripheral;
use embassy_time::{with_timeout, Duration};
use fixed::types::U24F8;
use pio::{
    Assembler, InSource, JmpCondition, MovDestination, MovOperation, MovSource, Program,
    SetDestination, WaitSource, RP2040_MAX_PROGRAM_SIZE,
};

const MAX_CLOCK_DIVIDER: u64 = 65_536;

/// Run `future` to completion, sleeping the core between polls. The FIFO and timer interrupts
/// that make progress possible also end the `wfe`.
fn block_on_event<F: Future>(future: F) -> F::Output {
    let mut future = pin!(future);
    let mut cx = Context::from_waker(Waker::noop());
    loop {
        if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
            return output;
        }
        cortex_m::asm::wfe();
    }
}

pub struct PioPulseGenerator<'d, PIO: Instance, const SM: usize> {
    common: Common<'d, PIO>,
    sm: StateMachine<'d, PIO, SM>,
    clock_pin: Pin<'d, PIO>,
    data_pin: Pin<'d, PIO>,
    loaded: Option<LoadedProgram<'d, PIO>>,
}

impl<'d, PIO: Instance, const SM: usize> PioPulseGenerator<'d, PIO, SM> {
    pub fn new(
        mut common: Common<'d, PIO>,
        mut sm: StateMachine<'d, PIO, SM>,
        clock_pin: impl Peripheral<P = impl PioPin + 'd> + 'd,
        data_pin: impl Peripheral<P = impl PioPin + 'd> + 'd,
    ) -> Self {
        let clock_pin = common.make_pio_pin(clock_pin);
        let data_pin = common.make_pio_pin(data_pin);
        sm.set_pin_dirs(Direction::Out, &[&clock_pin]);
        sm.set_pin_dirs(Direction::In, &[&data_pin]);
        sm.set_pins(Level::Low, &[&clock_pin]);

        Self {
            common,
            sm,
            clock_pin,
            data_pin,
            loaded: None,
        }
    }
}

fn assemble(program: &PulseProgram) -> Program<RP2040_MAX_PROGRAM_SIZE> {
    let mut a = Assembler::<RP2040_MAX_PROGRAM_SIZE>::new();
    let mut pad_loop = a.label();
    let mut bit_loop = a.label();
    let mut gain_loop = a.label();

    // The gain count is parked in OSR while X and Y count the pad and data bits
    a.set(SetDestination::X, program.gain_pulses - 1);
    a.mov(MovDestination::OSR, MovOperation::None, MovSource::X);
    a.set(SetDestination::X, program.pad_bits - 1);
    a.set(SetDestination::Y, program.data_bits - 1);

    a.bind(&mut pad_loop);
    a.in_(InSource::PINS, 1);
    a.jmp(JmpCondition::XDecNonZero, &mut pad_loop);

    let polarity = match program.ready_level {
        ReadyLevel::Low => 0,
        ReadyLevel::High => 1,
    };
    a.wait(polarity, WaitSource::PIN, 0, false);
    a.mov(MovDestination::X, MovOperation::None, MovSource::OSR);

    a.bind(&mut bit_loop);
    a.set_with_delay(SetDestination::PINS, 1, program.clock_high_cycles - 1);
    a.set_with_delay(SetDestination::PINS, 0, program.clock_low_cycles - 1);
    a.in_(InSource::PINS, 1);
    a.jmp(JmpCondition::YDecNonZero, &mut bit_loop);

    a.bind(&mut gain_loop);
    a.set_with_delay(SetDestination::PINS, 1, program.clock_high_cycles - 1);
    a.set(SetDestination::PINS, 0);
    a.jmp(JmpCondition::XDecNonZero, &mut gain_loop);

    a.assemble_program()
}

/// Divider from the system clock to `frequency_hz`, in the state machine's 16.8 format
fn clock_divider(frequency_hz: u32) -> Option<U24F8> {
    if frequency_hz == 0 {
        return None;
    }
    let bits = (clk_sys_freq() as u64 * 256) / frequency_hz as u64;
    if bits < 256 || bits >= MAX_CLOCK_DIVIDER * 256 {
        return None;
    }
    Some(U24F8::from_bits(bits as u32))
}

impl<'d, PIO: Instance, const SM: usize> PulseGenerator for PioPulseGenerator<'d, PIO, SM> {
    type Error = Infallible;

    fn configure(
        &mut self,
        program: &PulseProgram,
        frequency_hz: u32,
    ) -> Result<(), Error<Self::Error>> {
        let divider = clock_divider(frequency_hz).ok_or(Error::<Infallible>::InvalidConfiguration)?;
        let assembled = assemble(program);
        let loaded = self
            .common
            .try_load_program(&assembled)
            .map_err(|_| Error::<Infallible>::ResourceExhausted)?;

        let mut cfg = Config::default();
        cfg.use_program(&loaded, &[]);
        cfg.set_in_pins(&[&self.data_pin]);
        cfg.set_set_pins(&[&self.clock_pin]);
        cfg.shift_in = ShiftConfig {
            threshold: program.word_bits(),
            direction: ShiftDirection::Left,
            auto_fill: true,
        };
        cfg.fifo_join = FifoJoin::RxOnly;
        cfg.clock_divider = divider;

        self.sm.set_config(&cfg);
        self.sm.clear_fifos();
        self.sm.restart();
        self.sm.set_enable(true);
        self.loaded = Some(loaded);
        Ok(())
    }

    fn clear_pending(&mut self) -> Result<(), Self::Error> {
        self.sm.clear_fifos();
        Ok(())
    }

    fn read_word(&mut self, timeout_us: u32) -> Result<u32, Error<Self::Error>> {
        let pull = with_timeout(
            Duration::from_micros(timeout_us as u64),
            self.sm.rx().wait_pull(),
        );
        block_on_event(pull).map_err(|_| Error::<Infallible>::DeviceNotResponding)
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        self.sm.set_enable(false);
        if let Some(loaded) = self.loaded.take() {
            // SAFETY: the state machine that ran these instructions is stopped
            unsafe { self.common.free_instr(loaded.used_memory) };
        }
        Ok(())
    }
}
