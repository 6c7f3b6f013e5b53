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

//! Bit-level layout of an HX711 conversion word.

/// Number of data bits clocked out per conversion
pub const DATA_BITS: u8 = 24;
/// Largest positive reading
pub const MAX_VALUE: u32 = 0x7F_FFFF;
/// Subtracted from readings above [MAX_VALUE] to sign-extend them
pub const COMPLEMENT_MASK: u32 = 0x100_0000;
/// Selects the data bits of a packed word
pub const DATA_MASK: u32 = 0x00FF_FFFF;

/// Sign-extend a 24 bit two's complement word.
pub fn decode(raw: u32) -> i32 {
    let raw = raw & DATA_MASK;
    if raw > MAX_VALUE {
        raw as i32 - COMPLEMENT_MASK as i32
    } else {
        raw as i32
    }
}

/// Shift one sampled bit into a 24 bit accumulator, MSB first.
#[inline]
pub fn shift_in(accumulator: u32, bit: bool) -> u32 {
    ((accumulator << 1) | bit as u32) & DATA_MASK
}
