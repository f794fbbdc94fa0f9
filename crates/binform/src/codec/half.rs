// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! IEEE 754 binary16 storage type.

use std::fmt;

/// Half-precision float kept as its raw bit pattern.
///
/// Arithmetic is done after widening with [`F16::to_f32`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct F16(u16);

impl F16 {
    pub const ZERO: F16 = F16(0x0000);
    pub const ONE: F16 = F16(0x3C00);
    pub const INFINITY: F16 = F16(0x7C00);

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn to_bits(self) -> u16 {
        self.0
    }

    pub fn is_nan(self) -> bool {
        self.0 & 0x7C00 == 0x7C00 && self.0 & 0x03FF != 0
    }

    /// Narrow an `f32`, rounding to nearest with ties to even.
    pub fn from_f32(value: f32) -> Self {
        let x = value.to_bits();
        let sign = x & 0x8000_0000;
        let exp = x & 0x7F80_0000;
        let man = x & 0x007F_FFFF;
        let half_sign = sign >> 16;

        // NaN / infinity
        if exp == 0x7F80_0000 {
            let nan_bit = if man == 0 { 0 } else { 0x0200 };
            return Self((half_sign | 0x7C00 | nan_bit | (man >> 13)) as u16);
        }

        let half_exp = ((exp >> 23) as i32) - 127 + 15;

        // Overflow saturates to infinity
        if half_exp >= 0x1F {
            return Self((half_sign | 0x7C00) as u16);
        }

        // Subnormal or underflow to zero
        if half_exp <= 0 {
            if 14 - half_exp > 24 {
                return Self(half_sign as u16);
            }
            let man = man | 0x0080_0000;
            let mut half_man = man >> (14 - half_exp);
            let round_bit = 1u32 << (13 - half_exp);
            if man & round_bit != 0 && man & (3 * round_bit - 1) != 0 {
                half_man += 1;
            }
            return Self((half_sign | half_man) as u16);
        }

        let half_exp = (half_exp as u32) << 10;
        let half_man = man >> 13;
        let round_bit = 0x0000_1000u32;
        let bits = half_sign | half_exp | half_man;
        if man & round_bit != 0 && man & (3 * round_bit - 1) != 0 {
            // Carry may roll into the exponent, which is the correct result.
            Self((bits + 1) as u16)
        } else {
            Self(bits as u16)
        }
    }

    pub fn from_f64(value: f64) -> Self {
        Self::from_f32(value as f32)
    }

    pub fn to_f32(self) -> f32 {
        let bits = u32::from(self.0);
        if bits & 0x7FFF == 0 {
            return f32::from_bits(bits << 16);
        }

        let half_sign = bits & 0x8000;
        let half_exp = bits & 0x7C00;
        let half_man = bits & 0x03FF;
        let sign = half_sign << 16;

        if half_exp == 0x7C00 {
            return if half_man == 0 {
                f32::from_bits(sign | 0x7F80_0000)
            } else {
                f32::from_bits(sign | 0x7FC0_0000 | (half_man << 13))
            };
        }

        if half_exp == 0 {
            // Subnormal: renormalize into the f32 exponent range.
            let e = (half_man as u16).leading_zeros() - 6;
            let exp = (127 - 15 - e) << 23;
            let man = (half_man << (14 + e)) & 0x007F_FFFF;
            return f32::from_bits(sign | exp | man);
        }

        let exp = ((((half_exp >> 10) as i32) - 15 + 127) as u32) << 23;
        let man = half_man << 13;
        f32::from_bits(sign | exp | man)
    }

    pub fn to_f64(self) -> f64 {
        f64::from(self.to_f32())
    }
}

impl fmt::Display for F16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f32())
    }
}

impl From<F16> for f32 {
    fn from(value: F16) -> Self {
        value.to_f32()
    }
}
