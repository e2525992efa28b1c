//! Operand vectors and fixed-width two's-complement helpers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::opcode::Opcode;

/// Number of signed byte lanes in a SIMD operand.
pub const LANES: usize = 4;

/// Inputs for one DUT invocation.
///
/// Register fields hold the exact unsigned bit patterns driven onto the
/// W-bit ports; signed views are derived on demand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperandVector {
    /// Operation selector.
    pub opcode: Opcode,
    /// `rs1_i` bit pattern.
    pub rs1: u64,
    /// `rs2_i` bit pattern.
    pub rs2: u64,
    /// `rd_i` bit pattern.
    pub acc: u64,
}

impl OperandVector {
    /// Builds a vector from raw bit patterns, masking each to `width` bits.
    pub fn from_patterns(opcode: Opcode, rs1: u64, rs2: u64, acc: u64, width: u32) -> Self {
        Self {
            opcode,
            rs1: rs1 & mask(width),
            rs2: rs2 & mask(width),
            acc: acc & mask(width),
        }
    }

    /// Builds a single-byte vector; operands are sign-extended to `width` bits.
    pub fn scalar(opcode: Opcode, rs1: i64, rs2: i64, acc: i64, width: u32) -> Self {
        Self {
            opcode,
            rs1: to_pattern(rs1, width),
            rs2: to_pattern(rs2, width),
            acc: to_pattern(acc, width),
        }
    }

    /// Builds a SIMD_DOT vector from four lanes per operand (lane 0 least significant).
    pub fn simd(rs1: [i8; LANES], rs2: [i8; LANES], acc: i64, width: u32) -> Self {
        Self {
            opcode: Opcode::SimdDot,
            rs1: pack_lanes(rs1) & mask(width),
            rs2: pack_lanes(rs2) & mask(width),
            acc: to_pattern(acc, width),
        }
    }

    /// The four byte lanes of `rs1`.
    pub fn rs1_lanes(&self) -> [i8; LANES] {
        unpack_lanes(self.rs1)
    }

    /// The four byte lanes of `rs2`.
    pub fn rs2_lanes(&self) -> [i8; LANES] {
        unpack_lanes(self.rs2)
    }

    /// The accumulator as a signed `width`-bit integer.
    pub fn acc_signed(&self, width: u32) -> i64 {
        sign_extend(self.acc, width)
    }

    /// Returns a formatter that prints every field with its signed reading.
    pub fn describe(&self, width: u32) -> Describe<'_> {
        Describe { vector: self, width }
    }
}

/// Verbose multi-line rendering of an [`OperandVector`], from [`OperandVector::describe`].
pub struct Describe<'a> {
    vector: &'a OperandVector,
    width: u32,
}

impl fmt::Display for Describe<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.vector;
        let digits = self.width.div_ceil(4) as usize;
        writeln!(f, "  opcode:   {} ({})", v.opcode, v.opcode.encoding())?;
        writeln!(
            f,
            "  rs1:      0x{:0digits$x}  lanes {:?}",
            v.rs1,
            v.rs1_lanes()
        )?;
        writeln!(
            f,
            "  rs2:      0x{:0digits$x}  lanes {:?}",
            v.rs2,
            v.rs2_lanes()
        )?;
        write!(
            f,
            "  acc:      0x{:0digits$x}  ({})",
            v.acc,
            v.acc_signed(self.width)
        )
    }
}

/// All-ones mask of `width` bits (`width` in `1..=64`).
pub fn mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Two's-complement bit pattern of `value` truncated to `width` bits.
pub fn to_pattern(value: i64, width: u32) -> u64 {
    (value as u64) & mask(width)
}

/// Interprets the low `width` bits of `pattern` as a signed integer.
pub fn sign_extend(pattern: u64, width: u32) -> i64 {
    let shift = 64 - width.min(64);
    ((pattern << shift) as i64) >> shift
}

/// Reduces `value` modulo 2^`width` into the signed `width`-bit range.
pub fn wrap(value: i128, width: u32) -> i64 {
    let modulus = 1i128 << width;
    let reduced = value.rem_euclid(modulus);
    if reduced >= modulus / 2 {
        (reduced - modulus) as i64
    } else {
        reduced as i64
    }
}

/// Smallest and largest signed `width`-bit values.
pub fn signed_range(width: u32) -> (i64, i64) {
    let max = (mask(width) >> 1) as i64;
    (-max - 1, max)
}

/// The low byte of a register, as a signed value.
pub fn low_byte(pattern: u64) -> i8 {
    pattern as u8 as i8
}

fn pack_lanes(lanes: [i8; LANES]) -> u64 {
    lanes
        .iter()
        .enumerate()
        .fold(0, |acc, (i, &b)| acc | (u64::from(b as u8) << (8 * i)))
}

fn unpack_lanes(pattern: u64) -> [i8; LANES] {
    std::array::from_fn(|i| (pattern >> (8 * i)) as u8 as i8)
}
