//! The MAC unit's instruction set and its `opcode_i` encoding.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An operation selected through `opcode_i`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Opcode {
    /// No operation; result is don't-care.
    Illegal,
    /// Signed 8x8 multiply plus 8-bit accumulator, truncated to 8 bits.
    Mac8,
    /// Multiply-accumulate into the full-width accumulator.
    Mac8Acc,
    /// Signed 8x8 multiply, truncated to 8 bits.
    Mul8,
    /// Saturate `rs1` into the signed 8-bit range.
    Clip8,
    /// Four-lane signed byte dot product plus accumulator, wrapping.
    SimdDot,
}

impl Opcode {
    /// Every opcode, in encoding order.
    pub const ALL: [Opcode; 6] = [
        Opcode::Illegal,
        Opcode::Mac8,
        Opcode::Mac8Acc,
        Opcode::Mul8,
        Opcode::Clip8,
        Opcode::SimdDot,
    ];

    /// The value driven onto `opcode_i`.
    pub fn encoding(self) -> u64 {
        match self {
            Opcode::Illegal => 0,
            Opcode::Mac8 => 1,
            Opcode::Mac8Acc => 2,
            Opcode::Mul8 => 3,
            Opcode::Clip8 => 4,
            Opcode::SimdDot => 5,
        }
    }

    /// Decodes an `opcode_i` value. Encodings without an operation return `None`.
    pub fn from_encoding(raw: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.encoding() == raw)
    }

    /// Upper-case mnemonic, e.g. `SIMD_DOT`.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Illegal => "ILLEGAL",
            Opcode::Mac8 => "MAC8",
            Opcode::Mac8Acc => "MAC8_ACC",
            Opcode::Mul8 => "MUL8",
            Opcode::Clip8 => "CLIP8",
            Opcode::SimdDot => "SIMD_DOT",
        }
    }

    /// Whether the operands are four packed byte lanes rather than one byte.
    pub fn is_simd(self) -> bool {
        self == Opcode::SimdDot
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Error returned when parsing an [`Opcode`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown opcode '{0}' (expected one of ILLEGAL, MAC8, MAC8_ACC, MUL8, CLIP8, SIMD_DOT or 0-5)")]
pub struct ParseOpcodeError(String);

impl FromStr for Opcode {
    type Err = ParseOpcodeError;

    /// Accepts a mnemonic in any case (`simd_dot`, `SIMD-DOT`) or a numeric encoding.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(raw) = trimmed.parse::<u64>() {
            return Self::from_encoding(raw).ok_or_else(|| ParseOpcodeError(s.to_string()));
        }
        let normalized = trimmed.to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|op| op.mnemonic() == normalized)
            .ok_or_else(|| ParseOpcodeError(s.to_string()))
    }
}
