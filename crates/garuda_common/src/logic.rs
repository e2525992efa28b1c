//! IEEE 1164 four-state logic values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single 4-state logic value following the IEEE 1164 standard.
///
/// The four states represent:
/// - `Zero`: logic low (driven 0)
/// - `One`: logic high (driven 1)
/// - `X`: unknown or uninitialized value
/// - `Z`: high-impedance (not driven)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum Logic {
    /// Logic low (0).
    Zero = 0,
    /// Logic high (1).
    One = 1,
    /// Unknown or uninitialized.
    X = 2,
    /// High-impedance.
    Z = 3,
}

impl Logic {
    /// Returns `true` for `Zero` and `One`.
    pub fn is_known(self) -> bool {
        matches!(self, Logic::Zero | Logic::One)
    }

    /// Converts a definite value to `bool`; `X` and `Z` yield `None`.
    pub fn to_bool(self) -> Option<bool> {
        match self {
            Logic::Zero => Some(false),
            Logic::One => Some(true),
            Logic::X | Logic::Z => None,
        }
    }

    /// Decodes the 2-bit packed representation used by [`LogicVec`](crate::LogicVec).
    pub(crate) fn from_bits(bits: u64) -> Self {
        match bits & 0b11 {
            0 => Logic::Zero,
            1 => Logic::One,
            2 => Logic::X,
            _ => Logic::Z,
        }
    }
}

impl From<bool> for Logic {
    fn from(value: bool) -> Self {
        if value {
            Logic::One
        } else {
            Logic::Zero
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Logic::Zero => write!(f, "0"),
            Logic::One => write!(f, "1"),
            Logic::X => write!(f, "X"),
            Logic::Z => write!(f, "Z"),
        }
    }
}
