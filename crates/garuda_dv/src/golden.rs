//! Golden arithmetic model: the oracle every captured result is checked against.
//!
//! [`GoldenModel::compute`] is a pure function of the operand vector. It
//! reproduces the DUT's fixed-width signed arithmetic, including the narrow
//! 8-bit truncation of the MAC8 family and the modular wraparound of
//! SIMD_DOT. Opcodes without a defined result yield `None`.

use garuda_config::Mac8AccMode;
use serde::{Deserialize, Serialize};

use crate::opcode::Opcode;
use crate::operand::{low_byte, sign_extend, wrap, OperandVector};

/// The value and validity flag a correct DUT must produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedResult {
    /// Result as a signed integer of the datapath width.
    pub value: i64,
    /// Expected state of `valid_o`.
    pub valid: bool,
}

/// Reference model for a `width`-bit MAC unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GoldenModel {
    width: u32,
    mac8_acc: Mac8AccMode,
}

impl GoldenModel {
    /// Creates a model with MAC8_ACC left unverified.
    ///
    /// # Panics
    ///
    /// Panics if `width` is not in `8..=64`.
    pub fn new(width: u32) -> Self {
        assert!(
            (8..=64).contains(&width),
            "datapath width {width} outside 8..=64"
        );
        Self {
            width,
            mac8_acc: Mac8AccMode::Unverified,
        }
    }

    /// Selects how MAC8_ACC results are predicted.
    pub fn with_mac8_acc(mut self, mode: Mac8AccMode) -> Self {
        self.mac8_acc = mode;
        self
    }

    /// Datapath width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// MAC8_ACC policy in effect.
    pub fn mac8_acc(&self) -> Mac8AccMode {
        self.mac8_acc
    }

    /// Predicts the DUT's output for `vector`.
    ///
    /// Returns `None` when the opcode has no modeled result, in which case
    /// the vector must not be checked.
    pub fn compute(&self, vector: &OperandVector) -> Option<ExpectedResult> {
        let value = match vector.opcode {
            Opcode::Illegal => return None,
            Opcode::Mac8 => mac8(vector),
            Opcode::Mac8Acc => match self.mac8_acc {
                Mac8AccMode::Unverified => return None,
                Mac8AccMode::Narrow => mac8(vector),
                Mac8AccMode::Wide => {
                    let product = i128::from(low_byte(vector.rs1)) * i128::from(low_byte(vector.rs2));
                    wrap(product + i128::from(vector.acc_signed(self.width)), self.width)
                }
            },
            Opcode::Mul8 => {
                let product = i32::from(low_byte(vector.rs1)) * i32::from(low_byte(vector.rs2));
                i64::from(product as i8)
            }
            Opcode::Clip8 => sign_extend(vector.rs1, self.width).clamp(-128, 127),
            Opcode::SimdDot => {
                let dot: i128 = vector
                    .rs1_lanes()
                    .iter()
                    .zip(vector.rs2_lanes())
                    .map(|(&a, b)| i128::from(a) * i128::from(b))
                    .sum();
                wrap(dot + i128::from(vector.acc_signed(self.width)), self.width)
            }
        };
        Some(ExpectedResult { value, valid: true })
    }
}

/// `rs1 * rs2 + acc` on the low bytes, reduced mod 256 and sign-extended.
fn mac8(vector: &OperandVector) -> i64 {
    let sum = i32::from(low_byte(vector.rs1)) * i32::from(low_byte(vector.rs2))
        + i32::from(low_byte(vector.acc));
    i64::from(sum as i8)
}
