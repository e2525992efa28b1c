//! Behavioral model of the int8 MAC / SIMD-dot execution unit.
//!
//! Two register stages sit between the operand ports and `result_o`:
//! operands and opcode are captured on one rising edge, and the result
//! computed from the captured operands is loaded on the next. A vector
//! driven before edge N is therefore visible after edge N+1, unless the
//! [`MacFault::SingleStage`] fault removes the input stage.
//!
//! `rst_ni` is active low and synchronous. Before the first reset edge every
//! register holds X.

use garuda_common::{Logic, LogicVec};

use crate::dut::{DutModel, PortIo};
use crate::error::SimError;
use crate::value::PortDecl;

/// Width of the `opcode_i` port.
pub const OPCODE_WIDTH: u32 = 3;
/// Width of the `hartid_i`, `id_i` and `rd_addr_i` metadata ports.
pub const META_WIDTH: u32 = 5;

const CLK: &str = "clk_i";
const RST_N: &str = "rst_ni";

/// A deliberate defect injected into the model to exercise harness failure paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MacFault {
    /// SIMD_DOT clamps to the signed range instead of wrapping.
    SaturatingDot,
    /// MAC8 returns the full-precision sum instead of the sign-extended low byte.
    WideMac8,
    /// Registers ignore reset and stay X until loaded with a defined value.
    NoReset,
    /// `valid_o` never rises.
    ValidStuckLow,
    /// The input stage is bypassed, so results appear one edge early.
    SingleStage,
}

/// Registered operands captured by the input stage.
#[derive(Clone, Debug)]
struct Stage {
    rs1: LogicVec,
    rs2: LogicVec,
    rd: LogicVec,
    opcode: LogicVec,
}

impl Stage {
    fn unknown(xlen: u32) -> Self {
        Self {
            rs1: LogicVec::all_x(xlen),
            rs2: LogicVec::all_x(xlen),
            rd: LogicVec::all_x(xlen),
            opcode: LogicVec::all_x(OPCODE_WIDTH),
        }
    }

    fn cleared(xlen: u32) -> Self {
        Self {
            rs1: LogicVec::new(xlen),
            rs2: LogicVec::new(xlen),
            rd: LogicVec::new(xlen),
            opcode: LogicVec::new(OPCODE_WIDTH),
        }
    }
}

/// Reference model of the MAC unit with an `xlen`-bit datapath.
#[derive(Clone, Debug)]
pub struct MacUnitModel {
    xlen: u32,
    fault: Option<MacFault>,
    stage: Stage,
    result_q: LogicVec,
    valid_q: Logic,
}

impl MacUnitModel {
    /// Creates a fault-free model.
    ///
    /// # Panics
    ///
    /// Panics if `xlen` is not in `8..=64`.
    pub fn new(xlen: u32) -> Self {
        assert!(
            (8..=64).contains(&xlen),
            "xlen {xlen} outside supported range 8..=64"
        );
        Self {
            xlen,
            fault: None,
            stage: Stage::unknown(xlen),
            result_q: LogicVec::all_x(xlen),
            valid_q: Logic::X,
        }
    }

    /// Creates a model with an injected fault.
    pub fn with_fault(xlen: u32, fault: MacFault) -> Self {
        Self {
            fault: Some(fault),
            ..Self::new(xlen)
        }
    }

    /// Datapath width.
    pub fn xlen(&self) -> u32 {
        self.xlen
    }

    fn mask(&self) -> u64 {
        if self.xlen == 64 {
            u64::MAX
        } else {
            (1u64 << self.xlen) - 1
        }
    }

    /// Sign-extends the low `bits` of `value` to the datapath width.
    fn sext(&self, value: u64, bits: u32) -> u64 {
        let shift = 64 - bits;
        ((((value << shift) as i64) >> shift) as u64) & self.mask()
    }

    fn signed_xlen(&self, value: u64) -> i64 {
        self.sext(value, self.xlen) as i64
    }

    /// The combinational datapath applied to the captured stage.
    fn datapath(&self, stage: &Stage) -> (LogicVec, Logic) {
        let (Some(rs1), Some(rs2), Some(rd), Some(op)) = (
            stage.rs1.to_u64(),
            stage.rs2.to_u64(),
            stage.rd.to_u64(),
            stage.opcode.to_u64(),
        ) else {
            return (LogicVec::all_x(self.xlen), Logic::X);
        };

        let byte = |v: u64, lane: u32| ((v >> (lane * 8)) & 0xFF) as u8 as i8 as i64;
        let result = match op {
            1 => {
                let sum = byte(rs1, 0) * byte(rs2, 0) + byte(rd, 0);
                if self.fault == Some(MacFault::WideMac8) {
                    (sum as u64) & self.mask()
                } else {
                    self.sext(sum as u64, 8)
                }
            }
            2 => {
                let product = (byte(rs1, 0) * byte(rs2, 0)) as u64;
                product.wrapping_add(rd) & self.mask()
            }
            3 => self.sext((byte(rs1, 0) * byte(rs2, 0)) as u64, 8),
            4 => {
                let clipped = self.signed_xlen(rs1).clamp(-128, 127);
                (clipped as u64) & self.mask()
            }
            5 => {
                let dot: i64 = (0..4).map(|l| byte(rs1, l) * byte(rs2, l)).sum();
                if self.fault == Some(MacFault::SaturatingDot) {
                    let min = -(1i128 << (self.xlen - 1));
                    let max = (1i128 << (self.xlen - 1)) - 1;
                    let total = (dot as i128 + self.signed_xlen(rd) as i128).clamp(min, max);
                    (total as i64 as u64) & self.mask()
                } else {
                    (dot as u64).wrapping_add(rd) & self.mask()
                }
            }
            _ => return (LogicVec::new(self.xlen), Logic::Zero),
        };
        let valid = if self.fault == Some(MacFault::ValidStuckLow) {
            Logic::Zero
        } else {
            Logic::One
        };
        (LogicVec::from_u64(result, self.xlen), valid)
    }

    fn capture(&self, io: &PortIo<'_>) -> Result<Stage, SimError> {
        Ok(Stage {
            rs1: io.get("rs1_i")?.clone(),
            rs2: io.get("rs2_i")?.clone(),
            rd: io.get("rd_i")?.clone(),
            opcode: io.get("opcode_i")?.clone(),
        })
    }
}

impl DutModel for MacUnitModel {
    fn name(&self) -> &str {
        "int8_mac_unit"
    }

    fn ports(&self) -> Vec<PortDecl> {
        vec![
            PortDecl::input(CLK, 1),
            PortDecl::input(RST_N, 1),
            PortDecl::input("rs1_i", self.xlen),
            PortDecl::input("rs2_i", self.xlen),
            PortDecl::input("rd_i", self.xlen),
            PortDecl::input("opcode_i", OPCODE_WIDTH),
            PortDecl::input("hartid_i", META_WIDTH),
            PortDecl::input("id_i", META_WIDTH),
            PortDecl::input("rd_addr_i", META_WIDTH),
            PortDecl::output("result_o", self.xlen),
            PortDecl::output("valid_o", 1),
        ]
    }

    fn evaluate(&mut self, io: &mut PortIo<'_>) -> Result<(), SimError> {
        io.drive("result_o", self.result_q.clone())?;
        let mut valid = LogicVec::new(1);
        valid.set(0, self.valid_q);
        io.drive("valid_o", valid)
    }

    fn rising_edge(&mut self, clock: &str, io: &mut PortIo<'_>) -> Result<(), SimError> {
        if clock != CLK {
            return Ok(());
        }
        let reset_n = io.get(RST_N)?.get(0);
        match reset_n {
            Logic::One if self.fault == Some(MacFault::SingleStage) => {
                self.stage = self.capture(io)?;
                let (result, valid) = self.datapath(&self.stage);
                self.result_q = result;
                self.valid_q = valid;
            }
            Logic::One => {
                let (result, valid) = self.datapath(&self.stage);
                self.result_q = result;
                self.valid_q = valid;
                self.stage = self.capture(io)?;
            }
            Logic::Zero if self.fault == Some(MacFault::NoReset) => {}
            Logic::Zero => {
                self.stage = Stage::cleared(self.xlen);
                self.result_q = LogicVec::new(self.xlen);
                self.valid_q = Logic::Zero;
            }
            Logic::X | Logic::Z => {
                self.stage = Stage::unknown(self.xlen);
                self.result_q = LogicVec::all_x(self.xlen);
                self.valid_q = Logic::X;
            }
        }
        Ok(())
    }
}
