//! Directed and randomized operand vectors.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::opcode::Opcode;
use crate::operand::{signed_range, OperandVector, LANES};

/// Legacy MAC8 check: rs1=10, rs2=-5, acc=20. Expected result -30.
pub fn mac8_legacy(width: u32) -> Vec<OperandVector> {
    vec![OperandVector::scalar(Opcode::Mac8, 10, -5, 20, width)]
}

/// SIMD_DOT with every lane at 127 and the accumulator at the
/// signed maximum, forcing the sum past the top of the range.
pub fn simd_dot_overflow(width: u32) -> Vec<OperandVector> {
    let (_, max) = signed_range(width);
    vec![OperandVector::simd([127; LANES], [127; LANES], max, width)]
}

/// Boundary vectors for every opcode: truncation, saturation and wraparound
/// edges, plus one ILLEGAL vector that must be skipped rather than checked.
pub fn directed_edges(width: u32) -> Vec<OperandVector> {
    let (min, max) = signed_range(width);
    let s = |op, a, b, c| OperandVector::scalar(op, a, b, c, width);
    vec![
        s(Opcode::Mac8, 127, 127, 127),
        s(Opcode::Mac8, -128, -128, 0),
        s(Opcode::Mac8, -128, 1, -1),
        s(Opcode::Mac8, 0, 0, -128),
        s(Opcode::Mac8, -1, -1, -1),
        s(Opcode::Mul8, -128, -128, 0),
        s(Opcode::Mul8, 127, -128, 0),
        s(Opcode::Mul8, 3, -2, 0),
        s(Opcode::Clip8, 127, 0, 0),
        s(Opcode::Clip8, 128, 0, 0),
        s(Opcode::Clip8, -128, 0, 0),
        s(Opcode::Clip8, -129, 0, 0),
        s(Opcode::Clip8, max, 0, 0),
        s(Opcode::Clip8, min, 0, 0),
        s(Opcode::Mac8Acc, 2, 3, 1_000),
        s(Opcode::Mac8Acc, -128, 127, max),
        OperandVector::simd([127; LANES], [127; LANES], max, width),
        OperandVector::simd([-128; LANES], [127; LANES], min, width),
        OperandVector::simd([-128; LANES], [-128; LANES], 0, width),
        OperandVector::simd([0; LANES], [0; LANES], -1, width),
        s(Opcode::Illegal, 1, 2, 3),
    ]
}

/// Seeded source of random operand vectors.
///
/// Two generators built with the same seed and width produce the same
/// sequence, so any failing run can be replayed exactly.
#[derive(Debug)]
pub struct StimulusGenerator {
    rng: StdRng,
    seed: u64,
    width: u32,
}

impl StimulusGenerator {
    /// Creates a generator from an explicit seed.
    pub fn new(seed: u64, width: u32) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
            width,
        }
    }

    /// Creates a generator from a freshly drawn seed, readable via [`seed`](Self::seed).
    pub fn from_entropy(width: u32) -> Self {
        Self::new(rand::random(), width)
    }

    /// The seed this generator was built from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// A byte drawn uniformly from [-128, 127].
    pub fn byte(&mut self) -> i8 {
        self.rng.gen()
    }

    /// An accumulator drawn uniformly from the full signed datapath range.
    pub fn accumulator(&mut self) -> i64 {
        let (min, max) = signed_range(self.width);
        self.rng.gen_range(min..=max)
    }

    /// Draws one vector for `opcode`.
    ///
    /// Byte operands cover [-128, 127]. SIMD_DOT and MAC8_ACC accumulators
    /// cover the full signed range. CLIP8 inputs mix full-range values with
    /// values near the clip bounds so both saturated and pass-through
    /// results occur.
    pub fn vector(&mut self, opcode: Opcode) -> OperandVector {
        let width = self.width;
        match opcode {
            Opcode::SimdDot => {
                let rs1 = std::array::from_fn(|_| self.byte());
                let rs2 = std::array::from_fn(|_| self.byte());
                let acc = self.accumulator();
                OperandVector::simd(rs1, rs2, acc, width)
            }
            Opcode::Mac8Acc => {
                let (a, b) = (self.byte(), self.byte());
                let acc = self.accumulator();
                OperandVector::scalar(opcode, a.into(), b.into(), acc, width)
            }
            Opcode::Clip8 => {
                let rs1 = if self.rng.gen_bool(0.5) {
                    self.accumulator()
                } else {
                    self.rng.gen_range(-300..=300)
                };
                OperandVector::scalar(opcode, rs1, self.byte().into(), 0, width)
            }
            Opcode::Mul8 => {
                let (a, b) = (self.byte(), self.byte());
                OperandVector::scalar(opcode, a.into(), b.into(), 0, width)
            }
            Opcode::Mac8 | Opcode::Illegal => {
                let (a, b, c) = (self.byte(), self.byte(), self.byte());
                OperandVector::scalar(opcode, a.into(), b.into(), c.into(), width)
            }
        }
    }

    /// Draws `count` vectors for `opcode`.
    pub fn vectors(&mut self, opcode: Opcode, count: usize) -> Vec<OperandVector> {
        (0..count).map(|_| self.vector(opcode)).collect()
    }
}
