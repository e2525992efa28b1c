//! Packed vectors of 4-state logic values used for port values.

use crate::logic::Logic;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A vector of 4-state [`Logic`] values packed for efficient storage.
///
/// Each logic value occupies 2 bits (encoding 4 states), with 32 values packed
/// per `u64` word. Index 0 is the least significant bit.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicVec {
    width: u32,
    /// Packed storage: 2 bits per logic value, 32 values per u64.
    data: Vec<u64>,
}

/// Number of logic values packed per u64 word.
const VALUES_PER_WORD: u32 = 32;

impl LogicVec {
    /// Creates a new `LogicVec` of the given width, initialized to all `Zero`.
    pub fn new(width: u32) -> Self {
        Self {
            width,
            data: vec![0; word_count(width)],
        }
    }

    /// Creates a `LogicVec` with every bit set to `X`.
    ///
    /// This is the power-on state of an unreset register.
    pub fn all_x(width: u32) -> Self {
        let mut v = Self::new(width);
        for i in 0..width {
            v.set(i, Logic::X);
        }
        v
    }

    /// Returns the number of logic values in this vector.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Gets the logic value at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn get(&self, index: u32) -> Logic {
        assert!(
            index < self.width,
            "index {index} out of bounds for width {}",
            self.width
        );
        let word_idx = (index / VALUES_PER_WORD) as usize;
        let bit_offset = (index % VALUES_PER_WORD) * 2;
        Logic::from_bits(self.data[word_idx] >> bit_offset)
    }

    /// Sets the logic value at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn set(&mut self, index: u32, value: Logic) {
        assert!(
            index < self.width,
            "index {index} out of bounds for width {}",
            self.width
        );
        let word_idx = (index / VALUES_PER_WORD) as usize;
        let bit_offset = (index % VALUES_PER_WORD) * 2;
        let mask = !(0b11u64 << bit_offset);
        self.data[word_idx] = (self.data[word_idx] & mask) | ((value as u64) << bit_offset);
    }

    /// Creates a single-bit `LogicVec` from a boolean value.
    pub fn from_bool(value: bool) -> Self {
        let mut v = Self::new(1);
        v.set(0, Logic::from(value));
        v
    }

    /// Creates a `LogicVec` from a `u64` value with the given width.
    ///
    /// Bits beyond the given width are ignored.
    pub fn from_u64(value: u64, width: u32) -> Self {
        let mut v = Self::new(width);
        for i in 0..width.min(64) {
            if (value >> i) & 1 != 0 {
                v.set(i, Logic::One);
            }
        }
        v
    }

    /// Converts the `LogicVec` to a `u64`, if all bits are definite (0 or 1).
    ///
    /// Returns `None` if the vector contains X or Z values, or if the width
    /// exceeds 64 bits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.width > 64 {
            return None;
        }
        let mut result = 0u64;
        for i in 0..self.width {
            match self.get(i) {
                Logic::Zero => {}
                Logic::One => result |= 1 << i,
                Logic::X | Logic::Z => return None,
            }
        }
        Some(result)
    }

    /// Reinterprets the vector as a two's-complement signed integer of its
    /// own width (the most significant bit is the sign).
    ///
    /// Returns `None` under the same conditions as [`to_u64`](Self::to_u64).
    pub fn to_i64(&self) -> Option<i64> {
        let raw = self.to_u64()?;
        if self.width == 0 || self.width == 64 {
            return Some(raw as i64);
        }
        let shift = 64 - self.width;
        Some(((raw << shift) as i64) >> shift)
    }

    /// Returns `true` if any bit is `X` or `Z`.
    pub fn has_unknown(&self) -> bool {
        (0..self.width).any(|i| !self.get(i).is_known())
    }
}

impl fmt::Display for LogicVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.width).rev() {
            write!(f, "{}", self.get(i))?;
        }
        Ok(())
    }
}

impl fmt::Debug for LogicVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogicVec({self})")
    }
}

/// Returns the number of u64 words needed to store `width` logic values.
fn word_count(width: u32) -> usize {
    width.div_ceil(VALUES_PER_WORD) as usize
}
