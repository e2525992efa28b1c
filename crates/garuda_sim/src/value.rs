//! Port declarations and per-signal runtime state.
//!
//! The kernel keeps one [`SimSignalState`] per declared DUT port, addressed
//! by a flat [`SimSignalId`]. Harness code only ever names ports by string;
//! the ID is an internal index.

use garuda_common::LogicVec;
use serde::{Deserialize, Serialize};

/// Opaque ID for a simulation signal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SimSignalId(u32);

impl SimSignalId {
    /// Creates a `SimSignalId` from a raw index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Direction of a DUT port as seen from the DUT.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Driven by the harness, read by the DUT.
    Input,
    /// Driven by the DUT, read by the harness.
    Output,
}

/// Static declaration of one DUT port.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDecl {
    /// Port name, e.g. `rs1_i`.
    pub name: String,
    /// Bit width.
    pub width: u32,
    /// Port direction.
    pub direction: PortDirection,
}

impl PortDecl {
    /// Declares an input port.
    pub fn input(name: impl Into<String>, width: u32) -> Self {
        Self {
            name: name.into(),
            width,
            direction: PortDirection::Input,
        }
    }

    /// Declares an output port.
    pub fn output(name: impl Into<String>, width: u32) -> Self {
        Self {
            name: name.into(),
            width,
            direction: PortDirection::Output,
        }
    }
}

/// The runtime state of one port.
///
/// `previous_value` holds the value before the most recent change and is
/// what edge detection compares against.
#[derive(Clone, Debug)]
pub struct SimSignalState {
    /// Port declaration.
    pub decl: PortDecl,
    /// Current value.
    pub value: LogicVec,
    /// Value before the last change.
    pub previous_value: LogicVec,
}

impl SimSignalState {
    /// Creates signal state initialized to all-X, as an undriven port powers up.
    pub fn new_unknown(decl: PortDecl) -> Self {
        let value = LogicVec::all_x(decl.width);
        Self {
            previous_value: value.clone(),
            value,
            decl,
        }
    }

    /// Replaces the current value, remembering the old one.
    ///
    /// Returns `true` if the value actually changed.
    pub fn update(&mut self, value: LogicVec) -> bool {
        if self.value == value {
            return false;
        }
        self.previous_value = std::mem::replace(&mut self.value, value);
        true
    }
}
