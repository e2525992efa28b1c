//! The boundary between the kernel and an opaque, cycle-accurate DUT.
//!
//! A [`DutModel`] declares its ports and reacts to two stimuli: combinational
//! re-evaluation after any input change, and a rising edge on one of its
//! clocks. It sees ports only through [`PortIo`], so the kernel stays the
//! single owner of signal state.

use std::collections::HashMap;

use garuda_common::LogicVec;

use crate::error::SimError;
use crate::value::{PortDecl, PortDirection, SimSignalId, SimSignalState};

/// A clocked design under test.
pub trait DutModel {
    /// Human-readable instance name used in log output.
    fn name(&self) -> &str;

    /// The DUT's port list. Called once when the kernel is built.
    fn ports(&self) -> Vec<PortDecl>;

    /// Recomputes outputs from the current inputs and internal state.
    ///
    /// The kernel calls this repeatedly until no output changes.
    fn evaluate(&mut self, io: &mut PortIo<'_>) -> Result<(), SimError>;

    /// Updates registered state on a rising edge of `clock`.
    ///
    /// Inputs read here hold their pre-edge values.
    fn rising_edge(&mut self, clock: &str, io: &mut PortIo<'_>) -> Result<(), SimError>;
}

/// Port access handed to a [`DutModel`] during evaluation.
pub struct PortIo<'a> {
    signals: &'a mut [SimSignalState],
    by_name: &'a HashMap<String, SimSignalId>,
    changed: bool,
}

impl<'a> PortIo<'a> {
    pub(crate) fn new(
        signals: &'a mut [SimSignalState],
        by_name: &'a HashMap<String, SimSignalId>,
    ) -> Self {
        Self {
            signals,
            by_name,
            changed: false,
        }
    }

    /// Reads any port by name.
    pub fn get(&self, name: &str) -> Result<&LogicVec, SimError> {
        let id = self.lookup(name)?;
        Ok(&self.signals[id.index()].value)
    }

    /// Drives an output port. Unchanged values are not recorded as activity.
    pub fn drive(&mut self, name: &str, value: LogicVec) -> Result<(), SimError> {
        let id = self.lookup(name)?;
        let sig = &mut self.signals[id.index()];
        if sig.decl.direction != PortDirection::Output {
            return Err(SimError::NotAnOutput(name.to_string()));
        }
        if value.width() != sig.decl.width {
            return Err(SimError::VectorWidth {
                port: name.to_string(),
                expected: sig.decl.width,
                actual: value.width(),
            });
        }
        if sig.update(value) {
            self.changed = true;
        }
        Ok(())
    }

    /// Whether any output changed through this handle.
    pub(crate) fn changed(&self) -> bool {
        self.changed
    }

    fn lookup(&self, name: &str) -> Result<SimSignalId, SimError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| SimError::UnknownPort(name.to_string()))
    }
}
