//! Pipeline-timing sequencer.
//!
//! Encodes the contract "inputs sampled at edge N, result valid and stable
//! after edge N + latency". Each vector walks
//! `Idle -> Driven -> AwaitingLatency -> Captured`; vectors never overlap,
//! so one full latency is spent per vector.

use garuda_common::LogicVec;
use serde::{Deserialize, Serialize};

use crate::error::DvError;
use crate::operand::OperandVector;
use crate::signals::{ports, SignalInterface};

/// Where the sequencer is in its per-vector cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequencerState {
    /// No vector in flight.
    Idle,
    /// Inputs written, no edge seen yet.
    Driven,
    /// At least one edge seen, sample not taken.
    AwaitingLatency,
    /// Outputs sampled.
    Captured,
}

/// Outputs sampled from the DUT for one vector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedResult {
    /// `result_o` as a signed integer, or `None` if any bit was X/Z.
    pub value: Option<i64>,
    /// `valid_o`, or `None` if X/Z.
    pub valid: Option<bool>,
    /// `result_o` exactly as sampled, MSB first.
    pub raw: String,
    /// Rising edges awaited between driving and sampling.
    pub edges: u32,
    /// Simulation time of the sample, in femtoseconds.
    pub time_fs: u64,
}

impl CapturedResult {
    fn sample(result: &LogicVec, valid: &LogicVec, edges: u32, time_fs: u64) -> Self {
        Self {
            value: result.to_i64(),
            valid: valid.get(0).to_bool(),
            raw: result.to_string(),
            edges,
            time_fs,
        }
    }
}

/// Drives vectors and samples their results after a fixed number of edges.
#[derive(Debug)]
pub struct PipelineSequencer {
    clock: String,
    latency: u32,
    state: SequencerState,
    edges: u32,
}

impl PipelineSequencer {
    /// Creates a sequencer for a DUT with the given clock and latency in edges.
    pub fn new(clock: impl Into<String>, latency: u32) -> Self {
        Self {
            clock: clock.into(),
            latency,
            state: SequencerState::Idle,
            edges: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Configured latency.
    pub fn latency(&self) -> u32 {
        self.latency
    }

    /// Returns to `Idle`, e.g. after a reset.
    pub fn reset(&mut self) {
        self.state = SequencerState::Idle;
        self.edges = 0;
    }

    /// Writes `vector` to the data inputs. Allowed from `Idle` or `Captured`.
    pub fn drive<S: SignalInterface + ?Sized>(
        &mut self,
        sig: &mut S,
        vector: &OperandVector,
    ) -> Result<(), DvError> {
        self.expect(
            matches!(self.state, SequencerState::Idle | SequencerState::Captured),
            "drive",
        )?;
        sig.write(ports::OPCODE, vector.opcode.encoding())?;
        sig.write(ports::RS1, vector.rs1)?;
        sig.write(ports::RS2, vector.rs2)?;
        sig.write(ports::RD, vector.acc)?;
        self.state = SequencerState::Driven;
        self.edges = 0;
        Ok(())
    }

    /// Waits for one rising edge of the DUT clock.
    pub fn tick<S: SignalInterface + ?Sized>(&mut self, sig: &mut S) -> Result<(), DvError> {
        self.expect(
            matches!(
                self.state,
                SequencerState::Driven | SequencerState::AwaitingLatency
            ),
            "await an edge",
        )?;
        sig.await_rising_edge(&self.clock)?;
        self.edges += 1;
        self.state = SequencerState::AwaitingLatency;
        Ok(())
    }

    /// Samples `result_o` and `valid_o`. Requires at least one edge since `drive`.
    pub fn capture<S: SignalInterface + ?Sized>(
        &mut self,
        sig: &mut S,
    ) -> Result<CapturedResult, DvError> {
        self.expect(self.state == SequencerState::AwaitingLatency, "capture")?;
        let result = sig.read(ports::RESULT)?;
        let valid = sig.read(ports::VALID)?;
        self.state = SequencerState::Captured;
        Ok(CapturedResult::sample(
            &result,
            &valid,
            self.edges,
            sig.now().fs,
        ))
    }

    /// Drives `vector`, waits out the DUT latency, and samples the result.
    pub fn apply<S: SignalInterface + ?Sized>(
        &mut self,
        sig: &mut S,
        vector: &OperandVector,
    ) -> Result<CapturedResult, DvError> {
        self.sample_after(sig, vector, self.latency)
    }

    /// Like [`apply`](Self::apply) but samples after exactly `edges` edges.
    ///
    /// Sampling earlier than the DUT latency returns stale data; this is how
    /// the timing contract itself is checked. `edges == 0` is rejected before
    /// anything is driven.
    pub fn sample_after<S: SignalInterface + ?Sized>(
        &mut self,
        sig: &mut S,
        vector: &OperandVector,
        edges: u32,
    ) -> Result<CapturedResult, DvError> {
        self.expect(edges > 0, "sample without awaiting an edge")?;
        self.drive(sig, vector)?;
        for _ in 0..edges {
            self.tick(sig)?;
        }
        self.capture(sig)
    }

    fn expect(&self, allowed: bool, action: &'static str) -> Result<(), DvError> {
        if allowed {
            Ok(())
        } else {
            Err(DvError::Sequencer {
                state: self.state,
                action,
            })
        }
    }
}
