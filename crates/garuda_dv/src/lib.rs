//! Differential verification of the int8 MAC / SIMD-dot execution unit.
//!
//! The harness drives operand vectors into a clocked DUT through a
//! [`SignalInterface`], waits out the pipeline latency, samples the
//! registered result, and compares it bit-exactly with an independent
//! [`GoldenModel`].
//!
//! # Data flow
//!
//! [`Testbench`] resets the DUT, a [`StimulusGenerator`] (or a directed
//! list) supplies [`OperandVector`]s, the [`PipelineSequencer`] drives each
//! one and captures the output after the configured number of edges, and
//! the [`Checker`] compares it with the golden prediction. Per-case
//! [`TestReport`]s are collected into a [`RegressionVerdict`].
//!
//! # Modules
//!
//! - `signals`: Port access trait, port names, `SimKernel` adapter
//! - `opcode`: Instruction set and encoding
//! - `operand`: Operand vectors and two's-complement helpers
//! - `golden`: Reference arithmetic
//! - `stimulus`: Directed and seeded random vectors
//! - `sequencer`: Drive / await latency / capture state machine
//! - `checker`: Comparison, mismatch diagnostics, failure policy
//! - `report`: Serializable per-case and aggregate results
//! - `driver`: Reset, test case registry, regression runner

#![warn(missing_docs)]

pub mod checker;
pub mod driver;
pub mod error;
pub mod golden;
pub mod opcode;
pub mod operand;
pub mod report;
pub mod sequencer;
pub mod signals;
pub mod stimulus;

pub use checker::{CheckOutcome, Checker, FailurePolicy, Mismatch};
pub use driver::{
    mac_unit_testbench, select_cases, CaseKind, HarnessSettings, TestCase, Testbench, TEST_CASES,
};
pub use error::DvError;
pub use golden::{ExpectedResult, GoldenModel};
pub use opcode::{Opcode, ParseOpcodeError};
pub use operand::OperandVector;
pub use report::{CaseStatus, RegressionVerdict, TestReport};
pub use sequencer::{CapturedResult, PipelineSequencer, SequencerState};
pub use signals::SignalInterface;
pub use stimulus::StimulusGenerator;
