//! Discrete-event clock scheduler for the Garuda verification harness.
//!
//! This crate is the simulation backend the harness drives: it owns every
//! port value of a design under test, generates free-running clocks from an
//! event queue, and hands control back to the caller only at well-defined
//! suspension points (a processed rising edge, or the end of a time window).
//!
//! # Architecture
//!
//! A [`DutModel`] is an opaque, cycle-accurate black box that declares its
//! ports and reacts to rising edges and input changes. [`SimKernel`] wraps
//! one model, settles combinational effects with bounded delta cycles, and
//! exposes `write` / `read` / `await_rising_edge` / `advance`.
//!
//! [`MacUnitModel`] is a behavioral model of the int8 MAC execution unit,
//! with optional [`MacFault`] injection for exercising failure paths.
//!
//! # Modules
//!
//! - `error`: Simulation error types
//! - `time`: Femtosecond-precision time with delta cycles, duration parsing
//! - `value`: Port declarations and signal state
//! - `dut`: The DUT model boundary
//! - `kernel`: Event queue, clocks, and settling loop
//! - `mac_unit`: Reference int8 MAC unit model

#![warn(missing_docs)]

pub mod dut;
pub mod error;
pub mod kernel;
pub mod mac_unit;
pub mod time;
pub mod value;

pub use dut::{DutModel, PortIo};
pub use error::SimError;
pub use kernel::SimKernel;
pub use mac_unit::{MacFault, MacUnitModel};
pub use time::{format_duration, parse_duration, ParseDurationError, SimTime};
pub use value::{PortDecl, PortDirection, SimSignalId, SimSignalState};
