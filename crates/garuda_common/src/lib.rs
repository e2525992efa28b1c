//! Shared foundational types for the Garuda verification harness.
//!
//! Port values travel between the harness and the simulation kernel as
//! 4-state logic so that uninitialized (`X`) and undriven (`Z`) bits stay
//! observable instead of being silently folded into zero.

#![warn(missing_docs)]

pub mod logic;
pub mod logic_vec;

pub use logic::Logic;
pub use logic_vec::LogicVec;
