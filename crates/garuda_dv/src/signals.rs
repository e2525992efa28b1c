//! Typed access to DUT ports and the clock-edge wait primitive.
//!
//! [`SignalInterface`] is the only way the harness touches the design. Every
//! read re-samples the backend; nothing here caches DUT state across cycles.

use garuda_common::LogicVec;
use garuda_sim::{SimError, SimKernel, SimTime};

/// Fixed port names of the MAC unit.
pub mod ports {
    /// Clock input.
    pub const CLK: &str = "clk_i";
    /// Active-low synchronous reset.
    pub const RST_N: &str = "rst_ni";
    /// First operand register.
    pub const RS1: &str = "rs1_i";
    /// Second operand register.
    pub const RS2: &str = "rs2_i";
    /// Accumulator register.
    pub const RD: &str = "rd_i";
    /// Opcode selector.
    pub const OPCODE: &str = "opcode_i";
    /// Hart identifier, held at zero.
    pub const HARTID: &str = "hartid_i";
    /// Instruction tag, held at zero.
    pub const ID: &str = "id_i";
    /// Destination register address, held at zero.
    pub const RD_ADDR: &str = "rd_addr_i";
    /// Registered result.
    pub const RESULT: &str = "result_o";
    /// Result-valid flag.
    pub const VALID: &str = "valid_o";

    /// Metadata inputs the checks never look at.
    pub const METADATA: [&str; 3] = [HARTID, ID, RD_ADDR];
    /// Data inputs driven per vector.
    pub const DATA: [&str; 4] = [RS1, RS2, RD, OPCODE];
    /// Outputs that must be defined after reset.
    pub const OUTPUTS: [&str; 2] = [RESULT, VALID];
}

/// Read/write access to named DUT ports plus clock control.
///
/// Implementations must fail fast with a protocol error on a write that
/// does not fit the port's declared width, and on awaiting a clock that is
/// not running.
pub trait SignalInterface {
    /// Sets an input port to an unsigned bit pattern.
    fn write(&mut self, port: &str, value: u64) -> Result<(), SimError>;

    /// Samples the current 4-state value of a port.
    fn read(&self, port: &str) -> Result<LogicVec, SimError>;

    /// Samples a port as a two's-complement integer of its own width.
    ///
    /// Returns `Ok(None)` if any bit is X or Z.
    fn read_signed(&self, port: &str) -> Result<Option<i64>, SimError> {
        Ok(self.read(port)?.to_i64())
    }

    /// Suspends until the next rising edge of `clock` has been processed.
    fn await_rising_edge(&mut self, clock: &str) -> Result<SimTime, SimError>;

    /// Suspends for a fixed span of simulated time.
    fn await_time(&mut self, duration_fs: u64) -> Result<SimTime, SimError>;

    /// Starts a free-running clock on a 1-bit input.
    fn start_clock(&mut self, clock: &str, period_fs: u64) -> Result<(), SimError>;

    /// Current simulation time.
    fn now(&self) -> SimTime;
}

impl SignalInterface for SimKernel {
    fn write(&mut self, port: &str, value: u64) -> Result<(), SimError> {
        SimKernel::write(self, port, value)
    }

    fn read(&self, port: &str) -> Result<LogicVec, SimError> {
        SimKernel::read(self, port).cloned()
    }

    fn await_rising_edge(&mut self, clock: &str) -> Result<SimTime, SimError> {
        SimKernel::await_rising_edge(self, clock)
    }

    fn await_time(&mut self, duration_fs: u64) -> Result<SimTime, SimError> {
        self.advance(duration_fs)
    }

    fn start_clock(&mut self, clock: &str, period_fs: u64) -> Result<(), SimError> {
        SimKernel::start_clock(self, clock, period_fs)
    }

    fn now(&self) -> SimTime {
        self.current_time()
    }
}

impl<S: SignalInterface + ?Sized> SignalInterface for &mut S {
    fn write(&mut self, port: &str, value: u64) -> Result<(), SimError> {
        (**self).write(port, value)
    }

    fn read(&self, port: &str) -> Result<LogicVec, SimError> {
        (**self).read(port)
    }

    fn await_rising_edge(&mut self, clock: &str) -> Result<SimTime, SimError> {
        (**self).await_rising_edge(clock)
    }

    fn await_time(&mut self, duration_fs: u64) -> Result<SimTime, SimError> {
        (**self).await_time(duration_fs)
    }

    fn start_clock(&mut self, clock: &str, period_fs: u64) -> Result<(), SimError> {
        (**self).start_clock(clock, period_fs)
    }

    fn now(&self) -> SimTime {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garuda_sim::time::FS_PER_NS;
    use garuda_sim::MacUnitModel;

    fn kernel() -> SimKernel {
        SimKernel::new(Box::new(MacUnitModel::new(16))).unwrap()
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut k = kernel();
        let sig: &mut dyn SignalInterface = &mut k;
        sig.write(ports::RS1, 0xFFFB).unwrap();
        assert_eq!(sig.read(ports::RS1).unwrap().to_u64(), Some(0xFFFB));
        assert_eq!(sig.read_signed(ports::RS1).unwrap(), Some(-5));
    }

    #[test]
    fn read_signed_is_none_for_unknown() {
        let k = kernel();
        assert_eq!(SignalInterface::read_signed(&k, ports::RESULT).unwrap(), None);
    }

    #[test]
    fn oversized_write_fails_fast() {
        let mut k = kernel();
        let err = SignalInterface::write(&mut k, ports::RS1, 0x1_0000).unwrap_err();
        assert!(err.is_protocol_misuse());
    }

    #[test]
    fn await_on_stopped_clock_is_misuse() {
        let mut k = kernel();
        let err = SignalInterface::await_rising_edge(&mut k, ports::CLK).unwrap_err();
        assert!(matches!(err, SimError::ClockNotRunning(_)));
    }

    #[test]
    fn await_time_moves_now() {
        let mut k = kernel();
        let sig: &mut dyn SignalInterface = &mut k;
        sig.start_clock(ports::CLK, 10 * FS_PER_NS).unwrap();
        sig.await_time(25 * FS_PER_NS).unwrap();
        assert_eq!(sig.now().fs, 25 * FS_PER_NS);
        let edge = sig.await_rising_edge(ports::CLK).unwrap();
        assert_eq!(edge.fs, 35 * FS_PER_NS);
    }

    #[test]
    fn port_groups_are_disjoint() {
        for p in ports::METADATA {
            assert!(!ports::DATA.contains(&p));
        }
        assert!(!ports::DATA.contains(&ports::CLK));
    }
}
