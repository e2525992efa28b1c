//! Simulation error types for the clocked scheduler.
//!
//! Every way the harness can misuse the kernel, and every way a DUT model can
//! fail to respond, is a variant of [`SimError`].

/// Errors that can occur while driving or advancing a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// No port with this name is declared by the DUT.
    #[error("unknown port '{0}'")]
    UnknownPort(String),

    /// The DUT model declared the same port name twice.
    #[error("duplicate port '{0}' in DUT declaration")]
    DuplicatePort(String),

    /// The harness tried to write a port that is not a DUT input.
    #[error("port '{0}' is not a DUT input")]
    NotAnInput(String),

    /// A DUT model tried to drive a port that is not one of its outputs.
    #[error("port '{0}' is not a DUT output")]
    NotAnOutput(String),

    /// A value does not fit in the declared width of its port.
    #[error("value {value:#x} does not fit in {width}-bit port '{port}'")]
    WidthMismatch {
        /// The port being written.
        port: String,
        /// The declared width of the port.
        width: u32,
        /// The offending value.
        value: u64,
    },

    /// A logic vector of the wrong width was driven onto a port.
    #[error("port '{port}' is {expected} bits wide, got {actual} bits")]
    VectorWidth {
        /// The port being driven.
        port: String,
        /// The declared width of the port.
        expected: u32,
        /// The width of the driven vector.
        actual: u32,
    },

    /// An edge was awaited on a clock that has no running generator.
    #[error("clock '{0}' is not running")]
    ClockNotRunning(String),

    /// The harness wrote a port currently owned by a clock generator.
    #[error("port '{0}' is driven by a running clock")]
    PortDrivenByClock(String),

    /// A clock was started with a period that cannot be split into two phases.
    #[error("invalid clock period {period_fs} fs for '{port}'")]
    InvalidClockPeriod {
        /// The clock port.
        port: String,
        /// The requested period in femtoseconds.
        period_fs: u64,
    },

    /// The next rising edge did not arrive within the configured deadline.
    #[error("DUT unresponsive: no rising edge on '{clock}' within {waited_fs} fs")]
    EdgeTimeout {
        /// The clock being awaited.
        clock: String,
        /// The deadline that expired, in femtoseconds.
        waited_fs: u64,
    },

    /// Too many delta cycles at a single time step, indicating a combinational loop.
    #[error("delta cycle limit exceeded at {fs} fs (max {max_deltas} deltas)")]
    DeltaCycleLimit {
        /// The time in femtoseconds where the limit was hit.
        fs: u64,
        /// The maximum number of delta cycles allowed.
        max_deltas: u32,
    },
}

impl SimError {
    /// Returns `true` for errors caused by harness misuse rather than DUT behavior.
    pub fn is_protocol_misuse(&self) -> bool {
        !matches!(
            self,
            SimError::EdgeTimeout { .. } | SimError::DeltaCycleLimit { .. }
        )
    }
}
