//! Error types for the verification core.

use garuda_sim::SimError;

use crate::checker::Mismatch;
use crate::sequencer::SequencerState;

/// Errors raised while verifying the DUT.
#[derive(Debug, thiserror::Error)]
pub enum DvError {
    /// The captured result disagrees with the golden model.
    #[error("{0}")]
    Mismatch(Box<Mismatch>),

    /// An output still carries X or Z bits after the reset sequence.
    #[error("'{port}' is undefined after reset: {value}")]
    UndefinedAfterReset {
        /// The offending output port.
        port: String,
        /// Its sampled bit pattern.
        value: String,
    },

    /// The sequencer was asked to do something its current state forbids.
    #[error("sequencer cannot {action} while {state:?}")]
    Sequencer {
        /// State at the time of the call.
        state: SequencerState,
        /// The rejected operation.
        action: &'static str,
    },

    /// Harness settings that cannot describe a runnable testbench.
    #[error("invalid harness settings: {0}")]
    InvalidSettings(String),

    /// No registered test case matches the requested name or filter.
    #[error("no test case matches '{0}'")]
    NoSuchCase(String),

    /// The simulation backend reported a protocol or liveness error.
    #[error(transparent)]
    Sim(#[from] SimError),
}

impl DvError {
    /// Returns `true` for golden-model disagreements and reset-law violations,
    /// as opposed to harness or backend errors.
    pub fn is_assertion_failure(&self) -> bool {
        matches!(
            self,
            DvError::Mismatch(_) | DvError::UndefinedAfterReset { .. }
        )
    }

    /// Returns `true` when the harness itself misused the DUT or the
    /// sequencer. Such errors repeat in every case, so a run stops on them.
    ///
    /// An unresponsive or non-converging DUT is not misuse.
    pub fn is_protocol_misuse(&self) -> bool {
        match self {
            DvError::Sim(e) => e.is_protocol_misuse(),
            DvError::Sequencer { .. } | DvError::InvalidSettings(_) => true,
            DvError::Mismatch(_) | DvError::UndefinedAfterReset { .. } | DvError::NoSuchCase(_) => {
                false
            }
        }
    }
}
