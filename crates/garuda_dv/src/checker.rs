//! Comparison of captured results against the golden model.

use std::fmt;

use garuda_config::{FailurePolicyKind, RegressionConfig};
use serde::{Deserialize, Serialize};

use crate::error::DvError;
use crate::golden::{ExpectedResult, GoldenModel};
use crate::operand::OperandVector;
use crate::sequencer::CapturedResult;

/// What a test case does after a mismatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Abort the test case at the first mismatch.
    #[default]
    FirstFailure,
    /// Record mismatches and keep going until `max` have been seen.
    Collect {
        /// Mismatch budget per test case.
        max: usize,
    },
}

impl FailurePolicy {
    /// Builds the policy described by a `[regression]` section.
    pub fn from_config(config: &RegressionConfig) -> Self {
        match config.failure_policy {
            FailurePolicyKind::First => FailurePolicy::FirstFailure,
            FailurePolicyKind::Collect => FailurePolicy::Collect {
                max: config.max_failures as usize,
            },
        }
    }
}

/// A captured result that disagrees with the golden model.
///
/// Carries everything needed to replay the vector offline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    /// Test case the vector belongs to.
    pub case: String,
    /// Zero-based index of the vector within its test case.
    pub iteration: usize,
    /// Seed of the stimulus generator, for randomized cases.
    pub seed: Option<u64>,
    /// Datapath width the vector was driven at.
    pub width: u32,
    /// The offending vector.
    pub vector: OperandVector,
    /// Golden-model prediction.
    pub expected: ExpectedResult,
    /// What the DUT produced.
    pub captured: CapturedResult,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mismatch in '{}' at iteration {}",
            self.case, self.iteration
        )?;
        if let Some(seed) = self.seed {
            write!(f, " (seed {seed})")?;
        }
        writeln!(f)?;
        writeln!(f, "{}", self.vector.describe(self.width))?;
        writeln!(
            f,
            "  expected: {} valid={}",
            self.expected.value,
            u8::from(self.expected.valid)
        )?;
        let value = self
            .captured
            .value
            .map_or_else(|| "undefined".to_string(), |v| v.to_string());
        let valid = match self.captured.valid {
            Some(true) => "1",
            Some(false) => "0",
            None => "X",
        };
        write!(
            f,
            "  captured: {value} valid={valid} (raw {}, after {} edge(s))",
            self.captured.raw, self.captured.edges
        )
    }
}

/// Result of checking one vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Value and valid flag matched.
    Pass,
    /// Opcode has no golden value; nothing was compared.
    Skipped,
    /// Mismatch recorded under [`FailurePolicy::Collect`].
    Fail,
}

/// Checks captured results and tallies outcomes for one test case.
#[derive(Debug)]
pub struct Checker {
    golden: GoldenModel,
    policy: FailurePolicy,
    passed: usize,
    skipped: usize,
    mismatches: Vec<Mismatch>,
}

impl Checker {
    /// Creates a checker backed by `golden`.
    pub fn new(golden: GoldenModel, policy: FailurePolicy) -> Self {
        Self {
            golden,
            policy,
            passed: 0,
            skipped: 0,
            mismatches: Vec::new(),
        }
    }

    /// Compares `captured` against the golden prediction for `vector`.
    ///
    /// Under [`FailurePolicy::FirstFailure`] a mismatch is returned as
    /// [`DvError::Mismatch`]. Under [`FailurePolicy::Collect`] it is recorded
    /// and reported as [`CheckOutcome::Fail`].
    pub fn check(
        &mut self,
        case: &str,
        iteration: usize,
        seed: Option<u64>,
        vector: &OperandVector,
        captured: &CapturedResult,
    ) -> Result<CheckOutcome, DvError> {
        let Some(expected) = self.golden.compute(vector) else {
            log::debug!(
                "{case}[{iteration}]: {} has no golden value, skipping check",
                vector.opcode
            );
            self.skipped += 1;
            return Ok(CheckOutcome::Skipped);
        };

        if captured.valid == Some(expected.valid) && captured.value == Some(expected.value) {
            log::debug!(
                "{case}[{iteration}]: {} -> {} ok",
                vector.opcode,
                expected.value
            );
            self.passed += 1;
            return Ok(CheckOutcome::Pass);
        }

        let mismatch = Mismatch {
            case: case.to_string(),
            iteration,
            seed,
            width: self.golden.width(),
            vector: *vector,
            expected,
            captured: captured.clone(),
        };
        log::error!(
            "{case}[{iteration}]: {} expected {} captured {}",
            vector.opcode,
            expected.value,
            mismatch.captured.raw
        );
        match self.policy {
            FailurePolicy::FirstFailure => Err(DvError::Mismatch(Box::new(mismatch))),
            FailurePolicy::Collect { .. } => {
                self.mismatches.push(mismatch);
                Ok(CheckOutcome::Fail)
            }
        }
    }

    /// Whether the mismatch budget of the collect policy is used up.
    pub fn budget_exhausted(&self) -> bool {
        match self.policy {
            FailurePolicy::FirstFailure => false,
            FailurePolicy::Collect { max } => self.mismatches.len() >= max,
        }
    }

    /// Vectors that matched.
    pub fn passed(&self) -> usize {
        self.passed
    }

    /// Vectors whose opcode was not checked.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Mismatches recorded so far.
    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }

    /// Consumes the checker, returning its recorded mismatches.
    pub fn into_mismatches(self) -> Vec<Mismatch> {
        self.mismatches
    }
}
