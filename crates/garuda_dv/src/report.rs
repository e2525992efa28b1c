//! Per-case reports and the aggregate regression verdict.

use serde::{Deserialize, Serialize};

use crate::checker::Mismatch;

/// Final state of one test case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    /// Every checked vector matched.
    Passed,
    /// At least one mismatch, or a reset-law violation.
    Failed,
    /// The case could not run to completion (backend or protocol error).
    Errored,
}

/// Outcome of one named test case.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestReport {
    /// Test case name.
    pub name: String,
    /// Final status.
    pub status: CaseStatus,
    /// Stimulus seed, for randomized cases.
    pub seed: Option<u64>,
    /// Vectors driven into the DUT.
    pub vectors: usize,
    /// Vectors that matched the golden model.
    pub passed: usize,
    /// Vectors with no golden value.
    pub skipped: usize,
    /// Mismatches, in the order they were found.
    pub mismatches: Vec<Mismatch>,
    /// Error that ended the case early, if any.
    pub error: Option<String>,
    /// Simulation time when the case finished, in femtoseconds.
    pub sim_time_fs: u64,
}

impl TestReport {
    /// Whether the case passed.
    pub fn is_pass(&self) -> bool {
        self.status == CaseStatus::Passed
    }
}

/// Aggregate pass/fail state across every case in a run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegressionVerdict {
    /// Datapath width the run used.
    pub xlen: u32,
    /// Reports in execution order.
    pub cases: Vec<TestReport>,
}

impl RegressionVerdict {
    /// An empty verdict for a `xlen`-bit run.
    pub fn new(xlen: u32) -> Self {
        Self {
            xlen,
            cases: Vec::new(),
        }
    }

    /// Appends a case report.
    pub fn push(&mut self, report: TestReport) {
        self.cases.push(report);
    }

    /// Number of passing cases.
    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.is_pass()).count()
    }

    /// Number of failing or errored cases.
    pub fn failed(&self) -> usize {
        self.cases.len() - self.passed()
    }

    /// Whether every case passed. An empty run counts as passing.
    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    /// The first mismatch of the first failing case.
    pub fn first_mismatch(&self) -> Option<&Mismatch> {
        self.cases.iter().find_map(|c| c.mismatches.first())
    }

    /// Process exit code for this verdict.
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(name: &str, status: CaseStatus) -> TestReport {
        TestReport {
            name: name.into(),
            status,
            seed: None,
            vectors: 1,
            passed: usize::from(status == CaseStatus::Passed),
            skipped: 0,
            mismatches: Vec::new(),
            error: None,
            sim_time_fs: 0,
        }
    }

    #[test]
    fn empty_verdict_passes() {
        let v = RegressionVerdict::new(32);
        assert!(v.all_passed());
        assert_eq!(v.exit_code(), 0);
        assert!(v.first_mismatch().is_none());
    }

    #[test]
    fn counts_and_exit_code() {
        let mut v = RegressionVerdict::new(32);
        v.push(report("a", CaseStatus::Passed));
        v.push(report("b", CaseStatus::Failed));
        v.push(report("c", CaseStatus::Errored));
        assert_eq!(v.passed(), 1);
        assert_eq!(v.failed(), 2);
        assert!(!v.all_passed());
        assert_eq!(v.exit_code(), 1);
    }

    #[test]
    fn json_shape() {
        let mut v = RegressionVerdict::new(32);
        v.push(report("mac8_legacy", CaseStatus::Passed));
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["xlen"], 32);
        assert_eq!(json["cases"][0]["name"], "mac8_legacy");
        assert_eq!(json["cases"][0]["status"], "passed");
        let back: RegressionVerdict = serde_json::from_value(json).unwrap();
        assert_eq!(back, v);
    }
}
