//! Test driver: clock start, reset, and sequencing of named test cases.

use garuda_config::{HarnessConfig, Mac8AccMode};
use garuda_sim::{MacFault, MacUnitModel, SimKernel};

use crate::checker::{Checker, FailurePolicy};
use crate::error::DvError;
use crate::golden::GoldenModel;
use crate::opcode::Opcode;
use crate::operand::OperandVector;
use crate::report::{CaseStatus, RegressionVerdict, TestReport};
use crate::sequencer::{CapturedResult, PipelineSequencer};
use crate::signals::{ports, SignalInterface};
use crate::stimulus::{self, StimulusGenerator};

/// Everything the driver needs to know about the DUT and the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HarnessSettings {
    /// Datapath width W.
    pub xlen: u32,
    /// Rising edges between drive and sample.
    pub latency: u32,
    /// Clock port.
    pub clock_port: String,
    /// Clock period in femtoseconds.
    pub clock_period_fs: u64,
    /// Active-low reset port.
    pub reset_port: String,
    /// Reset hold time in femtoseconds.
    pub reset_hold_fs: u64,
    /// Deadline per awaited edge in femtoseconds.
    pub edge_timeout_fs: u64,
    /// Vectors per randomized case.
    pub iterations: usize,
    /// Fixed stimulus seed; drawn per case when `None`.
    pub seed: Option<u64>,
    /// Reaction to mismatches.
    pub policy: FailurePolicy,
    /// Golden-model treatment of MAC8_ACC.
    pub mac8_acc: Mac8AccMode,
}

impl HarnessSettings {
    /// Extracts driver settings from a loaded configuration.
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self {
            xlen: config.dut.xlen,
            latency: config.dut.latency,
            clock_port: config.clock.port.clone(),
            clock_period_fs: config.clock.period_fs,
            reset_port: config.reset.port.clone(),
            reset_hold_fs: config.reset.hold_fs,
            edge_timeout_fs: config.timing.edge_timeout_fs,
            iterations: config.regression.iterations as usize,
            seed: config.regression.seed,
            policy: FailurePolicy::from_config(&config.regression),
            mac8_acc: config.regression.mac8_acc,
        }
    }

    /// Rejects settings no testbench can run with.
    pub fn validate(&self) -> Result<(), DvError> {
        let invalid = |msg: String| -> Result<(), DvError> { Err(DvError::InvalidSettings(msg)) };
        if !(8..=64).contains(&self.xlen) {
            return invalid(format!("xlen {} outside 8..=64", self.xlen));
        }
        if self.latency == 0 {
            return invalid("latency must be at least 1".into());
        }
        if self.clock_period_fs < 2 {
            return invalid(format!("clock period {} fs is too short", self.clock_period_fs));
        }
        if self.clock_port == self.reset_port {
            return invalid(format!(
                "clock and reset both name port '{}'",
                self.clock_port
            ));
        }
        if self.policy == (FailurePolicy::Collect { max: 0 }) {
            return invalid("collect policy needs a mismatch budget of at least 1".into());
        }
        Ok(())
    }

    /// The golden model these settings describe.
    ///
    /// Call [`validate`](Self::validate) first; an out-of-range `xlen` panics.
    pub fn golden(&self) -> GoldenModel {
        GoldenModel::new(self.xlen).with_mac8_acc(self.mac8_acc)
    }
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self::from_config(&HarnessConfig::default())
    }
}

/// How a test case obtains its vectors.
#[derive(Clone, Copy, Debug)]
pub enum CaseKind {
    /// A fixed list built for the datapath width.
    Directed(fn(u32) -> Vec<OperandVector>),
    /// `iterations` seeded random vectors of one opcode.
    Randomized(Opcode),
}

/// A named, independent test case.
#[derive(Clone, Copy, Debug)]
pub struct TestCase {
    /// Unique name, used for selection on the command line.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Vector source.
    pub kind: CaseKind,
}

/// Every registered test case, in default run order.
pub const TEST_CASES: &[TestCase] = &[
    TestCase {
        name: "mac8_legacy",
        description: "MAC8 10 * -5 + 20 = -30",
        kind: CaseKind::Directed(stimulus::mac8_legacy),
    },
    TestCase {
        name: "simd_dot_overflow",
        description: "SIMD_DOT with all lanes 127 and max accumulator wraps negative",
        kind: CaseKind::Directed(stimulus::simd_dot_overflow),
    },
    TestCase {
        name: "directed_edges",
        description: "truncation, saturation and wraparound boundaries for every opcode",
        kind: CaseKind::Directed(stimulus::directed_edges),
    },
    TestCase {
        name: "simd_dot",
        description: "randomized SIMD_DOT over full lane and accumulator ranges",
        kind: CaseKind::Randomized(Opcode::SimdDot),
    },
    TestCase {
        name: "mac8_random",
        description: "randomized MAC8",
        kind: CaseKind::Randomized(Opcode::Mac8),
    },
    TestCase {
        name: "mac8_acc_random",
        description: "randomized MAC8_ACC, checked per the mac8_acc policy",
        kind: CaseKind::Randomized(Opcode::Mac8Acc),
    },
    TestCase {
        name: "mul8_random",
        description: "randomized MUL8",
        kind: CaseKind::Randomized(Opcode::Mul8),
    },
    TestCase {
        name: "clip8_random",
        description: "randomized CLIP8 around and beyond the clip bounds",
        kind: CaseKind::Randomized(Opcode::Clip8),
    },
];

/// Selects registered cases.
///
/// If `name` is given only the case with that exact name is returned. If
/// `filter` is given only cases whose name contains it are returned. With
/// neither, every case is returned.
pub fn select_cases(name: Option<&str>, filter: Option<&str>) -> Vec<&'static TestCase> {
    TEST_CASES
        .iter()
        .filter(|case| {
            if let Some(n) = name {
                return case.name == n;
            }
            if let Some(f) = filter {
                return case.name.contains(f);
            }
            true
        })
        .collect()
}

/// Drives a DUT through reset and a sequence of test cases.
#[derive(Debug)]
pub struct Testbench<S> {
    sig: S,
    settings: HarnessSettings,
    sequencer: PipelineSequencer,
    clock_running: bool,
}

impl<S: SignalInterface> Testbench<S> {
    /// Wraps a signal interface. The clock is started on first use.
    ///
    /// Fails if the settings are out of range, if the DUT lacks one of the
    /// configured or fixed ports, or if its operand width differs from `xlen`.
    pub fn new(sig: S, settings: HarnessSettings) -> Result<Self, DvError> {
        settings.validate()?;
        let named = [settings.clock_port.as_str(), settings.reset_port.as_str()];
        for port in named
            .into_iter()
            .chain(ports::DATA)
            .chain(ports::METADATA)
            .chain(ports::OUTPUTS)
        {
            sig.read(port)?;
        }
        let width = sig.read(ports::RS1)?.width();
        if width != settings.xlen {
            return Err(DvError::InvalidSettings(format!(
                "xlen {} does not match the DUT's {width}-bit '{}'",
                settings.xlen,
                ports::RS1
            )));
        }
        let sequencer = PipelineSequencer::new(settings.clock_port.clone(), settings.latency);
        Ok(Self {
            sig,
            settings,
            sequencer,
            clock_running: false,
        })
    }

    /// Settings in effect.
    pub fn settings(&self) -> &HarnessSettings {
        &self.settings
    }

    /// The wrapped signal interface.
    pub fn signals(&self) -> &S {
        &self.sig
    }

    /// Unwraps the signal interface.
    pub fn into_signals(self) -> S {
        self.sig
    }

    /// Starts the free-running clock if it is not already running.
    pub fn start_clock(&mut self) -> Result<(), DvError> {
        if !self.clock_running {
            self.sig
                .start_clock(&self.settings.clock_port, self.settings.clock_period_fs)?;
            self.clock_running = true;
        }
        Ok(())
    }

    /// Applies the reset sequence and checks that outputs came out defined.
    ///
    /// Reset is asserted with every data and metadata input at zero, held
    /// for the configured time and one further edge, then released and
    /// aligned to the next rising edge.
    pub fn reset(&mut self) -> Result<(), DvError> {
        self.start_clock()?;
        let clock = self.settings.clock_port.as_str();
        self.sig.write(&self.settings.reset_port, 0)?;
        for port in ports::DATA.into_iter().chain(ports::METADATA) {
            self.sig.write(port, 0)?;
        }
        self.sig.await_time(self.settings.reset_hold_fs)?;
        self.sig.await_rising_edge(clock)?;
        self.sig.write(&self.settings.reset_port, 1)?;
        let released = self.sig.await_rising_edge(clock)?;
        self.sequencer.reset();
        log::debug!("reset released at {released}");
        self.check_reset_state()
    }

    /// Fails if any output carries X or Z bits.
    pub fn check_reset_state(&self) -> Result<(), DvError> {
        for port in ports::OUTPUTS {
            let value = self.sig.read(port)?;
            if value.has_unknown() {
                return Err(DvError::UndefinedAfterReset {
                    port: port.to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Drives one vector and samples after exactly `edges` rising edges.
    pub fn sample_after(
        &mut self,
        vector: &OperandVector,
        edges: u32,
    ) -> Result<CapturedResult, DvError> {
        self.sequencer.sample_after(&mut self.sig, vector, edges)
    }

    /// Drives one vector and samples after the configured latency.
    pub fn apply(&mut self, vector: &OperandVector) -> Result<CapturedResult, DvError> {
        self.sequencer.apply(&mut self.sig, vector)
    }

    /// Resets the DUT and runs one registered case.
    ///
    /// Mismatches and DUT-side errors are recorded in the report. Harness
    /// misuse (see [`DvError::is_protocol_misuse`]) is returned instead.
    pub fn run_case(&mut self, case: &TestCase) -> Result<TestReport, DvError> {
        log::info!("running {}: {}", case.name, case.description);
        let (vectors, seed) = match case.kind {
            CaseKind::Directed(build) => (build(self.settings.xlen), None),
            CaseKind::Randomized(opcode) => {
                let mut stim = match self.settings.seed {
                    Some(seed) => StimulusGenerator::new(seed, self.settings.xlen),
                    None => StimulusGenerator::from_entropy(self.settings.xlen),
                };
                log::info!("{}: seed {}", case.name, stim.seed());
                (stim.vectors(opcode, self.settings.iterations), Some(stim.seed()))
            }
        };
        self.run_vectors(case.name, seed, &vectors)
    }

    /// Resets the DUT and checks `vectors` in order.
    pub fn run_vectors(
        &mut self,
        name: &str,
        seed: Option<u64>,
        vectors: &[OperandVector],
    ) -> Result<TestReport, DvError> {
        let mut checker = Checker::new(self.settings.golden(), self.settings.policy);
        let mut applied = 0;
        let outcome = self
            .reset()
            .and_then(|()| self.check_all(&mut checker, name, seed, vectors, &mut applied));

        let mut report = TestReport {
            name: name.to_string(),
            status: CaseStatus::Passed,
            seed,
            vectors: applied,
            passed: checker.passed(),
            skipped: checker.skipped(),
            mismatches: Vec::new(),
            error: None,
            sim_time_fs: self.sig.now().fs,
        };
        if report.skipped > 0 {
            log::warn!(
                "{name}: {} vector(s) had no golden value and were not checked",
                report.skipped
            );
        }
        report.mismatches = checker.into_mismatches();

        match outcome {
            Ok(()) if report.mismatches.is_empty() => {}
            Ok(()) => report.status = CaseStatus::Failed,
            Err(DvError::Mismatch(m)) => {
                report.status = CaseStatus::Failed;
                report.mismatches.push(*m);
            }
            Err(e) if e.is_assertion_failure() => {
                report.status = CaseStatus::Failed;
                report.error = Some(e.to_string());
            }
            Err(e) if e.is_protocol_misuse() => {
                log::error!("{name}: harness misuse, stopping: {e}");
                return Err(e);
            }
            Err(e) => {
                log::error!("{name}: {e}");
                report.status = CaseStatus::Errored;
                report.error = Some(e.to_string());
            }
        }
        log::info!(
            "{name}: {:?} ({} vectors, {} passed, {} skipped, {} mismatches)",
            report.status,
            report.vectors,
            report.passed,
            report.skipped,
            report.mismatches.len()
        );
        Ok(report)
    }

    /// Runs `cases` in order, each from a fresh reset.
    ///
    /// A failed or errored case does not stop the run; harness misuse does.
    pub fn run_cases(&mut self, cases: &[&TestCase]) -> Result<RegressionVerdict, DvError> {
        let mut verdict = RegressionVerdict::new(self.settings.xlen);
        for case in cases {
            verdict.push(self.run_case(case)?);
        }
        Ok(verdict)
    }

    fn check_all(
        &mut self,
        checker: &mut Checker,
        name: &str,
        seed: Option<u64>,
        vectors: &[OperandVector],
        applied: &mut usize,
    ) -> Result<(), DvError> {
        for (iteration, vector) in vectors.iter().enumerate() {
            let captured = self.sequencer.apply(&mut self.sig, vector)?;
            *applied += 1;
            checker.check(name, iteration, seed, vector, &captured)?;
            if checker.budget_exhausted() {
                log::warn!("{name}: mismatch budget exhausted at iteration {iteration}");
                break;
            }
        }
        Ok(())
    }
}

/// Builds a testbench around the built-in MAC unit model.
pub fn mac_unit_testbench(
    settings: HarnessSettings,
    fault: Option<MacFault>,
) -> Result<Testbench<SimKernel>, DvError> {
    settings.validate()?;
    let model = match fault {
        Some(f) => MacUnitModel::with_fault(settings.xlen, f),
        None => MacUnitModel::new(settings.xlen),
    };
    let mut kernel = SimKernel::new(Box::new(model))?;
    kernel.set_edge_timeout(settings.edge_timeout_fs);
    Testbench::new(kernel, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use garuda_sim::SimError;

    fn settings() -> HarnessSettings {
        HarnessSettings {
            iterations: 50,
            seed: Some(1),
            ..HarnessSettings::default()
        }
    }

    #[test]
    fn defaults_follow_config() {
        let s = HarnessSettings::default();
        assert_eq!(s.xlen, 32);
        assert_eq!(s.latency, 2);
        assert_eq!(s.clock_port, "clk_i");
        assert_eq!(s.reset_port, "rst_ni");
        assert_eq!(s.iterations, 1000);
        assert_eq!(s.policy, FailurePolicy::FirstFailure);
    }

    #[test]
    fn case_names_are_unique() {
        for (i, a) in TEST_CASES.iter().enumerate() {
            for b in &TEST_CASES[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn select_by_name() {
        let cases = select_cases(Some("simd_dot"), None);
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].name, "simd_dot");
    }

    #[test]
    fn select_by_substring() {
        let names: Vec<_> = select_cases(None, Some("simd"))
            .iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["simd_dot_overflow", "simd_dot"]);
    }

    #[test]
    fn select_all_and_none() {
        assert_eq!(select_cases(None, None).len(), TEST_CASES.len());
        assert!(select_cases(Some("div8"), None).is_empty());
    }

    #[test]
    fn reset_leaves_outputs_defined() {
        let mut tb = mac_unit_testbench(settings(), None).unwrap();
        tb.reset().unwrap();
        assert_eq!(tb.signals().read(ports::VALID).unwrap().to_u64(), Some(0));
    }

    #[test]
    fn reset_detects_missing_reset_logic() {
        let mut tb = mac_unit_testbench(settings(), Some(MacFault::NoReset)).unwrap();
        let err = tb.reset().unwrap_err();
        assert!(matches!(err, DvError::UndefinedAfterReset { ref port, .. } if port == "result_o"));
    }

    #[test]
    fn mac8_legacy_case_passes() {
        let mut tb = mac_unit_testbench(settings(), None).unwrap();
        let report = tb.run_case(&TEST_CASES[0]).unwrap();
        assert_eq!(report.status, CaseStatus::Passed, "{report:?}");
        assert_eq!(report.passed, 1);
    }

    #[test]
    fn randomized_case_reports_seed() {
        let mut tb = mac_unit_testbench(settings(), None).unwrap();
        let case = select_cases(Some("mul8_random"), None)[0];
        let report = tb.run_case(case).unwrap();
        assert!(report.is_pass());
        assert_eq!(report.seed, Some(1));
        assert_eq!(report.vectors, 50);
    }

    #[test]
    fn new_rejects_narrow_width_instead_of_panicking() {
        let kernel = SimKernel::new(Box::new(MacUnitModel::new(32))).unwrap();
        let s = HarnessSettings {
            xlen: 4,
            ..settings()
        };
        let err = Testbench::new(kernel, s).unwrap_err();
        assert!(matches!(err, DvError::InvalidSettings(ref m) if m.contains("xlen 4")));
    }

    #[test]
    fn new_rejects_width_the_dut_does_not_have() {
        let kernel = SimKernel::new(Box::new(MacUnitModel::new(16))).unwrap();
        let err = Testbench::new(kernel, settings()).unwrap_err();
        assert!(matches!(err, DvError::InvalidSettings(ref m) if m.contains("16-bit")));
    }

    #[test]
    fn unknown_clock_port_is_rejected_up_front() {
        let s = HarnessSettings {
            clock_port: "clk".into(),
            ..settings()
        };
        let err = mac_unit_testbench(s, None).unwrap_err();
        assert!(matches!(err, DvError::Sim(SimError::UnknownPort(ref p)) if p == "clk"));
        assert!(err.is_protocol_misuse());
    }

    #[test]
    fn clock_and_reset_must_differ() {
        let s = HarnessSettings {
            reset_port: "clk_i".into(),
            ..settings()
        };
        assert!(matches!(s.validate(), Err(DvError::InvalidSettings(_))));
    }

    #[test]
    fn rejects_bad_settings() {
        let s = HarnessSettings {
            xlen: 4,
            ..settings()
        };
        assert!(matches!(
            mac_unit_testbench(s, None),
            Err(DvError::InvalidSettings(_))
        ));
    }
}
