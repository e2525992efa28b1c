//! End-to-end regression runs against the built-in MAC unit model.
//!
//! Each test builds a fresh kernel-backed testbench, optionally with an
//! injected fault, and checks the verdict the harness reaches.

use garuda_common::LogicVec;
use garuda_dv::{
    mac_unit_testbench, select_cases, CaseStatus, DvError, FailurePolicy, HarnessSettings,
    Opcode, OperandVector, SignalInterface, TestReport, Testbench, TEST_CASES,
};
use garuda_sim::time::FS_PER_US;
use garuda_sim::{MacFault, MacUnitModel, SimError, SimKernel, SimTime};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn settings() -> HarnessSettings {
    HarnessSettings {
        seed: Some(0x5eed),
        iterations: 200,
        ..HarnessSettings::default()
    }
}

fn bench(settings: HarnessSettings, fault: Option<MacFault>) -> Testbench<SimKernel> {
    let _ = env_logger::builder().is_test(true).try_init();
    mac_unit_testbench(settings, fault).unwrap()
}

fn run(name: &str, settings: HarnessSettings, fault: Option<MacFault>) -> TestReport {
    let case = select_cases(Some(name), None)
        .into_iter()
        .next()
        .unwrap_or_else(|| panic!("no case named {name}"));
    bench(settings, fault).run_case(case).unwrap()
}

/// Delegates to a kernel but reports the clock as stopped after a fixed
/// number of awaited edges.
struct ClockDiesAfter {
    kernel: SimKernel,
    edges_left: u32,
}

impl SignalInterface for ClockDiesAfter {
    fn write(&mut self, port: &str, value: u64) -> Result<(), SimError> {
        self.kernel.write(port, value)
    }

    fn read(&self, port: &str) -> Result<LogicVec, SimError> {
        SignalInterface::read(&self.kernel, port)
    }

    fn await_rising_edge(&mut self, clock: &str) -> Result<SimTime, SimError> {
        if self.edges_left == 0 {
            return Err(SimError::ClockNotRunning(clock.to_string()));
        }
        self.edges_left -= 1;
        self.kernel.await_rising_edge(clock)
    }

    fn await_time(&mut self, duration_fs: u64) -> Result<SimTime, SimError> {
        self.kernel.advance(duration_fs)
    }

    fn start_clock(&mut self, clock: &str, period_fs: u64) -> Result<(), SimError> {
        self.kernel.start_clock(clock, period_fs)
    }

    fn now(&self) -> SimTime {
        self.kernel.current_time()
    }
}

// ---------------------------------------------------------------------------
// Directed and randomized cases
// ---------------------------------------------------------------------------

#[test]
fn mac8_legacy_truncates_to_eight_bits() {
    let report = run("mac8_legacy", settings(), None);
    assert_eq!(report.status, CaseStatus::Passed, "{report:?}");
    assert_eq!(report.passed, 1);
}

#[test]
fn simd_dot_overflow_wraps() {
    let report = run("simd_dot_overflow", settings(), None);
    assert_eq!(report.status, CaseStatus::Passed, "{report:?}");
}

#[test]
fn thousand_random_simd_dot_vectors_pass() {
    let s = HarnessSettings {
        iterations: 1000,
        ..settings()
    };
    let report = run("simd_dot", s, None);
    assert_eq!(report.status, CaseStatus::Passed, "{report:?}");
    assert_eq!(report.vectors, 1000);
    assert_eq!(report.passed, 1000);
    assert!(report.mismatches.is_empty());
}

#[test]
fn full_registry_passes_on_correct_dut() {
    let s = HarnessSettings {
        mac8_acc: garuda_config::Mac8AccMode::Wide,
        ..settings()
    };
    let all: Vec<_> = TEST_CASES.iter().collect();
    let verdict = bench(s, None).run_cases(&all).unwrap();
    assert!(verdict.all_passed(), "{verdict:#?}");
    assert_eq!(verdict.passed(), TEST_CASES.len());
    assert_eq!(verdict.exit_code(), 0);
}

#[test]
fn unverified_mac8_acc_is_skipped_not_failed() {
    let report = run("mac8_acc_random", settings(), None);
    assert_eq!(report.status, CaseStatus::Passed);
    assert_eq!(report.passed, 0);
    assert_eq!(report.skipped, report.vectors);
}

#[test]
fn narrow_mac8_acc_disagrees_with_wide_dut() {
    let s = HarnessSettings {
        mac8_acc: garuda_config::Mac8AccMode::Narrow,
        ..settings()
    };
    let report = run("mac8_acc_random", s, None);
    assert_eq!(report.status, CaseStatus::Failed);
}

// ---------------------------------------------------------------------------
// Fault detection
// ---------------------------------------------------------------------------

#[test]
fn saturating_adder_is_caught() {
    let report = run("simd_dot_overflow", settings(), Some(MacFault::SaturatingDot));
    assert_eq!(report.status, CaseStatus::Failed);
    let m = &report.mismatches[0];
    assert_eq!(m.captured.value, Some(i64::from(i32::MAX)));
    assert_eq!(m.expected.value, 4 * 127 * 127 + i64::from(i32::MAX) - (1i64 << 32));
    let text = m.to_string();
    assert!(text.contains("iteration 0"));
    assert!(text.contains("lanes [127, 127, 127, 127]"));
}

#[test]
fn wide_mac8_is_caught_by_edges() {
    let report = run("directed_edges", settings(), Some(MacFault::WideMac8));
    assert_eq!(report.status, CaseStatus::Failed);
    assert_eq!(report.mismatches[0].vector.opcode, Opcode::Mac8);
}

#[test]
fn stuck_valid_is_caught() {
    let report = run("mac8_legacy", settings(), Some(MacFault::ValidStuckLow));
    assert_eq!(report.status, CaseStatus::Failed);
    assert_eq!(report.mismatches[0].captured.valid, Some(false));
}

#[test]
fn first_failure_stops_the_case() {
    let report = run("mac8_random", settings(), Some(MacFault::WideMac8));
    assert_eq!(report.status, CaseStatus::Failed);
    assert_eq!(report.mismatches.len(), 1);
    assert_eq!(report.vectors, report.mismatches[0].iteration + 1);
    assert_eq!(report.mismatches[0].seed, Some(0x5eed));
}

#[test]
fn collect_policy_reports_every_mismatch() {
    let s = HarnessSettings {
        policy: FailurePolicy::Collect { max: 16 },
        ..settings()
    };
    let total = garuda_dv::stimulus::directed_edges(32).len();
    let report = run("directed_edges", s, Some(MacFault::SaturatingDot));
    assert_eq!(report.status, CaseStatus::Failed);
    assert_eq!(report.vectors, total);
    // Only the two SIMD_DOT vectors that leave the 32-bit range differ.
    assert_eq!(report.mismatches.len(), 2);
}

#[test]
fn collect_policy_respects_budget() {
    let s = HarnessSettings {
        policy: FailurePolicy::Collect { max: 3 },
        iterations: 1000,
        ..settings()
    };
    let report = run("mac8_random", s, Some(MacFault::WideMac8));
    assert_eq!(report.mismatches.len(), 3);
    assert!(report.vectors < 1000);
}

#[test]
fn same_seed_reproduces_failures() {
    let s = HarnessSettings {
        policy: FailurePolicy::Collect { max: 5 },
        ..settings()
    };
    let a = run("mac8_random", s.clone(), Some(MacFault::WideMac8));
    let b = run("mac8_random", s, Some(MacFault::WideMac8));
    let vectors = |r: &TestReport| r.mismatches.iter().map(|m| m.vector).collect::<Vec<_>>();
    assert!(!a.mismatches.is_empty());
    assert_eq!(vectors(&a), vectors(&b));
}

#[test]
fn unseeded_run_reports_its_seed() {
    let s = HarnessSettings {
        seed: None,
        iterations: 10,
        ..settings()
    };
    let report = run("clip8_random", s, None);
    assert!(report.is_pass());
    assert!(report.seed.is_some());
}

// ---------------------------------------------------------------------------
// Timing law
// ---------------------------------------------------------------------------

#[test]
fn one_edge_sample_is_stale_two_edges_correct() {
    let mut tb = bench(settings(), None);
    tb.reset().unwrap();
    let first = OperandVector::scalar(Opcode::Mac8, 10, -5, 20, 32);
    let second = OperandVector::scalar(Opcode::Mul8, 7, 6, 0, 32);

    assert_eq!(tb.apply(&first).unwrap().value, Some(-30));
    let early = tb.sample_after(&second, 1).unwrap();
    assert_eq!(early.value, Some(-30));
    assert_ne!(early.value, Some(42));

    let on_time = tb.sample_after(&second, 2).unwrap();
    assert_eq!(on_time.value, Some(42));
    assert_eq!(on_time.valid, Some(true));
}

#[test]
fn latency_one_fails_on_two_stage_dut() {
    let s = HarnessSettings {
        latency: 1,
        ..settings()
    };
    let report = run("mac8_legacy", s, None);
    assert_eq!(report.status, CaseStatus::Failed);
}

#[test]
fn latency_one_matches_single_stage_dut() {
    let s = HarnessSettings {
        latency: 1,
        ..settings()
    };
    let report = run("directed_edges", s, Some(MacFault::SingleStage));
    assert_eq!(report.status, CaseStatus::Passed, "{report:?}");
}

// ---------------------------------------------------------------------------
// Reset law and liveness
// ---------------------------------------------------------------------------

#[test]
fn outputs_defined_after_reset() {
    let mut tb = bench(settings(), None);
    tb.reset().unwrap();
    tb.check_reset_state().unwrap();
}

#[test]
fn missing_reset_fails_the_case() {
    let report = run("mac8_legacy", settings(), Some(MacFault::NoReset));
    assert_eq!(report.status, CaseStatus::Failed);
    assert_eq!(report.vectors, 0);
    let err = report.error.unwrap();
    assert!(err.contains("undefined after reset"), "{err}");
}

#[test]
fn unresponsive_dut_times_out() {
    let s = HarnessSettings {
        clock_period_fs: 10 * FS_PER_US,
        edge_timeout_fs: FS_PER_US,
        ..settings()
    };
    let report = run("mac8_legacy", s, None);
    assert_eq!(report.status, CaseStatus::Errored);
    assert!(report.error.unwrap().contains("unresponsive"));
}

#[test]
fn cases_are_independent_after_failure() {
    let cases: Vec<_> = ["simd_dot_overflow", "mac8_legacy"]
        .into_iter()
        .flat_map(|n| select_cases(Some(n), None))
        .collect();
    let verdict = bench(settings(), Some(MacFault::SaturatingDot))
        .run_cases(&cases)
        .unwrap();
    assert_eq!(verdict.cases[0].status, CaseStatus::Failed);
    assert_eq!(verdict.cases[1].status, CaseStatus::Passed);
    assert_eq!(verdict.exit_code(), 1);
    assert_eq!(
        verdict.first_mismatch().map(|m| m.case.as_str()),
        Some("simd_dot_overflow")
    );
}

#[test]
fn unresponsive_dut_errors_every_case_and_run_continues() {
    let s = HarnessSettings {
        clock_period_fs: 10 * FS_PER_US,
        edge_timeout_fs: FS_PER_US,
        ..settings()
    };
    let cases: Vec<_> = ["mac8_legacy", "simd_dot_overflow"]
        .into_iter()
        .flat_map(|n| select_cases(Some(n), None))
        .collect();
    let verdict = bench(s, None).run_cases(&cases).unwrap();
    assert_eq!(verdict.cases.len(), 2);
    assert!(verdict.cases.iter().all(|c| c.status == CaseStatus::Errored));
}

// ---------------------------------------------------------------------------
// Harness misuse
// ---------------------------------------------------------------------------

#[test]
fn clock_lost_mid_run_stops_the_regression() {
    let _ = env_logger::builder().is_test(true).try_init();
    let sig = ClockDiesAfter {
        kernel: SimKernel::new(Box::new(MacUnitModel::new(32))).unwrap(),
        // Reset takes two edges and each vector two more.
        edges_left: 5,
    };
    let mut tb = Testbench::new(sig, settings()).unwrap();
    let cases: Vec<_> = ["mac8_legacy", "simd_dot_overflow", "directed_edges"]
        .into_iter()
        .flat_map(|n| select_cases(Some(n), None))
        .collect();
    let err = tb.run_cases(&cases).unwrap_err();
    assert!(matches!(err, DvError::Sim(SimError::ClockNotRunning(_))), "{err}");
    assert!(err.is_protocol_misuse());
}

#[test]
fn misnamed_clock_port_fails_before_any_case_runs() {
    let s = HarnessSettings {
        clock_port: "clk".into(),
        ..settings()
    };
    let err = mac_unit_testbench(s, None).unwrap_err();
    assert!(err.to_string().contains("unknown port 'clk'"), "{err}");
}
