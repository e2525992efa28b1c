//! Garuda CLI: the command-line interface for the MAC unit verification harness.
//!
//! Provides `garuda test` for running the registered test cases against the
//! DUT model, `garuda list` for showing them, and `garuda golden` for
//! evaluating the golden model on a single vector.

#![warn(missing_docs)]

mod golden;
mod list;

use std::io::IsTerminal;
use std::path::Path;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use garuda_config::{ConfigError, FailurePolicyKind, HarnessConfig, Mac8AccMode};
use garuda_dv::Opcode;
use garuda_sim::MacFault;

/// Garuda: differential verification of an int8 MAC / SIMD-dot unit.
#[derive(Parser, Debug)]
#[command(name = "garuda", version, about = "Garuda MAC unit verification harness")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a `harness.toml` (default: `./harness.toml` if present).
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run test cases against the DUT.
    Test(TestArgs),
    /// List registered test cases.
    List,
    /// Evaluate the golden model for one vector.
    Golden(GoldenArgs),
}

/// Arguments for the `garuda test` subcommand.
#[derive(Parser, Debug)]
pub struct TestArgs {
    /// Specific test case to run (optional).
    pub name: Option<String>,

    /// Substring filter for test case names.
    #[arg(long)]
    pub filter: Option<String>,

    /// Stimulus seed, overriding `regression.seed`.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Vectors per randomized case, overriding `regression.iterations`.
    #[arg(short = 'n', long)]
    pub iterations: Option<u32>,

    /// Failure policy, overriding `regression.failure_policy`.
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Mismatch budget for the collect policy.
    #[arg(long)]
    pub max_failures: Option<u32>,

    /// MAC8_ACC golden-model policy, overriding `regression.mac8_acc`.
    #[arg(long, value_enum)]
    pub mac8_acc: Option<Mac8AccArg>,

    /// Inject a defect into the built-in DUT model.
    #[arg(long, value_enum)]
    pub fault: Option<FaultArg>,

    /// Output format for results.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `garuda golden` subcommand.
#[derive(Parser, Debug)]
pub struct GoldenArgs {
    /// Opcode mnemonic (`mac8`, `simd_dot`, ...) or encoding (0-5).
    #[arg(long)]
    pub opcode: Opcode,

    /// `rs1` as a signed decimal or `0x` hex bit pattern.
    #[arg(long, allow_hyphen_values = true, default_value = "0")]
    pub rs1: String,

    /// `rs2` as a signed decimal or `0x` hex bit pattern.
    #[arg(long, allow_hyphen_values = true, default_value = "0")]
    pub rs2: String,

    /// Accumulator as a signed decimal or `0x` hex bit pattern.
    #[arg(long, allow_hyphen_values = true, default_value = "0")]
    pub acc: String,

    /// Datapath width, overriding `dut.xlen`.
    #[arg(long)]
    pub xlen: Option<u32>,

    /// MAC8_ACC golden-model policy, overriding `regression.mac8_acc`.
    #[arg(long, value_enum)]
    pub mac8_acc: Option<Mac8AccArg>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Result output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Failure policy selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Stop each case at its first mismatch.
    First,
    /// Report every mismatch up to the budget.
    Collect,
}

impl From<PolicyArg> for FailurePolicyKind {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::First => FailurePolicyKind::First,
            PolicyArg::Collect => FailurePolicyKind::Collect,
        }
    }
}

/// MAC8_ACC golden-model policy selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mac8AccArg {
    /// Do not check MAC8_ACC results.
    Unverified,
    /// Same rule as MAC8.
    Narrow,
    /// Full-width accumulate with wraparound.
    Wide,
}

impl From<Mac8AccArg> for Mac8AccMode {
    fn from(arg: Mac8AccArg) -> Self {
        match arg {
            Mac8AccArg::Unverified => Mac8AccMode::Unverified,
            Mac8AccArg::Narrow => Mac8AccMode::Narrow,
            Mac8AccArg::Wide => Mac8AccMode::Wide,
        }
    }
}

/// Defects that can be injected into the built-in DUT model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FaultArg {
    /// SIMD_DOT saturates instead of wrapping.
    SaturatingDot,
    /// MAC8 keeps the full-precision sum.
    WideMac8,
    /// Registers ignore reset.
    NoReset,
    /// `valid_o` never rises.
    ValidStuckLow,
    /// Results appear one edge early.
    SingleStage,
}

impl From<FaultArg> for MacFault {
    fn from(arg: FaultArg) -> Self {
        match arg {
            FaultArg::SaturatingDot => MacFault::SaturatingDot,
            FaultArg::WideMac8 => MacFault::WideMac8,
            FaultArg::NoReset => MacFault::NoReset,
            FaultArg::ValidStuckLow => MacFault::ValidStuckLow,
            FaultArg::SingleStage => MacFault::SingleStage,
        }
    }
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

impl GlobalArgs {
    /// Loads the configuration named by `--config`, or `./harness.toml`,
    /// or the defaults when neither exists.
    pub fn load_config(&self) -> Result<HarnessConfig, ConfigError> {
        match &self.config {
            Some(path) => garuda_config::load_config(Path::new(path)),
            None => {
                let cwd = std::env::current_dir()?;
                garuda_config::load_config_or_default(&cwd)
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };
    init_logging(&global);

    let result = match cli.command {
        Command::Test(ref args) => test::run(args, &global),
        Command::List => list::run(&global),
        Command::Golden(ref args) => golden::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the logger. `RUST_LOG` wins over the verbosity flags.
fn init_logging(global: &GlobalArgs) {
    let default = if global.quiet {
        "error"
    } else if global.verbose {
        "debug"
    } else {
        "warn"
    };
    let style = if global.color {
        env_logger::WriteStyle::Always
    } else {
        env_logger::WriteStyle::Never
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .write_style(style)
        .format_timestamp(None)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_test_default() {
        let cli = Cli::parse_from(["garuda", "test"]);
        match cli.command {
            Command::Test(ref args) => {
                assert!(args.name.is_none());
                assert!(args.filter.is_none());
                assert!(args.seed.is_none());
                assert!(args.iterations.is_none());
                assert!(args.policy.is_none());
                assert!(args.fault.is_none());
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected Test command"),
        }
    }

    #[test]
    fn parse_test_with_name() {
        let cli = Cli::parse_from(["garuda", "test", "simd_dot"]);
        match cli.command {
            Command::Test(ref args) => {
                assert_eq!(args.name.as_deref(), Some("simd_dot"));
            }
            _ => panic!("expected Test command"),
        }
    }

    #[test]
    fn parse_test_overrides() {
        let cli = Cli::parse_from([
            "garuda",
            "test",
            "--filter",
            "mac8",
            "--seed",
            "42",
            "-n",
            "10",
            "--policy",
            "collect",
            "--max-failures",
            "4",
            "--mac8-acc",
            "wide",
            "--fault",
            "saturating-dot",
            "--format",
            "json",
        ]);
        match cli.command {
            Command::Test(ref args) => {
                assert_eq!(args.filter.as_deref(), Some("mac8"));
                assert_eq!(args.seed, Some(42));
                assert_eq!(args.iterations, Some(10));
                assert_eq!(args.policy, Some(PolicyArg::Collect));
                assert_eq!(args.max_failures, Some(4));
                assert_eq!(args.mac8_acc, Some(Mac8AccArg::Wide));
                assert_eq!(args.fault, Some(FaultArg::SaturatingDot));
                assert_eq!(args.format, ReportFormat::Json);
            }
            _ => panic!("expected Test command"),
        }
    }

    #[test]
    fn parse_list() {
        let cli = Cli::parse_from(["garuda", "list"]);
        assert!(matches!(cli.command, Command::List));
    }

    #[test]
    fn parse_golden_negative_operands() {
        let cli = Cli::parse_from([
            "garuda", "golden", "--opcode", "mac8", "--rs1", "10", "--rs2", "-5", "--acc", "20",
        ]);
        match cli.command {
            Command::Golden(ref args) => {
                assert_eq!(args.opcode, Opcode::Mac8);
                assert_eq!(args.rs2, "-5");
                assert!(args.xlen.is_none());
            }
            _ => panic!("expected Golden command"),
        }
    }

    #[test]
    fn parse_golden_rejects_unknown_opcode() {
        let result = Cli::try_parse_from(["garuda", "golden", "--opcode", "div8"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["garuda", "--quiet", "--color", "never", "list"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn parse_config_path() {
        let cli = Cli::parse_from(["garuda", "--config", "/path/to/harness.toml", "test"]);
        assert_eq!(cli.config.as_deref(), Some("/path/to/harness.toml"));
    }

    #[test]
    fn fault_args_map_to_model_faults() {
        assert_eq!(MacFault::from(FaultArg::NoReset), MacFault::NoReset);
        assert_eq!(MacFault::from(FaultArg::SingleStage), MacFault::SingleStage);
        assert_eq!(Mac8AccMode::from(Mac8AccArg::Narrow), Mac8AccMode::Narrow);
        assert_eq!(FailurePolicyKind::from(PolicyArg::First), FailurePolicyKind::First);
    }

    #[test]
    fn explicit_config_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[dut]\nxlen = 16\n").unwrap();
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config: Some(path.to_string_lossy().into_owned()),
        };
        assert_eq!(global.load_config().unwrap().dut.xlen, 16);
    }
}
