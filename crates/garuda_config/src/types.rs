//! Configuration type definitions for `harness.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

/// Top-level harness configuration parsed from `harness.toml`.
///
/// Every section is optional; a missing section takes its documented defaults.
#[derive(Debug, Default, Deserialize)]
pub struct HarnessConfig {
    /// Properties of the design under test.
    #[serde(default)]
    pub dut: DutConfig,
    /// Clock generator settings.
    #[serde(default)]
    pub clock: ClockConfig,
    /// Reset sequence settings.
    #[serde(default)]
    pub reset: ResetConfig,
    /// Deadlines for waiting on the DUT.
    #[serde(default)]
    pub timing: TimingConfig,
    /// Randomized regression settings.
    #[serde(default)]
    pub regression: RegressionConfig,
}

/// The `[dut]` section.
#[derive(Debug, Deserialize)]
pub struct DutConfig {
    /// Datapath width W in bits.
    #[serde(default = "default_xlen")]
    pub xlen: u32,
    /// Rising edges between driving a vector and sampling its result.
    #[serde(default = "default_latency")]
    pub latency: u32,
}

impl Default for DutConfig {
    fn default() -> Self {
        Self {
            xlen: default_xlen(),
            latency: default_latency(),
        }
    }
}

/// The `[clock]` section.
#[derive(Debug, Deserialize)]
pub struct ClockConfig {
    /// Name of the clock input port.
    #[serde(default = "default_clock_port")]
    pub port: String,
    /// Clock period in femtoseconds. Written as a duration string such as `"10ns"`.
    #[serde(
        rename = "period",
        default = "default_period_fs",
        deserialize_with = "deserialize_duration"
    )]
    pub period_fs: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            port: default_clock_port(),
            period_fs: default_period_fs(),
        }
    }
}

/// The `[reset]` section.
#[derive(Debug, Deserialize)]
pub struct ResetConfig {
    /// Name of the active-low reset input port.
    #[serde(default = "default_reset_port")]
    pub port: String,
    /// How long reset is held asserted, in femtoseconds.
    #[serde(
        rename = "hold",
        default = "default_hold_fs",
        deserialize_with = "deserialize_duration"
    )]
    pub hold_fs: u64,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            port: default_reset_port(),
            hold_fs: default_hold_fs(),
        }
    }
}

/// The `[timing]` section.
#[derive(Debug, Deserialize)]
pub struct TimingConfig {
    /// Longest wait for a single rising edge before the DUT is declared
    /// unresponsive, in femtoseconds.
    #[serde(
        rename = "edge_timeout",
        default = "default_edge_timeout_fs",
        deserialize_with = "deserialize_duration"
    )]
    pub edge_timeout_fs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            edge_timeout_fs: default_edge_timeout_fs(),
        }
    }
}

/// The `[regression]` section.
#[derive(Debug, Deserialize)]
pub struct RegressionConfig {
    /// Vectors generated per randomized case.
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Fixed seed. When absent a fresh seed is drawn and reported.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Whether a run stops at the first mismatch.
    #[serde(default)]
    pub failure_policy: FailurePolicyKind,
    /// Mismatch cap under [`FailurePolicyKind::Collect`].
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,
    /// Which reading of MAC8_ACC the golden model checks against.
    #[serde(default)]
    pub mac8_acc: Mac8AccMode,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            seed: None,
            failure_policy: FailurePolicyKind::default(),
            max_failures: default_max_failures(),
            mac8_acc: Mac8AccMode::default(),
        }
    }
}

/// How a test run reacts to a mismatch.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicyKind {
    /// Abort the case at the first mismatch (default).
    #[default]
    First,
    /// Keep going and report every mismatch up to `max_failures`.
    Collect,
}

/// Golden-model treatment of the MAC8_ACC opcode.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mac8AccMode {
    /// No golden value; results are not checked (default).
    #[default]
    Unverified,
    /// Same truncation as MAC8.
    Narrow,
    /// Signed 8x8 product plus full-width accumulator, wrapped to W bits.
    Wide,
}

fn default_xlen() -> u32 {
    32
}

fn default_latency() -> u32 {
    2
}

fn default_clock_port() -> String {
    "clk_i".to_string()
}

fn default_period_fs() -> u64 {
    10 * garuda_sim::time::FS_PER_NS
}

fn default_reset_port() -> String {
    "rst_ni".to_string()
}

fn default_hold_fs() -> u64 {
    20 * garuda_sim::time::FS_PER_NS
}

fn default_edge_timeout_fs() -> u64 {
    garuda_sim::time::FS_PER_US
}

fn default_iterations() -> u32 {
    1000
}

fn default_max_failures() -> u32 {
    16
}

/// Deserializes a duration given either as a string with a unit
/// (`"10ns"`, `"1 us"`) or as a bare integer count of femtoseconds.
fn deserialize_duration<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    struct Duration;

    impl<'de> Visitor<'de> for Duration {
        type Value = u64;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a duration string like \"10ns\" or an integer of femtoseconds")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            garuda_sim::parse_duration(v)
                .map_err(|e| E::custom(format!("invalid duration '{v}': {e}")))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            u64::try_from(v).map_err(|_| E::custom(format!("negative duration {v}")))
        }
    }

    deserializer.deserialize_any(Duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use garuda_sim::time::{FS_PER_NS, FS_PER_US};

    #[test]
    fn empty_document_uses_defaults() {
        let config: HarnessConfig = toml::from_str("").unwrap();
        assert_eq!(config.dut.xlen, 32);
        assert_eq!(config.dut.latency, 2);
        assert_eq!(config.clock.port, "clk_i");
        assert_eq!(config.clock.period_fs, 10 * FS_PER_NS);
        assert_eq!(config.reset.port, "rst_ni");
        assert_eq!(config.reset.hold_fs, 20 * FS_PER_NS);
        assert_eq!(config.timing.edge_timeout_fs, FS_PER_US);
        assert_eq!(config.regression.iterations, 1000);
        assert_eq!(config.regression.seed, None);
        assert_eq!(config.regression.failure_policy, FailurePolicyKind::First);
        assert_eq!(config.regression.mac8_acc, Mac8AccMode::Unverified);
    }

    #[test]
    fn duration_accepts_string_and_integer() {
        let config: HarnessConfig = toml::from_str(
            r#"
[clock]
period = "4 ns"

[reset]
hold = 50000000
"#,
        )
        .unwrap();
        assert_eq!(config.clock.period_fs, 4 * FS_PER_NS);
        assert_eq!(config.reset.hold_fs, 50 * FS_PER_NS);
    }

    #[test]
    fn duration_rejects_missing_unit() {
        let err = toml::from_str::<HarnessConfig>("[clock]\nperiod = \"10\"\n").unwrap_err();
        assert!(err.to_string().contains("invalid duration"));
    }

    #[test]
    fn enums_are_lowercase() {
        let config: HarnessConfig = toml::from_str(
            r#"
[regression]
failure_policy = "collect"
mac8_acc = "wide"
seed = 7
"#,
        )
        .unwrap();
        assert_eq!(config.regression.failure_policy, FailurePolicyKind::Collect);
        assert_eq!(config.regression.mac8_acc, Mac8AccMode::Wide);
        assert_eq!(config.regression.seed, Some(7));
    }

    #[test]
    fn unknown_policy_rejected() {
        assert!(toml::from_str::<HarnessConfig>("[regression]\nfailure_policy = \"all\"\n").is_err());
    }
}
