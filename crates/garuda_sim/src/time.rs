//! Simulation time with femtosecond precision and delta cycles, plus
//! parsing of human-written durations such as `"10ns"`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Femtoseconds per picosecond.
pub const FS_PER_PS: u64 = 1_000;
/// Femtoseconds per nanosecond.
pub const FS_PER_NS: u64 = 1_000_000;
/// Femtoseconds per microsecond.
pub const FS_PER_US: u64 = 1_000_000_000;
/// Femtoseconds per millisecond.
pub const FS_PER_MS: u64 = 1_000_000_000_000;
/// Femtoseconds per second.
pub const FS_PER_S: u64 = 1_000_000_000_000_000;

/// A simulation time point with femtosecond resolution and delta cycle tracking.
///
/// Points are ordered first by femtosecond timestamp, then by delta cycle.
/// Delta cycles count the combinational settling passes at one timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SimTime {
    /// Simulation time in femtoseconds.
    pub fs: u64,
    /// Delta cycle index within the current time step.
    pub delta: u32,
}

impl SimTime {
    /// Time zero, delta zero.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Creates a time from a nanosecond value with delta 0.
    pub fn from_ns(ns: u64) -> Self {
        Self::from_fs(ns * FS_PER_NS)
    }

    /// Creates a time from a femtosecond value with delta 0.
    pub fn from_fs(fs: u64) -> Self {
        Self { fs, delta: 0 }
    }

    /// Returns the next delta cycle at the same timestamp.
    pub fn next_delta(&self) -> Self {
        Self {
            fs: self.fs,
            delta: self.delta + 1,
        }
    }

    /// Advances to a new timestamp, resetting the delta counter.
    pub fn advance_to(&self, new_fs: u64) -> Self {
        debug_assert!(
            new_fs >= self.fs,
            "cannot advance backwards: {} -> {}",
            self.fs,
            new_fs
        );
        Self::from_fs(new_fs)
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fs.cmp(&other.fs).then(self.delta.cmp(&other.delta))
    }
}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_duration(self.fs))?;
        if self.delta > 0 {
            write!(f, "+d{}", self.delta)?;
        }
        Ok(())
    }
}

/// Formats a femtosecond duration using the largest unit that divides it exactly.
pub fn format_duration(fs: u64) -> String {
    const UNITS: [(u64, &str); 5] = [
        (FS_PER_S, "s"),
        (FS_PER_MS, "ms"),
        (FS_PER_US, "us"),
        (FS_PER_NS, "ns"),
        (FS_PER_PS, "ps"),
    ];
    if fs == 0 {
        return "0 fs".to_string();
    }
    for (scale, unit) in UNITS {
        if fs >= scale && fs % scale == 0 {
            return format!("{} {unit}", fs / scale);
        }
    }
    format!("{fs} fs")
}

/// Error returned by [`parse_duration`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseDurationError {
    /// The input was empty or whitespace.
    #[error("empty duration string")]
    Empty,
    /// No leading digits were found.
    #[error("invalid duration: no numeric value in '{0}'")]
    NoNumber(String),
    /// A number was given without a unit.
    #[error("missing unit in duration '{0}' (use fs, ps, ns, us, ms, or s)")]
    MissingUnit(String),
    /// The unit suffix is not recognized.
    #[error("unknown duration unit '{0}' (use fs, ps, ns, us, ms, or s)")]
    UnknownUnit(String),
    /// The value does not fit in 64 bits of femtoseconds.
    #[error("duration '{0}' is too large")]
    Overflow(String),
}

/// Parses a duration like `"10ns"` or `"1 us"` into femtoseconds.
pub fn parse_duration(s: &str) -> Result<u64, ParseDurationError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ParseDurationError::Empty);
    }

    let digit_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if digit_end == 0 {
        return Err(ParseDurationError::NoNumber(s.to_string()));
    }

    let number: u64 = s[..digit_end]
        .parse()
        .map_err(|_| ParseDurationError::Overflow(s.to_string()))?;

    let multiplier = match s[digit_end..].trim() {
        "fs" => 1,
        "ps" => FS_PER_PS,
        "ns" => FS_PER_NS,
        "us" => FS_PER_US,
        "ms" => FS_PER_MS,
        "s" => FS_PER_S,
        "" => return Err(ParseDurationError::MissingUnit(s.to_string())),
        unit => return Err(ParseDurationError::UnknownUnit(unit.to_string())),
    };

    number
        .checked_mul(multiplier)
        .ok_or_else(|| ParseDurationError::Overflow(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_ns() {
        let t = SimTime::from_ns(10);
        assert_eq!(t.fs, 10_000_000);
        assert_eq!(t.delta, 0);
    }

    #[test]
    fn next_delta_keeps_timestamp() {
        let t = SimTime::from_ns(5).next_delta().next_delta();
        assert_eq!(t.fs, 5 * FS_PER_NS);
        assert_eq!(t.delta, 2);
    }

    #[test]
    fn advance_resets_delta() {
        let t = SimTime { fs: 100, delta: 5 }.advance_to(200);
        assert_eq!(t, SimTime::from_fs(200));
    }

    #[test]
    fn ordering_fs_then_delta() {
        assert!(SimTime::from_ns(1) < SimTime::from_ns(2));
        assert!(SimTime { fs: 100, delta: 0 } < SimTime { fs: 100, delta: 1 });
        assert!(SimTime { fs: 200, delta: 0 } > SimTime { fs: 100, delta: 99 });
    }

    #[test]
    fn display_units() {
        assert_eq!(SimTime::zero().to_string(), "0 fs");
        assert_eq!(SimTime::from_ns(10).to_string(), "10 ns");
        assert_eq!(SimTime::from_fs(5 * FS_PER_US).to_string(), "5 us");
        assert_eq!(SimTime::from_fs(1500).to_string(), "1500 fs");
        assert_eq!(SimTime { fs: FS_PER_NS, delta: 3 }.to_string(), "1 ns+d3");
    }

    #[test]
    fn parse_common_units() {
        assert_eq!(parse_duration("10ns"), Ok(10 * FS_PER_NS));
        assert_eq!(parse_duration("1us"), Ok(FS_PER_US));
        assert_eq!(parse_duration("250ps"), Ok(250 * FS_PER_PS));
        assert_eq!(parse_duration("42fs"), Ok(42));
        assert_eq!(parse_duration("  20 ns "), Ok(20 * FS_PER_NS));
    }

    #[test]
    fn parse_errors() {
        assert_eq!(parse_duration(""), Err(ParseDurationError::Empty));
        assert!(matches!(
            parse_duration("ns"),
            Err(ParseDurationError::NoNumber(_))
        ));
        assert!(matches!(
            parse_duration("100"),
            Err(ParseDurationError::MissingUnit(_))
        ));
        assert!(matches!(
            parse_duration("100xyz"),
            Err(ParseDurationError::UnknownUnit(_))
        ));
        assert!(matches!(
            parse_duration("99999999s"),
            Err(ParseDurationError::Overflow(_))
        ));
    }

    #[test]
    fn serde_roundtrip() {
        let t = SimTime { fs: 12345, delta: 7 };
        let json = serde_json::to_string(&t).unwrap();
        let back: SimTime = serde_json::from_str(&json).unwrap();
        assert_eq!(t, back);
    }
}
