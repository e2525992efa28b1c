//! Error types for `harness.toml` loading and validation.

/// Errors that can occur when loading or validating a `harness.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The harness file could not be read.
    #[error("cannot read harness file: {0}")]
    IoError(#[from] std::io::Error),

    /// The harness file is not valid TOML or has mistyped keys.
    #[error("malformed harness file: {0}")]
    ParseError(String),

    /// A setting is outside what the harness can drive.
    #[error("invalid harness setting: {0}")]
    ValidationError(String),
}
