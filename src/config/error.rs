use std::path::PathBuf;
use thiserror::Error;

/// The single failure signal of the configuration subsystem.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Environment variable is required: {0}")]
    Required(String),

    #[error("Environment variable is invalid: {key}: {detail}")]
    Invalid { key: String, detail: String },

    #[error("Key 'name' must be defined in variables parameter")]
    MissingName,

    #[error("{0}")]
    Rejected(String),

    #[error("required config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("config file value is not a scalar: {0}")]
    NonScalarValue(String),
}

/// Failure returned by a caster.
///
/// `Value` is a plain conversion failure and gets wrapped into
/// [`ConfigError::Invalid`] by the loader. `Config` passes through unchanged,
/// which lets custom validators pick the exact error the caller sees.
#[derive(Debug, Error)]
pub enum CastError {
    #[error("{0}")]
    Value(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CastError {
    pub fn value(detail: impl Into<String>) -> Self {
        Self::Value(detail.into())
    }
}
