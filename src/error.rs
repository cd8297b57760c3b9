use crate::config::ConfigError;
use crate::logging::LogError;
use crate::schema::SchemaError;
use thiserror::Error;

/// Top-level error type for the formatter-logger library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("logging error: {0}")]
    Log(#[from] LogError),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
}
