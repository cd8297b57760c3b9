use thiserror::Error;

/// Failure to render or write a record.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LogError {
    #[error("not enough arguments for format string")]
    NotEnoughArguments,

    #[error("not all arguments converted during string formatting")]
    TooManyArguments,

    #[error("incomplete format")]
    IncompleteFormat,

    #[error("unsupported format character '{0}'")]
    UnsupportedConversion(char),

    #[error("%{conversion} format: a number is required, not {value}")]
    NotANumber { conversion: char, value: String },

    #[error("%c requires an int or a single character, not {0}")]
    CharRequired(String),

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write record: {0}")]
    Write(#[from] std::io::Error),
}
