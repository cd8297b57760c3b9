pub mod config;
pub mod context;
mod error;
pub mod logging;
pub mod schema;
pub mod time;

pub use config::{config, ConfigError, ConfigSpec};
pub use context::{ContextFrame, LogContext};
pub use error::Error;
pub use logging::{
    logger, setup, Level, LogError, Logger, LoggerBuilder, MemorySink, Record, StructuredLogger,
};
pub use schema::validate_json;
pub use serde_json::Value;
