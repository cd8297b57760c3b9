//! Typed configuration loading from environment variables.

pub mod cast;
mod env;
mod error;
mod file;
mod legacy;
mod loader;

pub use cast::{boolean, choices, one_of, parse, text, valid_dir, valid_executable, valid_file};
pub use env::{EnvironmentReader, MapEnv, ProcessEnv};
pub use error::{CastError, ConfigError};
pub use file::FileEnv;
#[allow(deprecated)]
pub use legacy::{config_validator, config_validator_with, VarType, VariableSpec};
pub use loader::{config, CastFn, ConfigSpec};
