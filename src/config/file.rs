//! File-backed environment reader.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use toml::Value;

use super::env::EnvironmentReader;
use super::ConfigError;

/// Variables loaded from a flat TOML file.
///
/// Only top-level scalar keys are accepted; every value is handed to the
/// casters as its string form, exactly as if it came from the environment.
///
/// ```toml
/// LOG_LEVEL = "DEBUG"
/// WORKERS = 4
/// VERBOSE = true
/// ```
#[derive(Debug, Clone)]
pub struct FileEnv {
    path: PathBuf,
    vars: HashMap<String, String>,
}

impl FileEnv {
    /// Loads the file at `path`.
    ///
    /// If `required` is false, a missing file yields an empty reader.
    pub fn load(path: impl AsRef<Path>, required: bool) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let vars = match load_table(&path, required)? {
            Some(table) => flatten(table)?,
            None => HashMap::new(),
        };
        Ok(Self { path, vars })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EnvironmentReader for FileEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

fn load_table(path: &Path, required: bool) -> Result<Option<toml::Table>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let table = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
            Ok(Some(table))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if required {
                Err(ConfigError::FileNotFound(path.to_path_buf()))
            } else {
                Ok(None)
            }
        }
        Err(e) => Err(ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn flatten(table: toml::Table) -> Result<HashMap<String, String>, ConfigError> {
    table
        .into_iter()
        .map(|(key, value)| {
            let text = scalar_to_string(&value, &key)?;
            Ok((key, text))
        })
        .collect()
}

fn scalar_to_string(value: &Value, key: &str) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::Datetime(dt) => Ok(dt.to_string()),
        Value::Array(_) | Value::Table(_) => Err(ConfigError::NonScalarValue(key.to_string())),
    }
}
