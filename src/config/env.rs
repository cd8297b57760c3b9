use std::collections::HashMap;
use std::env::VarError;

use super::ConfigError;

/// Source of raw configuration values.
///
/// The loader and casters only ever see `Option<String>`, so any key/value
/// store can stand in for the process environment.
pub trait EnvironmentReader: std::fmt::Debug {
    fn get(&self, key: &str) -> Option<String>;

    /// Like [`get`](Self::get), but fails on a value that cannot be read
    /// faithfully as text instead of approximating it.
    fn try_get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.get(key))
    }
}

impl<T: EnvironmentReader + ?Sized> EnvironmentReader for &T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn try_get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        (**self).try_get(key)
    }
}

/// Reads from the environment of the current process.
///
/// Values that are not valid unicode are converted lossily by `get` and
/// rejected by `try_get`, which is what the loaders use.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvironmentReader for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var_os(key).map(|value| value.to_string_lossy().into_owned())
    }

    fn try_get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match std::env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(_)) => Err(ConfigError::Invalid {
                key: key.to_owned(),
                detail: "not valid unicode".to_owned(),
            }),
        }
    }
}

/// An in-memory set of variables.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }
}

impl EnvironmentReader for MapEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}
