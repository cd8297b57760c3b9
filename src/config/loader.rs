use std::fmt;

use log::debug;

use super::cast::text;
use super::env::{EnvironmentReader, ProcessEnv};
use super::{CastError, ConfigError};

/// Fn-pointer form of a caster, the default caster type of [`ConfigSpec`].
pub type CastFn<T> = fn(&str) -> Result<T, CastError>;

/// Describes how to load one configuration value.
///
/// A spec without a default is required: loading fails if the key is
/// absent. A default is returned unchanged when the key is absent and
/// never goes through the caster.
///
/// ## Example
///
/// ```
/// use formatter_logger::config::{cast, ConfigSpec, MapEnv};
///
/// let env = MapEnv::new().with("PORT", "8080");
///
/// let port = ConfigSpec::with_cast("PORT", cast::parse::<u16>).load(&env)?;
/// let debug = ConfigSpec::with_cast("DEBUG", cast::boolean)
///     .with_default(false)
///     .load(&env)?;
///
/// assert_eq!(port, 8080);
/// assert!(!debug);
/// # Ok::<(), formatter_logger::ConfigError>(())
/// ```
#[must_use = "a config spec does nothing until .load() is called"]
pub struct ConfigSpec<T, C = CastFn<T>> {
    key: String,
    default: Option<T>,
    caster: C,
}

impl ConfigSpec<String> {
    /// A required string value.
    pub fn new(key: impl Into<String>) -> Self {
        Self::with_cast(key, text as CastFn<String>)
    }
}

impl<T, C> ConfigSpec<T, C>
where
    C: Fn(&str) -> Result<T, CastError>,
{
    /// A required value converted by `caster`.
    pub fn with_cast(key: impl Into<String>, caster: C) -> Self {
        Self {
            key: key.into(),
            default: None,
            caster,
        }
    }

    /// Makes the value optional, falling back to `default`.
    pub fn with_default(mut self, default: T) -> Self {
        self.default = Some(default);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    /// Resolves the value from `env`.
    pub fn load<E>(self, env: &E) -> Result<T, ConfigError>
    where
        E: EnvironmentReader + ?Sized,
        T: fmt::Debug,
    {
        let Some(raw) = env.try_get(&self.key)? else {
            return match self.default {
                Some(default) => {
                    debug!("{}={:?}", self.key, default);
                    Ok(default)
                }
                None => Err(ConfigError::Required(self.key)),
            };
        };

        debug!("{}={}", self.key, raw);

        (self.caster)(&raw).map_err(|err| match err {
            CastError::Value(detail) => ConfigError::Invalid {
                key: self.key,
                detail,
            },
            CastError::Config(err) => err,
        })
    }
}

impl<T: fmt::Debug, C> fmt::Debug for ConfigSpec<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigSpec")
            .field("key", &self.key)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

/// Loads `key` from the process environment.
///
/// `default: None` makes the key required. To default to "nothing", use an
/// `Option` target type and pass `Some(None)`.
///
/// ```no_run
/// use formatter_logger::config::{cast, config};
///
/// let workers: u32 = config("WORKERS", Some(4), cast::parse)?;
/// let mode = config("MODE", None, cast::choices(&["fast", "safe"]))?;
/// # Ok::<(), formatter_logger::ConfigError>(())
/// ```
pub fn config<T, C>(key: &str, default: Option<T>, cast: C) -> Result<T, ConfigError>
where
    T: fmt::Debug,
    C: Fn(&str) -> Result<T, CastError>,
{
    ConfigSpec {
        key: key.to_owned(),
        default,
        caster: cast,
    }
    .load(&ProcessEnv)
}
