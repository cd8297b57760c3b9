//! Process-wide installation of the logger.

use std::sync::OnceLock;

use serde_json::Value;

use super::{JsonFormatter, Level, LevelSelection, Logger, Scope, Sink, StdoutSink, StructuredLogger, TimeFormat};
use crate::config::{EnvironmentReader, ProcessEnv};

/// Variable holding the level name.
pub const LOG_LEVEL: &str = "LOG_LEVEL";
/// Variable holding the scope name.
pub const LOG_NAME: &str = "LOG_NAME";
/// Scope name used when none is given.
pub const DEFAULT_NAME: &str = "default";

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// Builder for a [`Logger`].
///
/// Explicit settings win over values read with [`from_env`](Self::from_env).
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct LoggerBuilder {
    name: Option<String>,
    level: Option<LevelSelection>,
    formatter: JsonFormatter,
    sink: Option<Box<dyn Sink>>,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `LOG_LEVEL` and `LOG_NAME` for settings not given explicitly.
    pub fn from_env<E: EnvironmentReader + ?Sized>(mut self, env: &E) -> Self {
        if self.name.is_none() {
            self.name = env.get(LOG_NAME);
        }
        if self.level.is_none() {
            self.level = Some(LevelSelection::resolve(env.get(LOG_LEVEL).as_deref()));
        }
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = Some(LevelSelection {
            level,
            root_scope: false,
        });
        self
    }

    /// Selects the level by name, with the same rules as `LOG_LEVEL`.
    pub fn level_name(mut self, name: &str) -> Self {
        self.level = Some(LevelSelection::resolve(Some(name)));
        self
    }

    /// Adds a static field written on every record.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.formatter = self.formatter.with_static_fields([(key.into(), value.into())]);
        self
    }

    pub fn fields<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.formatter = self.formatter.with_static_fields(fields);
        self
    }

    pub fn time_format(mut self, time_format: TimeFormat) -> Self {
        self.formatter = self.formatter.with_time_format(time_format);
        self
    }

    /// Replaces the output, standard output by default.
    pub fn sink(mut self, sink: impl Sink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn build(self) -> Logger {
        let selection = self.level.unwrap_or(LevelSelection {
            level: Level::Info,
            root_scope: false,
        });
        let scope = if selection.root_scope {
            Scope::Root
        } else {
            Scope::Named(self.name.unwrap_or_else(|| DEFAULT_NAME.to_owned()))
        };
        let sink = self.sink.unwrap_or_else(|| Box::new(StdoutSink));
        Logger::new(scope, selection.level, self.formatter, sink)
    }
}

/// Installs the process-wide logger.
///
/// Only the first call builds and installs `builder`; it also becomes the
/// `log` crate's logger unless another one was installed first. Later calls
/// ignore their builder and return the installed logger, so the level and
/// sink are never reconfigured and records are never duplicated.
pub fn setup(builder: LoggerBuilder) -> &'static Logger {
    let mut installed = false;
    let logger = LOGGER.get_or_init(|| {
        installed = true;
        builder.build()
    });
    if installed && log::set_logger(logger).is_ok() {
        log::set_max_level(logger.level().to_level_filter());
    }
    logger
}

/// The process-wide logger, set up from the environment on first use.
pub fn logger() -> &'static Logger {
    match LOGGER.get() {
        Some(logger) => logger,
        None => setup(LoggerBuilder::new().from_env(&ProcessEnv)),
    }
}

/// Replaces the current thread's context with `pairs`.
#[deprecated(note = "use `set` or `scoped` on the logger instead")]
pub fn setup_logging<I, K, V>(pairs: I) -> &'static Logger
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Option<Value>>,
{
    let logger = logger();
    logger.reset();
    logger.set(pairs);
    logger
}
