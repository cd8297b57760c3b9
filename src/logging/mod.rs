//! Structured JSON logging with a scoped context stack.
//!
//! One [`Logger`] per process is installed with [`setup`]. Every record it
//! writes is a single JSON line made of the record's own fields, the static
//! fields given at setup, and the caller's current context:
//!
//! ```text
//! {"datetime":"…","level":"INFO","msg":"val=7","log_hierarchy":"svc","function":"serve",
//!  "module":"svc::http","thread_name":"main","app":"billing","request_id":"r-1"}
//! ```

#[macro_use]
mod macros;

mod error;
mod format;
mod level;
mod logger;
mod record;
mod setup;
mod sink;

pub use error::LogError;
pub use format::{JsonFormatter, TimeFormat};
pub use level::{Level, LevelSelection, Scope, UnknownLevel, TRACE};
pub use logger::{Logger, ScopeGuard, StructuredLogger};
pub use record::{interpolate, Message, Record};
#[allow(deprecated)]
pub use setup::{logger, setup, setup_logging, LoggerBuilder, DEFAULT_NAME, LOG_LEVEL, LOG_NAME};
pub use sink::{MemorySink, Sink, StdoutSink};
