use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use super::{JsonFormatter, Level, LogError, LoggerBuilder, Record, Scope, Sink};
use crate::context::{ContextFrame, LogContext};

static NEXT_LOGGER_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    // State of every logger, for the current thread, keyed by logger id.
    static CONTEXTS: RefCell<HashMap<u64, ThreadState>> = RefCell::new(HashMap::new());
}

#[derive(Debug, Default)]
struct ThreadState {
    context: LogContext,
    // Frames saved on scope entry, innermost last, tagged with their token.
    scopes: Vec<(u64, ContextFrame)>,
    next_token: u64,
}

/// A logger whose records carry a mutable set of extra fields.
pub trait StructuredLogger {
    /// Merges `pairs` into the context; `None` removes a key.
    fn set<I, K, V>(&self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Option<Value>>;

    /// Clears the context.
    fn reset(&self);

    fn snapshot(&self) -> ContextFrame;

    /// Resets the context and merges `frame` back in.
    fn restore(&self, frame: ContextFrame);

    /// Emits a `%`-template message at `level`.
    fn log(&self, level: Level, template: &str, args: &[Value]) -> Result<(), LogError>;

    /// Saves the context on the scope stack and returns a token naming the
    /// saved frame.
    fn enter_scope(&self) -> u64;

    /// Restores the frame saved under `token` and discards it along with
    /// every frame saved after it. Does nothing if that frame is already gone.
    fn exit_scope(&self, token: u64);

    /// Applies `pairs` until the returned guard is dropped.
    ///
    /// Dropping the guard restores the context exactly as it was before the
    /// call, whether the scope ends normally, by an early return, or by a
    /// panic. Guards nest: the inner one restores the outer scope's state.
    /// If an outer guard is dropped first, it restores the state from before
    /// its own entry and the inner guards left alive become no-ops.
    ///
    /// The guard is tied to the thread that created it, since each thread
    /// has its own context:
    ///
    /// ```compile_fail
    /// use formatter_logger::{Logger, StructuredLogger};
    /// use serde_json::json;
    ///
    /// let logger = Logger::builder().build();
    /// let guard = logger.scoped([("a", json!(1))]);
    /// std::thread::scope(|s| {
    ///     s.spawn(move || drop(guard));
    /// });
    /// ```
    ///
    /// ```
    /// use formatter_logger::{Logger, MemorySink, StructuredLogger};
    /// use serde_json::json;
    ///
    /// let sink = MemorySink::new();
    /// let logger = Logger::builder().sink(sink.clone()).build();
    ///
    /// logger.set([("a", json!("before"))]);
    /// {
    ///     let scoped = logger.scoped([("a", json!("in")), ("b", json!("context"))]);
    ///     scoped.error("fail inside context", &[])?;
    /// }
    /// logger.error("fail after context", &[])?;
    ///
    /// let records = sink.records();
    /// assert_eq!(records[0]["a"], "in");
    /// assert_eq!(records[1]["a"], "before");
    /// assert!(records[1].get("b").is_none());
    /// # Ok::<(), formatter_logger::LogError>(())
    /// ```
    fn scoped<I, K, V>(&self, pairs: I) -> ScopeGuard<'_, Self>
    where
        Self: Sized,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Option<Value>>,
    {
        let token = self.enter_scope();
        self.set(pairs);
        ScopeGuard {
            logger: self,
            token,
            _not_send: PhantomData,
        }
    }

    /// Runs `f` with `pairs` applied, then restores the context.
    fn with_scope<I, K, V, F, R>(&self, pairs: I, f: F) -> R
    where
        Self: Sized,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Option<Value>>,
        F: FnOnce(&Self) -> R,
    {
        let _guard = self.scoped(pairs);
        f(self)
    }
}

/// Restores a logger's context when dropped. See [`StructuredLogger::scoped`].
#[must_use = "the context is restored as soon as the guard is dropped"]
pub struct ScopeGuard<'a, L: StructuredLogger + ?Sized> {
    logger: &'a L,
    token: u64,
    _not_send: PhantomData<*const ()>,
}

impl<L: StructuredLogger + ?Sized> Deref for ScopeGuard<'_, L> {
    type Target = L;

    fn deref(&self) -> &L {
        self.logger
    }
}

impl<L: StructuredLogger + ?Sized> Drop for ScopeGuard<'_, L> {
    fn drop(&mut self) {
        self.logger.exit_scope(self.token);
    }
}

impl<L: StructuredLogger + ?Sized> fmt::Debug for ScopeGuard<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeGuard")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// The structured JSON logger.
///
/// Each thread sees its own context for a given logger, so scoped blocks
/// running concurrently on different threads never observe each other's
/// fields. Static fields, level, and sink are shared.
#[derive(Debug)]
pub struct Logger {
    id: u64,
    scope: Scope,
    level: Level,
    formatter: JsonFormatter,
    sink: Box<dyn Sink>,
}

impl Logger {
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub(crate) fn new(scope: Scope, level: Level, formatter: JsonFormatter, sink: Box<dyn Sink>) -> Self {
        Self {
            id: NEXT_LOGGER_ID.fetch_add(1, Ordering::Relaxed),
            scope,
            level,
            formatter,
            sink,
        }
    }

    /// `log_hierarchy` of records emitted directly through this logger.
    pub fn name(&self) -> &str {
        self.scope.name()
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn formatter(&self) -> &JsonFormatter {
        &self.formatter
    }

    pub fn is_enabled_for(&self, level: Level) -> bool {
        level >= self.level
    }

    /// A copy of the current thread's context.
    pub fn context(&self) -> LogContext {
        self.with_context(|context| context.clone())
    }

    fn with_context<R>(&self, f: impl FnOnce(&mut LogContext) -> R) -> R {
        self.with_state(|state| f(&mut state.context))
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut ThreadState) -> R) -> R {
        CONTEXTS.with(|contexts| f(contexts.borrow_mut().entry(self.id).or_default()))
    }

    /// Renders and writes `record` if its level passes the threshold.
    ///
    /// A record without a logger name gets this logger's name.
    pub fn emit(&self, record: Record) -> Result<(), LogError> {
        if !self.is_enabled_for(record.level()) {
            return Ok(());
        }
        let record = if record.logger().is_empty() {
            record.with_logger(self.name())
        } else {
            record
        };
        let line = self.with_context(|context| self.formatter.format(&record, context))?;
        self.sink.write_line(&line)?;
        Ok(())
    }

    #[track_caller]
    fn log_at(&self, level: Level, template: &str, args: &[Value]) -> Result<(), LogError> {
        self.emit(Record::template(level, template, args.to_vec()).at_location(Location::caller()))
    }

    #[track_caller]
    pub fn debug(&self, template: &str, args: &[Value]) -> Result<(), LogError> {
        self.log_at(Level::Debug, template, args)
    }

    #[track_caller]
    pub fn info(&self, template: &str, args: &[Value]) -> Result<(), LogError> {
        self.log_at(Level::Info, template, args)
    }

    #[track_caller]
    pub fn warning(&self, template: &str, args: &[Value]) -> Result<(), LogError> {
        self.log_at(Level::Warning, template, args)
    }

    #[track_caller]
    pub fn error(&self, template: &str, args: &[Value]) -> Result<(), LogError> {
        self.log_at(Level::Error, template, args)
    }

    #[track_caller]
    pub fn critical(&self, template: &str, args: &[Value]) -> Result<(), LogError> {
        self.log_at(Level::Critical, template, args)
    }

    /// Logs at error level with `error` and its sources as the traceback.
    #[track_caller]
    pub fn exception(
        &self,
        template: &str,
        args: &[Value],
        error: &(dyn std::error::Error + 'static),
    ) -> Result<(), LogError> {
        self.emit(
            Record::template(Level::Error, template, args.to_vec())
                .at_location(Location::caller())
                .with_error(error),
        )
    }
}

impl StructuredLogger for Logger {
    fn set<I, K, V>(&self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Option<Value>>,
    {
        self.with_context(|context| context.set(pairs));
    }

    fn reset(&self) {
        self.with_context(LogContext::reset);
    }

    fn snapshot(&self) -> ContextFrame {
        self.with_context(|context| context.snapshot())
    }

    fn restore(&self, frame: ContextFrame) {
        self.with_context(|context| context.restore(frame));
    }

    #[track_caller]
    fn log(&self, level: Level, template: &str, args: &[Value]) -> Result<(), LogError> {
        self.log_at(level, template, args)
    }

    fn enter_scope(&self) -> u64 {
        self.with_state(|state| {
            let token = state.next_token;
            state.next_token += 1;
            state.scopes.push((token, state.context.snapshot()));
            token
        })
    }

    fn exit_scope(&self, token: u64) {
        // During thread teardown the state may already be gone; nothing is left to restore then.
        let _ = CONTEXTS.try_with(|contexts| {
            let mut contexts = contexts.borrow_mut();
            let state = contexts.entry(self.id).or_default();
            let Some(position) = state.scopes.iter().position(|(saved, _)| *saved == token) else {
                return;
            };
            let saved = state.scopes.drain(position..).next();
            if let Some((_, frame)) = saved {
                state.context.restore(frame);
            }
        });
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        let id = self.id;
        let _ = CONTEXTS.try_with(|contexts| contexts.borrow_mut().remove(&id));
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        self.is_enabled_for(metadata.level().into()) && self.scope.contains(metadata.target())
    }

    fn log(&self, record: &log::Record<'_>) {
        if !log::Log::enabled(self, record.metadata()) {
            return;
        }
        let function = record
            .line()
            .map(|line| format!("<line {line}>"))
            .unwrap_or_default();
        let rendered = Record::formatted(record.level().into(), record.args().to_string())
            .with_logger(record.target())
            .at(record.module_path().unwrap_or_default(), function);

        if let Err(err) = self.emit(rendered) {
            eprintln!("formatter-logger: failed to emit record: {err}");
        }
    }

    fn flush(&self) {}
}
