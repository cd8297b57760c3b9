//! Call-site logging macros
//!
//! Unlike the logger methods, these fill `module` with the calling module's
//! path and `function` with the enclosing function's name.

/// Name of the enclosing function.
#[doc(hidden)]
#[macro_export]
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let name = name.strip_suffix("::f").unwrap_or(name);
        name.rsplit("::")
            .find(|segment| *segment != "{{closure}}")
            .unwrap_or(name)
    }};
}

/// Logs a `%`-template at an explicit level
///
/// Arguments are converted with `serde_json::Value::from`.
///
/// # Example
///
/// ```
/// use formatter_logger::{log_at, Level, Logger, MemorySink};
///
/// let sink = MemorySink::new();
/// let logger = Logger::builder().sink(sink.clone()).build();
///
/// fn handle(logger: &Logger) -> Result<(), formatter_logger::LogError> {
///     log_at!(logger, Level::Warning, "retry %d of %d", 2, 5)
/// }
///
/// handle(&logger)?;
/// let record = &sink.records()[0];
/// assert_eq!(record["msg"], "retry 2 of 5");
/// assert_eq!(record["function"], "handle");
/// # Ok::<(), formatter_logger::LogError>(())
/// ```
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $level:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $logger.emit(
            $crate::Record::template(
                $level,
                $template,
                ::std::vec![$($crate::Value::from($arg)),*],
            )
            .at(::std::module_path!(), $crate::function_name!()),
        )
    };
}

/// Logs at debug level. See [`log_at!`].
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Debug, $($rest)+)
    };
}

/// Logs at info level. See [`log_at!`].
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Info, $($rest)+)
    };
}

/// Logs at warning level. See [`log_at!`].
#[macro_export]
macro_rules! log_warning {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Warning, $($rest)+)
    };
}

/// Logs at error level. See [`log_at!`].
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Error, $($rest)+)
    };
}

/// Logs at critical level. See [`log_at!`].
#[macro_export]
macro_rules! log_critical {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Critical, $($rest)+)
    };
}
