use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use super::{LogError, Record};
use crate::context::LogContext;

/// How the `datetime` field is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeFormat {
    /// `2024-05-01T12:00:00.123456Z`
    #[default]
    Rfc3339,
    /// Milliseconds since the unix epoch, as a number.
    EpochMillis,
}

impl TimeFormat {
    fn render(self, timestamp: &DateTime<Utc>) -> Value {
        match self {
            TimeFormat::Rfc3339 => Value::String(timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)),
            TimeFormat::EpochMillis => Value::from(timestamp.timestamp_millis()),
        }
    }
}

/// Renders records as single-line JSON objects.
///
/// Field order and precedence, later entries winning on collision:
/// 1. `datetime`, `level`, `msg`, `log_hierarchy`, `function`, `module`, `thread_name`
/// 2. static fields given at setup
/// 3. the live [`LogContext`]
/// 4. `traceback` and `stack_info`, when the record carries them
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    static_fields: Vec<(String, Value)>,
    time_format: TimeFormat,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_static_fields<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.static_fields
            .extend(fields.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    #[must_use]
    pub fn with_time_format(mut self, time_format: TimeFormat) -> Self {
        self.time_format = time_format;
        self
    }

    pub fn static_fields(&self) -> &[(String, Value)] {
        &self.static_fields
    }

    pub fn time_format(&self) -> TimeFormat {
        self.time_format
    }

    /// Builds the JSON object for `record`.
    pub fn render(&self, record: &Record, context: &LogContext) -> Result<Map<String, Value>, LogError> {
        let mut data = Map::new();
        data.insert("datetime".into(), self.time_format.render(record.timestamp()));
        data.insert("level".into(), record.level().as_str().into());
        data.insert("msg".into(), record.message().render()?.into_owned().into());
        data.insert("log_hierarchy".into(), record.logger().into());
        data.insert("function".into(), record.function().into());
        data.insert("module".into(), record.module().into());
        data.insert("thread_name".into(), record.thread_name().into());

        for (key, value) in &self.static_fields {
            data.insert(key.clone(), value.clone());
        }
        for (key, value) in context.iter() {
            data.insert(key.to_owned(), value.clone());
        }

        if let Some(traceback) = record.traceback() {
            data.insert("traceback".into(), traceback.into());
        }
        if let Some(stack_info) = record.stack_info() {
            data.insert("stack_info".into(), stack_info.into());
        }

        Ok(data)
    }

    /// Renders `record` as one line of JSON, without the trailing newline.
    pub fn format(&self, record: &Record, context: &LogContext) -> Result<String, LogError> {
        let data = self.render(record, context)?;
        Ok(serde_json::to_string(&data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Level;
    use chrono::TimeZone;
    use serde_json::json;

    fn record() -> Record {
        Record::template(Level::Warning, "val=%s", vec![json!(7)])
            .with_logger("svc")
            .at("handlers", "serve")
            .with_timestamp(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
    }

    #[test]
    fn test_base_fields_in_order() {
        let line = JsonFormatter::new().format(&record(), &LogContext::new()).unwrap();
        let thread = std::thread::current();
        let expected = format!(
            "{{\"datetime\":\"2024-05-01T12:00:00.000000Z\",\"level\":\"WARNING\",\"msg\":\"val=7\",\
             \"log_hierarchy\":\"svc\",\"function\":\"serve\",\"module\":\"handlers\",\
             \"thread_name\":{}}}",
            json!(thread.name().unwrap_or("<unnamed>"))
        );
        assert_eq!(line, expected);
    }

    #[test]
    fn test_context_overrides_static_fields() {
        let formatter = JsonFormatter::new().with_static_fields([("app", "billing"), ("env", "prod")]);
        let mut context = LogContext::new();
        context.insert("env", "canary");
        context.insert("request_id", "r-1");

        let data = formatter.render(&record(), &context).unwrap();

        assert_eq!(data["app"], json!("billing"));
        assert_eq!(data["env"], json!("canary"));
        assert_eq!(data["request_id"], json!("r-1"));
        let keys: Vec<&str> = data.keys().map(String::as_str).collect();
        assert_eq!(&keys[7..], ["app", "env", "request_id"]);
    }

    #[test]
    fn test_traceback_overrides_context() {
        let mut context = LogContext::new();
        context.insert("traceback", "from context");
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");

        let data = JsonFormatter::new()
            .render(&record().with_error(&err), &context)
            .unwrap();

        assert_eq!(data["traceback"], json!("gone"));
        assert!(!data.contains_key("stack_info"));
    }

    #[test]
    fn test_stack_info_only_when_requested() {
        let data = JsonFormatter::new()
            .render(&record().with_stack(), &LogContext::new())
            .unwrap();
        assert!(data["stack_info"].is_string());
        assert!(!data.contains_key("traceback"));
    }

    #[test]
    fn test_epoch_millis() {
        let data = JsonFormatter::new()
            .with_time_format(TimeFormat::EpochMillis)
            .render(&record(), &LogContext::new())
            .unwrap();
        assert_eq!(data["datetime"], json!(1_714_564_800_000_i64));
    }

    #[test]
    fn test_interpolation_failure_propagates() {
        let bad = Record::template(Level::Info, "%s %s", vec![json!(1)]);
        let result = JsonFormatter::new().format(&bad, &LogContext::new());
        assert!(matches!(result, Err(LogError::NotEnoughArguments)));
    }
}
