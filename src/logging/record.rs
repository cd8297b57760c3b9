use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::fmt::Write as _;
use std::iter::Peekable;
use std::panic::Location;
use std::path::Path;
use std::str::Chars;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{Level, LogError};

/// Text of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A `%`-style template plus its positional arguments.
    Template { template: String, args: Vec<Value> },
    /// Text that is already final, such as a `log` crate message.
    Formatted(String),
}

impl Message {
    pub fn render(&self) -> Result<Cow<'_, str>, LogError> {
        match self {
            Message::Template { template, args } => interpolate(template, args).map(Cow::Owned),
            Message::Formatted(text) => Ok(Cow::Borrowed(text)),
        }
    }
}

/// One emission event, as seen by the formatter.
#[derive(Debug, Clone)]
pub struct Record {
    timestamp: DateTime<Utc>,
    level: Level,
    message: Message,
    logger: String,
    function: String,
    module: String,
    thread_name: String,
    traceback: Option<String>,
    stack_info: Option<String>,
}

impl Record {
    pub fn new(level: Level, message: Message) -> Self {
        let thread = std::thread::current();
        Self {
            timestamp: Utc::now(),
            level,
            message,
            logger: String::new(),
            function: String::new(),
            module: String::new(),
            thread_name: thread.name().unwrap_or("<unnamed>").to_owned(),
            traceback: None,
            stack_info: None,
        }
    }

    pub fn template(level: Level, template: impl Into<String>, args: Vec<Value>) -> Self {
        Self::new(
            level,
            Message::Template {
                template: template.into(),
                args,
            },
        )
    }

    pub fn formatted(level: Level, text: impl Into<String>) -> Self {
        Self::new(level, Message::Formatted(text.into()))
    }

    #[must_use]
    pub fn with_logger(mut self, name: impl Into<String>) -> Self {
        self.logger = name.into();
        self
    }

    /// Sets the call site.
    #[must_use]
    pub fn at(mut self, module: impl Into<String>, function: impl Into<String>) -> Self {
        self.module = module.into();
        self.function = function.into();
        self
    }

    /// Sets the call site from a source location: the file stem becomes the
    /// module and the line number stands in for the function.
    #[must_use]
    pub fn at_location(self, location: &Location<'_>) -> Self {
        let module = Path::new(location.file())
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| location.file().to_owned());
        self.at(module, format!("<line {}>", location.line()))
    }

    /// Attaches an error and its chain of sources as the traceback.
    #[must_use]
    pub fn with_error(mut self, error: &(dyn std::error::Error + 'static)) -> Self {
        let mut text = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            let _ = write!(text, "\nCaused by: {cause}");
            source = cause.source();
        }
        self.traceback = Some(text);
        self
    }

    /// Captures the current backtrace as stack info.
    #[must_use]
    pub fn with_stack(mut self) -> Self {
        self.stack_info = Some(Backtrace::force_capture().to_string());
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn timestamp(&self) -> &DateTime<Utc> {
        &self.timestamp
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn logger(&self) -> &str {
        &self.logger
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    pub fn traceback(&self) -> Option<&str> {
        self.traceback.as_deref()
    }

    pub fn stack_info(&self) -> Option<&str> {
        self.stack_info.as_deref()
    }
}

/// Substitutes `args` into a printf-style template.
///
/// A conversion is `%[flags][width][.precision]type`, with flags from
/// `-0+ #` and types `s r a c d i u o x X e E f F g G`; `%%` is a literal
/// percent sign. Length modifiers (`h`, `l`, `L`) are accepted and ignored.
/// Every argument must be consumed by exactly one conversion.
pub fn interpolate(template: &str, args: &[Value]) -> Result<String, LogError> {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        let spec = Spec::parse(&mut chars);
        match chars.next() {
            Some('%') => out.push('%'),
            Some(
                conversion @ ('s' | 'r' | 'a' | 'c' | 'd' | 'i' | 'u' | 'o' | 'x' | 'X' | 'e' | 'E'
                | 'f' | 'F' | 'g' | 'G'),
            ) => {
                let arg = args.next().ok_or(LogError::NotEnoughArguments)?;
                convert(&mut out, &spec, conversion, arg)?;
            }
            Some(other) => return Err(LogError::UnsupportedConversion(other)),
            None => return Err(LogError::IncompleteFormat),
        }
    }

    if args.next().is_some() {
        return Err(LogError::TooManyArguments);
    }
    Ok(out)
}

/// Flags, width and precision of one conversion.
#[derive(Debug, Default)]
struct Spec {
    left: bool,
    zero: bool,
    plus: bool,
    space: bool,
    alternate: bool,
    width: usize,
    precision: Option<usize>,
}

impl Spec {
    fn parse(chars: &mut Peekable<Chars<'_>>) -> Self {
        let mut spec = Spec::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => spec.left = true,
                '0' => spec.zero = true,
                '+' => spec.plus = true,
                ' ' => spec.space = true,
                '#' => spec.alternate = true,
                _ => break,
            }
            chars.next();
        }
        spec.width = number(chars);
        if chars.next_if_eq(&'.').is_some() {
            spec.precision = Some(number(chars));
        }
        while chars.next_if(|&c| matches!(c, 'h' | 'l' | 'L')).is_some() {}
        spec
    }

    fn sign(&self, negative: bool) -> &'static str {
        if negative {
            "-"
        } else if self.plus {
            "+"
        } else if self.space {
            " "
        } else {
            ""
        }
    }

    /// Writes `prefix` and `body` padded to the field width. Zero padding
    /// goes between the two and only applies to numbers.
    fn pad(&self, out: &mut String, prefix: &str, body: &str, numeric: bool) {
        let fill = self
            .width
            .saturating_sub(prefix.chars().count() + body.chars().count());
        if self.left {
            out.push_str(prefix);
            out.push_str(body);
            out.extend(std::iter::repeat(' ').take(fill));
        } else if self.zero && numeric {
            out.push_str(prefix);
            out.extend(std::iter::repeat('0').take(fill));
            out.push_str(body);
        } else {
            out.extend(std::iter::repeat(' ').take(fill));
            out.push_str(prefix);
            out.push_str(body);
        }
    }
}

fn number(chars: &mut Peekable<Chars<'_>>) -> usize {
    let mut n = 0usize;
    while let Some(digit) = chars.next_if(char::is_ascii_digit) {
        let digit = digit.to_digit(10).unwrap_or_default() as usize;
        n = n.saturating_mul(10).saturating_add(digit);
    }
    n
}

fn convert(out: &mut String, spec: &Spec, conversion: char, arg: &Value) -> Result<(), LogError> {
    match conversion {
        's' | 'r' | 'a' => {
            let text = match (conversion, arg) {
                ('s', Value::String(s)) => Cow::Borrowed(s.as_str()),
                _ => Cow::Owned(arg.to_string()),
            };
            let text = match spec.precision {
                Some(max) => text.chars().take(max).collect(),
                None => text.into_owned(),
            };
            spec.pad(out, "", &text, false);
        }
        'c' => {
            let ch = match arg {
                Value::Number(n) => n
                    .as_u64()
                    .and_then(|code| u32::try_from(code).ok())
                    .and_then(char::from_u32),
                Value::String(s) if s.chars().count() == 1 => s.chars().next(),
                _ => None,
            }
            .ok_or_else(|| LogError::CharRequired(arg.to_string()))?;
            spec.pad(out, "", ch.encode_utf8(&mut [0; 4]), false);
        }
        'd' | 'i' | 'u' | 'o' | 'x' | 'X' => {
            let n = integer(conversion, arg)?;
            let magnitude = n.unsigned_abs();
            let (base, digits) = match conversion {
                'o' => ("0o", format!("{magnitude:o}")),
                'x' => ("0x", format!("{magnitude:x}")),
                'X' => ("0X", format!("{magnitude:X}")),
                _ => ("", magnitude.to_string()),
            };
            let digits = match spec.precision {
                Some(min) if digits.len() < min => format!("{digits:0>min$}"),
                _ => digits,
            };
            let mut prefix = spec.sign(n < 0).to_owned();
            if spec.alternate {
                prefix.push_str(base);
            }
            spec.pad(out, &prefix, &digits, true);
        }
        _ => {
            let f = float(conversion, arg)?;
            let upper = conversion.is_ascii_uppercase();
            if f.is_nan() {
                spec.pad(out, spec.sign(false), if upper { "NAN" } else { "nan" }, false);
                return Ok(());
            }
            let prefix = spec.sign(f.is_sign_negative());
            let magnitude = f.abs();
            if magnitude.is_infinite() {
                spec.pad(out, prefix, if upper { "INF" } else { "inf" }, false);
                return Ok(());
            }
            let precision = spec.precision.unwrap_or(6);
            let mut body = match conversion.to_ascii_lowercase() {
                'f' => format!("{magnitude:.precision$}"),
                'e' => exponential(magnitude, precision, upper),
                _ => general(magnitude, precision, upper, spec.alternate),
            };
            if spec.alternate && !body.contains('.') && !body.contains(['e', 'E']) {
                body.push('.');
            }
            spec.pad(out, prefix, &body, true);
        }
    }
    Ok(())
}

fn integer(conversion: char, arg: &Value) -> Result<i128, LogError> {
    let not_a_number = || LogError::NotANumber {
        conversion,
        value: arg.to_string(),
    };
    match arg {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i128)
            })
            .ok_or_else(not_a_number),
        Value::Bool(b) => Ok(i128::from(*b)),
        _ => Err(not_a_number()),
    }
}

fn float(conversion: char, arg: &Value) -> Result<f64, LogError> {
    match arg {
        Value::Number(n) => n.as_f64().ok_or_else(|| LogError::NotANumber {
            conversion,
            value: arg.to_string(),
        }),
        Value::Bool(b) => Ok(f64::from(u8::from(*b))),
        _ => Err(LogError::NotANumber {
            conversion,
            value: arg.to_string(),
        }),
    }
}

/// `1.500000e+00` style: at least two exponent digits, always signed.
fn exponential(magnitude: f64, precision: usize, upper: bool) -> String {
    let (mantissa, exponent) = split_exponent(magnitude, precision);
    let e = if upper { 'E' } else { 'e' };
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}{e}{sign}{:02}", exponent.unsigned_abs())
}

/// Fixed or exponential notation, whichever is shorter for the number of
/// significant digits, with trailing zeros removed unless `alternate`.
fn general(magnitude: f64, precision: usize, upper: bool, alternate: bool) -> String {
    let significant = precision.max(1);
    let (_, exponent) = split_exponent(magnitude, significant - 1);
    let fixed = exponent >= -4 && exponent < significant as i32;
    let body = if fixed {
        let decimals = (significant as i32 - 1 - exponent).max(0) as usize;
        format!("{magnitude:.decimals$}")
    } else {
        exponential(magnitude, significant - 1, upper)
    };
    if alternate {
        return body;
    }
    match body.find(['e', 'E']) {
        Some(at) => format!("{}{}", trim_fraction(&body[..at]), &body[at..]),
        None => trim_fraction(&body).to_owned(),
    }
}

fn split_exponent(magnitude: f64, precision: usize) -> (String, i32) {
    let formatted = format!("{magnitude:.precision$e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => (mantissa.to_owned(), exponent.parse().unwrap_or_default()),
        None => (formatted, 0),
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_interpolate_positional() {
        assert_eq!(interpolate("val=%s", &[json!(7)]).unwrap(), "val=7");
        assert_eq!(
            interpolate("%s took %d ms (%y)", &[json!("q"), json!(12.9)]).unwrap_err().to_string(),
            "unsupported format character 'y'"
        );
        assert_eq!(
            interpolate("%s took %d ms, 100%%", &[json!("q"), json!(12.9)]).unwrap(),
            "q took 12 ms, 100%"
        );
    }

    #[test]
    fn test_interpolate_repr_and_float() {
        assert_eq!(interpolate("%r", &[json!("a")]).unwrap(), "\"a\"");
        assert_eq!(interpolate("%f", &[json!(1.5)]).unwrap(), "1.500000");
    }

    #[test]
    fn test_interpolate_width_and_precision() {
        assert_eq!(
            interpolate("took %.2f s, id=%5d", &[json!(1.234), json!(7)]).unwrap(),
            "took 1.23 s, id=    7"
        );
        assert_eq!(interpolate("[%-10s]", &[json!("abc")]).unwrap(), "[abc       ]");
        assert_eq!(interpolate("[%6s]", &[json!("abc")]).unwrap(), "[   abc]");
        assert_eq!(interpolate("%.3s", &[json!("abcdef")]).unwrap(), "abc");
        assert_eq!(interpolate("%5.1f", &[json!(3.14159)]).unwrap(), "  3.1");
        assert_eq!(interpolate("%.3d", &[json!(5)]).unwrap(), "005");
        assert_eq!(interpolate("%ld items", &[json!(3)]).unwrap(), "3 items");
    }

    #[test]
    fn test_interpolate_flags() {
        assert_eq!(interpolate("%05d", &[json!(-42)]).unwrap(), "-0042");
        assert_eq!(interpolate("%+d", &[json!(5)]).unwrap(), "+5");
        assert_eq!(interpolate("% d", &[json!(5)]).unwrap(), " 5");
        assert_eq!(interpolate("%-5d|", &[json!(5)]).unwrap(), "5    |");
        assert_eq!(interpolate("%08.3f", &[json!(-3.14159)]).unwrap(), "-003.142");
        assert_eq!(interpolate("%05s", &[json!("ab")]).unwrap(), "   ab");
    }

    #[test]
    fn test_interpolate_integer_bases() {
        assert_eq!(interpolate("%x", &[json!(255)]).unwrap(), "ff");
        assert_eq!(interpolate("%#X", &[json!(255)]).unwrap(), "0XFF");
        assert_eq!(interpolate("%x", &[json!(-255)]).unwrap(), "-ff");
        assert_eq!(interpolate("%o", &[json!(8)]).unwrap(), "10");
        assert_eq!(interpolate("%#o", &[json!(8)]).unwrap(), "0o10");
        assert_eq!(interpolate("%#06x", &[json!(10)]).unwrap(), "0x000a");
        assert_eq!(interpolate("%u", &[json!(u64::MAX)]).unwrap(), u64::MAX.to_string());
    }

    #[test]
    fn test_interpolate_exponent_and_general() {
        assert_eq!(interpolate("%e", &[json!(12345.678)]).unwrap(), "1.234568e+04");
        assert_eq!(interpolate("%.2E", &[json!(0.000123)]).unwrap(), "1.23E-04");
        assert_eq!(interpolate("%g", &[json!(1.5)]).unwrap(), "1.5");
        assert_eq!(interpolate("%g", &[json!(0.0001)]).unwrap(), "0.0001");
        assert_eq!(interpolate("%g", &[json!(0.00001)]).unwrap(), "1e-05");
        assert_eq!(interpolate("%g", &[json!(100000.0)]).unwrap(), "100000");
        assert_eq!(interpolate("%g", &[json!(1234567.0)]).unwrap(), "1.23457e+06");
        assert_eq!(interpolate("%G", &[json!(0.0)]).unwrap(), "0");
    }

    #[test]
    fn test_interpolate_char() {
        assert_eq!(interpolate("%c%c", &[json!(65), json!("z")]).unwrap(), "Az");
        assert!(matches!(
            interpolate("%c", &[json!("zz")]),
            Err(LogError::CharRequired(_))
        ));
    }

    #[test]
    fn test_interpolate_argument_mismatch() {
        assert!(matches!(
            interpolate("%s and %s", &[json!(1)]),
            Err(LogError::NotEnoughArguments)
        ));
        assert!(matches!(
            interpolate("plain", &[json!(1)]),
            Err(LogError::TooManyArguments)
        ));
        assert!(matches!(interpolate("100%", &[]), Err(LogError::IncompleteFormat)));
        assert_eq!(interpolate("plain", &[]).unwrap(), "plain");
    }

    #[test]
    fn test_interpolate_requires_number() {
        let err = interpolate("%d", &[json!("seven")]).unwrap_err();
        assert_eq!(err.to_string(), "%d format: a number is required, not \"seven\"");
    }

    #[test]
    fn test_formatted_message_is_verbatim() {
        let message = Message::Formatted("100% done".to_owned());
        assert_eq!(message.render().unwrap(), "100% done");
    }

    #[test]
    fn test_error_chain_becomes_traceback() {
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let outer = crate::config::ConfigError::ReadError {
            path: "/etc/app.toml".into(),
            source: inner,
        };
        let record = Record::formatted(Level::Error, "boom").with_error(&outer);
        let traceback = record.traceback().unwrap();
        assert!(traceback.starts_with("failed to read config file '/etc/app.toml'"));
        assert!(traceback.ends_with("Caused by: disk full"));
    }

    #[test]
    fn test_location_call_site() {
        let record = Record::formatted(Level::Info, "x").at_location(Location::caller());
        assert_eq!(record.module(), "record");
        assert!(record.function().starts_with("<line "));
        assert!(record.stack_info().is_none());
    }
}
