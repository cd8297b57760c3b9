//! Casters: conversions from a raw string to a typed, validated value.
//!
//! A caster is any `Fn(&str) -> Result<T, CastError>`. Arguments a caster
//! needs (alternatives, bounds, ...) are captured by a closure.

use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use super::CastError;

const TRUTHY: [&str; 4] = ["1", "yes", "true", "on"];
const FALSY: [&str; 4] = ["0", "no", "false", "off"];

/// Returns the raw value unchanged.
pub fn text(value: &str) -> Result<String, CastError> {
    Ok(value.to_owned())
}

/// Parses the value with [`FromStr`].
pub fn parse<T>(value: &str) -> Result<T, CastError>
where
    T: FromStr,
    T::Err: Display,
{
    value.parse().map_err(|e: T::Err| CastError::value(e.to_string()))
}

/// Converts an english word to a boolean, ignoring case.
pub fn boolean(value: &str) -> Result<bool, CastError> {
    let lowered = value.to_lowercase();
    if TRUTHY.contains(&lowered.as_str()) {
        Ok(true)
    } else if FALSY.contains(&lowered.as_str()) {
        Ok(false)
    } else {
        Err(CastError::value(format!(
            "A boolean string must be one of {}, {}",
            TRUTHY.join(", "),
            FALSY.join(", ")
        )))
    }
}

/// Accepts a path to an existing regular file.
pub fn valid_file(value: &str) -> Result<String, CastError> {
    if !Path::new(value).is_file() {
        return Err(CastError::value("The path is not a regular file"));
    }
    Ok(value.to_owned())
}

/// Accepts a path to an existing directory.
pub fn valid_dir(value: &str) -> Result<String, CastError> {
    if !Path::new(value).is_dir() {
        return Err(CastError::value("The path is not a directory"));
    }
    Ok(value.to_owned())
}

/// Accepts a command that resolves to an executable, either as a path or
/// through `PATH`.
pub fn valid_executable(value: &str) -> Result<String, CastError> {
    if !is_executable(value) {
        return Err(CastError::value("The path is not a executable file"));
    }
    Ok(value.to_owned())
}

/// Accepts `value` only if it equals one of `alternatives`.
pub fn one_of<T, A>(value: T, alternatives: &[A]) -> Result<T, CastError>
where
    T: PartialEq<A>,
    A: Display,
{
    if alternatives.iter().any(|alternative| value == *alternative) {
        return Ok(value);
    }
    let listed: Vec<String> = alternatives.iter().map(ToString::to_string).collect();
    Err(CastError::value(format!("Must be one of {}", listed.join(", "))))
}

/// Builds a caster that accepts only the given alternatives.
pub fn choices(alternatives: &[&str]) -> impl Fn(&str) -> Result<String, CastError> {
    let alternatives: Vec<String> = alternatives.iter().map(|a| (*a).to_owned()).collect();
    move |value| one_of(value, &alternatives).map(str::to_owned)
}

/// Whether `command` names an executable file, either as a path or through
/// `PATH` (and `PATHEXT` on Windows).
pub(crate) fn is_executable(command: &str) -> bool {
    !command.is_empty() && which::which(command).is_ok()
}
