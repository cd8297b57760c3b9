//! Bulk validation of a list of variable descriptions.
//!
//! Kept for services that still describe their configuration as a list of
//! records; new code should use [`ConfigSpec`](super::ConfigSpec).

use std::path::Path;

use log::{debug, error};
use serde::Deserialize;
use serde_json::Value;

use super::cast::{boolean, is_executable};
use super::env::{EnvironmentReader, ProcessEnv};
use super::ConfigError;

/// Target type of a legacy variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarType {
    #[default]
    Str,
    Int,
    Bool,
}

/// One entry of a legacy variable list.
///
/// Deserializable, so lists can be kept in JSON or TOML:
///
/// ```toml
/// [[variables]]
/// name = "WORKERS"
/// type = "int"
/// default = 4
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VariableSpec {
    pub name: Option<String>,
    pub required: bool,
    pub is_file: bool,
    pub is_exe: bool,
    #[serde(rename = "type")]
    pub var_type: VarType,
    pub default: Option<Value>,
    /// Cast the default itself instead of reading the environment.
    pub dynaconf: bool,
}

impl Default for VariableSpec {
    fn default() -> Self {
        Self {
            name: None,
            required: true,
            is_file: false,
            is_exe: false,
            var_type: VarType::Str,
            default: None,
            dynaconf: false,
        }
    }
}

impl VariableSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Validates `variables` against the process environment.
///
/// Returns the resolved values in order, or the first failure.
#[deprecated(note = "use `config` or `ConfigSpec` instead")]
#[allow(deprecated)]
pub fn config_validator(variables: &[VariableSpec]) -> Result<Vec<Value>, ConfigError> {
    config_validator_with(&ProcessEnv, variables)
}

/// Validates `variables` against any environment reader.
///
/// Every failure is logged at error level before it is returned.
#[deprecated(note = "use `ConfigSpec::load` instead")]
pub fn config_validator_with<E>(env: &E, variables: &[VariableSpec]) -> Result<Vec<Value>, ConfigError>
where
    E: EnvironmentReader + ?Sized,
{
    let mut values = Vec::with_capacity(variables.len());

    for spec in variables {
        let Some(name) = spec.name.as_deref() else {
            error!("Key 'name' must be defined in variables parameter");
            return Err(ConfigError::MissingName);
        };

        let has_default = spec.default.as_ref().is_some_and(|d| !d.is_null());
        let required = spec.required && !has_default;

        let value = resolve(env, name, spec).inspect_err(|_| {
            error!(
                "Configuration invalid: The following environment variable value isn't valid: {name}"
            );
        })?;

        if is_missing(&value) {
            if required {
                error!("Configuration invalid: The following environment variable is required: {name}");
                return Err(ConfigError::Required(name.to_owned()));
            }
        } else if spec.is_file {
            check_path(name, &value, |path| Path::new(path).is_file())?;
        } else if spec.is_exe {
            check_path(name, &value, is_executable)?;
        }

        values.push(value);
    }

    Ok(values)
}

fn resolve<E>(env: &E, name: &str, spec: &VariableSpec) -> Result<Value, ConfigError>
where
    E: EnvironmentReader + ?Sized,
{
    let raw = if spec.dynaconf {
        spec.default.clone()
    } else {
        env.try_get(name)?
            .map(Value::String)
            .or_else(|| spec.default.clone())
    };

    let value = match (spec.var_type, raw) {
        (_, None) | (_, Some(Value::Null)) => Value::Null,
        (VarType::Str, Some(raw)) => raw,
        (VarType::Int, Some(raw)) => Value::from(cast_int(name, &raw)?),
        (VarType::Bool, Some(raw)) => Value::Bool(cast_bool(name, &raw)?),
    };

    debug!("{name}={value}");
    Ok(value)
}

fn cast_int(name: &str, raw: &Value) -> Result<i64, ConfigError> {
    let invalid = |detail: String| ConfigError::Invalid {
        key: name.to_owned(),
        detail,
    };
    match raw {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| invalid(format!("{n} is not an integer"))),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::String(s) => s.trim().parse().map_err(|e| invalid(format!("{e}"))),
        other => Err(invalid(format!("{other} is not an integer"))),
    }
}

fn cast_bool(name: &str, raw: &Value) -> Result<bool, ConfigError> {
    match raw {
        Value::Bool(b) => Ok(*b),
        other => boolean(&value_text(other)).map_err(|e| ConfigError::Invalid {
            key: name.to_owned(),
            detail: e.to_string(),
        }),
    }
}

fn check_path(name: &str, value: &Value, exists: impl Fn(&str) -> bool) -> Result<(), ConfigError> {
    if exists(&value_text(value)) {
        return Ok(());
    }
    error!(
        "Configuration invalid: The following environment variable value isn't a valid file or the file itself doesn't exists: {name}"
    );
    Err(ConfigError::Invalid {
        key: name.to_owned(),
        detail: "not a valid file or the file itself doesn't exist".to_owned(),
    })
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
#[allow(deprecated)]
mod tests {
    use super::*;
    use crate::config::MapEnv;
    use serde_json::json;
    use tempfile::NamedTempFile;

    #[test]
    fn test_resolves_values_in_order() {
        let env = MapEnv::new()
            .with("HOST", "db.local")
            .with("WORKERS", "8")
            .with("VERBOSE", "yes");
        let variables = [
            VariableSpec::new("HOST"),
            VariableSpec {
                var_type: VarType::Int,
                ..VariableSpec::new("WORKERS")
            },
            VariableSpec {
                var_type: VarType::Bool,
                ..VariableSpec::new("VERBOSE")
            },
        ];

        let values = config_validator_with(&env, &variables).unwrap();
        assert_eq!(values, vec![json!("db.local"), json!(8), json!(true)]);
    }

    #[test]
    fn test_missing_name() {
        let env = MapEnv::new();
        let err = config_validator_with(&env, &[VariableSpec::default()]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingName));
    }

    #[test]
    fn test_required_missing_fails() {
        let env = MapEnv::new();
        let err = config_validator_with(&env, &[VariableSpec::new("HOST")]).unwrap_err();
        assert!(matches!(err, ConfigError::Required(ref key) if key == "HOST"));
    }

    #[test]
    fn test_default_makes_optional() {
        let env = MapEnv::new();
        let variables = [VariableSpec {
            var_type: VarType::Int,
            default: Some(json!("4")),
            ..VariableSpec::new("WORKERS")
        }];
        assert_eq!(config_validator_with(&env, &variables).unwrap(), vec![json!(4)]);
    }

    #[test]
    fn test_optional_missing_is_null() {
        let env = MapEnv::new();
        let variables = [VariableSpec {
            required: false,
            ..VariableSpec::new("HOST")
        }];
        assert_eq!(config_validator_with(&env, &variables).unwrap(), vec![Value::Null]);
    }

    #[test]
    fn test_falsy_present_value_satisfies_required() {
        let env = MapEnv::new().with("RETRIES", "0").with("ENABLED", "off");
        let variables = [
            VariableSpec {
                var_type: VarType::Int,
                ..VariableSpec::new("RETRIES")
            },
            VariableSpec {
                var_type: VarType::Bool,
                ..VariableSpec::new("ENABLED")
            },
        ];
        assert_eq!(
            config_validator_with(&env, &variables).unwrap(),
            vec![json!(0), json!(false)]
        );
    }

    #[test]
    fn test_falsy_json_defaults_are_values() {
        let env = MapEnv::new();
        let variables = [
            VariableSpec {
                var_type: VarType::Int,
                default: Some(json!(0)),
                ..VariableSpec::new("RETRIES")
            },
            VariableSpec {
                var_type: VarType::Bool,
                default: Some(json!(false)),
                ..VariableSpec::new("ENABLED")
            },
            VariableSpec {
                default: Some(json!(0)),
                dynaconf: true,
                ..VariableSpec::new("OFFSET")
            },
        ];
        assert!(variables.iter().all(|spec| spec.required));
        assert_eq!(
            config_validator_with(&env, &variables).unwrap(),
            vec![json!(0), json!(false), json!(0)]
        );
    }

    #[test]
    fn test_null_default_keeps_variable_required() {
        let env = MapEnv::new();
        let variables = [VariableSpec {
            default: Some(Value::Null),
            ..VariableSpec::new("HOST")
        }];
        assert!(matches!(
            config_validator_with(&env, &variables),
            Err(ConfigError::Required(ref key)) if key == "HOST"
        ));
    }

    #[test]
    fn test_empty_string_counts_as_missing() {
        let env = MapEnv::new().with("HOST", "");
        let err = config_validator_with(&env, &[VariableSpec::new("HOST")]).unwrap_err();
        assert!(matches!(err, ConfigError::Required(_)));
    }

    #[test]
    fn test_invalid_bool_fails_fast() {
        let env = MapEnv::new().with("ENABLED", "maybe");
        let variables = [
            VariableSpec {
                var_type: VarType::Bool,
                ..VariableSpec::new("ENABLED")
            },
            VariableSpec::new("NEVER_CHECKED"),
        ];
        let err = config_validator_with(&env, &variables).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "ENABLED"));
    }

    #[test]
    fn test_invalid_int_fails() {
        let env = MapEnv::new().with("WORKERS", "many");
        let variables = [VariableSpec {
            var_type: VarType::Int,
            ..VariableSpec::new("WORKERS")
        }];
        assert!(matches!(
            config_validator_with(&env, &variables),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_dynaconf_casts_default_not_env() {
        let env = MapEnv::new().with("WORKERS", "8");
        let variables = [VariableSpec {
            var_type: VarType::Int,
            default: Some(json!("2")),
            dynaconf: true,
            ..VariableSpec::new("WORKERS")
        }];
        assert_eq!(config_validator_with(&env, &variables).unwrap(), vec![json!(2)]);
    }

    #[test]
    fn test_is_file_check() {
        let file = NamedTempFile::new().unwrap();
        let env = MapEnv::new()
            .with("GOOD", file.path().to_str().unwrap())
            .with("BAD", "/nonexistent/file");
        let good = [VariableSpec {
            is_file: true,
            ..VariableSpec::new("GOOD")
        }];
        let bad = [VariableSpec {
            is_file: true,
            ..VariableSpec::new("BAD")
        }];

        assert!(config_validator_with(&env, &good).is_ok());
        assert!(matches!(
            config_validator_with(&env, &bad),
            Err(ConfigError::Invalid { ref key, .. }) if key == "BAD"
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_is_exe_check() {
        let env = MapEnv::new().with("SHELL_BIN", "sh").with("TOOL", "no-such-tool-4242");
        let good = [VariableSpec {
            is_exe: true,
            ..VariableSpec::new("SHELL_BIN")
        }];
        let bad = [VariableSpec {
            is_exe: true,
            ..VariableSpec::new("TOOL")
        }];

        assert_eq!(config_validator_with(&env, &good).unwrap(), vec![json!("sh")]);
        assert!(matches!(
            config_validator_with(&env, &bad),
            Err(ConfigError::Invalid { ref key, .. }) if key == "TOOL"
        ));
    }

    #[test]
    fn test_specs_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Specs {
            variables: Vec<VariableSpec>,
        }

        let specs: Specs = toml::from_str(
            r#"
            [[variables]]
            name = "WORKERS"
            type = "int"
            default = 4

            [[variables]]
            name = "HOST"
            required = false
            "#,
        )
        .unwrap();

        assert_eq!(specs.variables[0].var_type, VarType::Int);
        assert_eq!(specs.variables[0].default, Some(json!(4)));
        assert!(specs.variables[0].required);
        assert!(!specs.variables[1].required);

        let values = config_validator_with(&MapEnv::new(), &specs.variables).unwrap();
        assert_eq!(values, vec![json!(4), Value::Null]);
    }
}
