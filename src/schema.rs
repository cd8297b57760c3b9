//! JSON-schema validation of incoming events.

use std::borrow::Cow;

use jsonschema::{Draft, JSONSchema, ValidationError};
use log::{debug, error};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("schema is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid JSON schema: {0}")]
    Compile(String),

    #[error("Error in JSON data: {}", join_errors(.0))]
    Invalid(Vec<ValidationError<'static>>),
}

fn join_errors(errors: &[ValidationError<'static>]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validates `event` against the schema given as JSON text.
///
/// Schemas are interpreted as draft 4. On failure the validator's messages
/// errors are logged and returned as they are, instance and schema paths
/// included.
pub fn validate_json(event: &Value, schema: &str) -> Result<(), SchemaError> {
    debug!("Validating message {event}");

    let schema: Value = serde_json::from_str(schema)?;
    let compiled = JSONSchema::options()
        .with_draft(Draft::Draft4)
        .compile(&schema)
        .map_err(|err| SchemaError::Compile(err.to_string()))?;

    if let Err(errors) = compiled.validate(event) {
        let errors: Vec<ValidationError<'static>> = errors
            .map(|e| ValidationError {
                instance: Cow::Owned(e.instance.into_owned()),
                kind: e.kind,
                instance_path: e.instance_path,
                schema_path: e.schema_path,
            })
            .collect();
        error!("Error in JSON data: {}", join_errors(&errors));
        return Err(SchemaError::Invalid(errors));
    }
    Ok(())
}
