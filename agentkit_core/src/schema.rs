//! Input schemas for actions.
//!
//! An [`ActionSchema`] pairs the JSON Schema document handed to the agent
//! runtime with a structural validator for the action's single input value.

use std::fmt;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Input rejected by an [`ActionSchema`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SchemaError {
    message: String,
}

impl SchemaError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

type Validator = dyn Fn(&Value) -> Result<Value, SchemaError> + Send + Sync;

/// Schema of an action's input argument.
///
/// Validation parses the input into the typed shape and re-serializes it, so
/// unknown fields are stripped and the returned value is normalized.
#[derive(Clone)]
pub struct ActionSchema {
    document: Arc<Value>,
    validator: Arc<Validator>,
}

impl ActionSchema {
    /// Schema derived from a typed input struct.
    pub fn of<T>() -> Self
    where
        T: JsonSchema + DeserializeOwned + Serialize + 'static,
    {
        let document = schemars::schema_for!(T).to_value();
        Self {
            document: Arc::new(document),
            validator: Arc::new(|input: &Value| {
                let parsed: T = serde_json::from_value(input.clone())?;
                Ok(serde_json::to_value(parsed)?)
            }),
        }
    }

    /// Schema for actions that take no arguments; accepts any object and drops its fields.
    pub fn empty() -> Self {
        Self {
            document: Arc::new(json!({
                "type": "object",
                "properties": {},
            })),
            validator: Arc::new(|input: &Value| match input {
                Value::Object(_) => Ok(json!({})),
                other => Err(SchemaError::new(format!(
                    "expected an object, found {}",
                    value_kind(other)
                ))),
            }),
        }
    }

    /// Schema with a hand-written document and validator.
    pub fn custom<F>(document: Value, validator: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, SchemaError> + Send + Sync + 'static,
    {
        Self {
            document: Arc::new(document),
            validator: Arc::new(validator),
        }
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn validate(&self, input: &Value) -> Result<Value, SchemaError> {
        (self.validator)(input)
    }
}

impl PartialEq for ActionSchema {
    fn eq(&self, other: &Self) -> bool {
        self.document == other.document
    }
}

impl fmt::Debug for ActionSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSchema")
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

/// Input for actions that take no arguments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct EmptyInput {}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
