//! Parsed tool-call arguments.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::validation::json_type_name;
use crate::error::{ColloquyError, Result};

/// Arguments the model supplied for one tool call, parsed into an object.
///
/// A blank arguments string parses to an empty object. Anything that is not
/// valid JSON, or that parses to a non-object, is a
/// [`MalformedToolArguments`](crate::ColloquyError::MalformedToolArguments)
/// error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments(Map<String, Value>);

impl ToolArguments {
    pub(crate) fn parse(tool: &str, raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value =
            serde_json::from_str(raw).map_err(|err| ColloquyError::MalformedToolArguments {
                tool: tool.to_string(),
                reason: err.to_string(),
            })?;
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ColloquyError::MalformedToolArguments {
                tool: tool.to_string(),
                reason: format!("expected a JSON object, got {}", json_type_name(&other)),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn integer(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    pub fn boolean(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Deserialize the whole argument object into a typed struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.0.clone()))?)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}
