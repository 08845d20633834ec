//! gateway::args
//!
//! Typed access to the named arguments of a tool call.
//!
//! Agents are loose about JSON types, so numbers are accepted as JSON
//! integers or numeric strings, and scalars are accepted where a string is
//! expected. `null` always counts as absent.

use serde_json::{Map, Value};

use super::error::GatewayError;
use crate::forge::RepoRef;

/// Arguments of one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs {
    values: Map<String, Value>,
}

impl ToolArgs {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Accept an object or `null`.
    pub fn from_value(value: Value) -> Result<Self, GatewayError> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            Value::Null => Ok(Self::default()),
            other => Err(GatewayError::invalid_argument(format!(
                "arguments must be a JSON object, got {}",
                type_name(&other)
            ))),
        }
    }

    fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|v| !v.is_null())
    }

    /// Scalar as text, `None` for absent.
    fn text(&self, name: &str) -> Result<Option<String>, GatewayError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(other) => Err(GatewayError::invalid_argument(format!(
                "{} must be a string, got {}",
                name,
                type_name(other)
            ))),
        }
    }

    /// A non-empty string.
    pub fn required_str(&self, name: &str) -> Result<String, GatewayError> {
        self.optional_str(name)?
            .ok_or_else(|| GatewayError::invalid_argument(format!("{} is required", name)))
    }

    /// A string; blank counts as absent.
    pub fn optional_str(&self, name: &str) -> Result<Option<String>, GatewayError> {
        Ok(self.text(name)?.filter(|s| !s.trim().is_empty()))
    }

    /// A string that must be present but may be empty (file content).
    pub fn required_text(&self, name: &str) -> Result<String, GatewayError> {
        self.text(name)?
            .ok_or_else(|| GatewayError::invalid_argument(format!("{} is required", name)))
    }

    /// A positive integer, as a JSON number or numeric string.
    pub fn required_number(&self, name: &str) -> Result<u64, GatewayError> {
        let invalid = || GatewayError::invalid_argument(format!("{} must be a positive integer", name));
        let parsed = match self.get(name) {
            None => return Err(GatewayError::invalid_argument(format!("{} is required", name))),
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) if s.trim().is_empty() => {
                return Err(GatewayError::invalid_argument(format!("{} is required", name)))
            }
            Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
            Some(_) => None,
        };
        parsed.filter(|n| *n > 0).ok_or_else(invalid)
    }

    /// The `limit` argument. Absent, blank, zero or negative selects `default`.
    pub fn limit(&self, default: usize) -> Result<usize, GatewayError> {
        let invalid = |shown: String| {
            GatewayError::invalid_argument(format!("limit must be a number, got {}", shown))
        };
        let requested: i64 = match self.get("limit") {
            None => return Ok(default),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(v) => v,
                None => return Err(invalid(n.to_string())),
            },
            Some(Value::String(s)) if s.trim().is_empty() => return Ok(default),
            Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid(format!("'{}'", s)))?,
            Some(other) => return Err(invalid(type_name(other).to_string())),
        };
        if requested <= 0 {
            Ok(default)
        } else {
            Ok(usize::try_from(requested).unwrap_or(usize::MAX))
        }
    }

    /// An explicit repository argument, parsed.
    pub fn repository(&self, name: &str) -> Result<Option<RepoRef>, GatewayError> {
        match self.optional_str(name)? {
            None => Ok(None),
            Some(raw) => RepoRef::parse(&raw).map(Some).ok_or_else(|| {
                GatewayError::invalid_argument(format!(
                    "{} must be in 'owner/name' form, got '{}'",
                    name, raw
                ))
            }),
        }
    }

    /// Comma separated list; blank entries dropped.
    pub fn list(&self, name: &str) -> Result<Vec<String>, GatewayError> {
        if let Some(Value::Array(items)) = self.get(name) {
            return Ok(items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect());
        }
        Ok(self
            .optional_str(name)?
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
