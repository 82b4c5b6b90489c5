//! Return-type coercion for `get`

use crate::document::kind_of;
use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;

/// Semantic type a caller wants back from `get`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnType {
    Integer,
    Float,
    Boolean,
    String,
    List,
    Map,
}

impl ReturnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnType::Integer => "integer",
            ReturnType::Float => "float",
            ReturnType::Boolean => "boolean",
            ReturnType::String => "string",
            ReturnType::List => "list",
            ReturnType::Map => "map",
        }
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReturnType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "int" | "integer" => Ok(ReturnType::Integer),
            "float" | "number" => Ok(ReturnType::Float),
            "bool" | "boolean" => Ok(ReturnType::Boolean),
            "str" | "string" => Ok(ReturnType::String),
            "list" | "array" => Ok(ReturnType::List),
            "map" | "dict" | "object" => Ok(ReturnType::Map),
            other => Err(StoreError::invalid_argument(format!(
                "unknown return type '{}' (expected integer, float, boolean, string, list or map)",
                other
            ))),
        }
    }
}

/// Convert `value` to `target`, or explain why not
pub fn coerce(value: &Value, target: ReturnType) -> StoreResult<Value> {
    let fail = |message: &str| StoreError::type_coercion(value.to_string(), target.as_str(), message);

    match target {
        ReturnType::Integer => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
            Value::Number(n) => {
                let f = n.as_f64().unwrap_or(f64::NAN);
                if f.fract() == 0.0 && f.is_finite() && f.abs() < i64::MAX as f64 {
                    Ok(Value::Number((f as i64).into()))
                } else {
                    Err(fail("number has a fractional part"))
                }
            }
            Value::Bool(b) => Ok(Value::Number(i64::from(*b).into())),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(|n| Value::Number(n.into()))
                .map_err(|e| fail(&e.to_string())),
            other => Err(fail(&format!("cannot convert a {}", kind_of(other)))),
        },
        ReturnType::Float => {
            let f = match value {
                Value::Number(n) => n.as_f64(),
                Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            f.and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| fail(&format!("not a finite number ({})", kind_of(value))))
        }
        ReturnType::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::Number(n) if n.as_f64() == Some(0.0) => Ok(Value::Bool(false)),
            Value::Number(n) if n.as_f64() == Some(1.0) => Ok(Value::Bool(true)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Value::Bool(true)),
                "false" | "0" | "no" => Ok(Value::Bool(false)),
                _ => Err(fail("expected true/false, yes/no or 1/0")),
            },
            other => Err(fail(&format!("cannot convert a {}", kind_of(other)))),
        },
        ReturnType::String => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Array(_) | Value::Object(_) => {
                Err(fail(&format!("cannot convert a {}", kind_of(value))))
            }
            scalar => Ok(Value::String(scalar.to_string())),
        },
        ReturnType::List => match value {
            Value::Array(_) => Ok(value.clone()),
            Value::String(s) if s.trim_start().starts_with('[') => {
                match serde_json::from_str::<Value>(s) {
                    Ok(parsed @ Value::Array(_)) => Ok(parsed),
                    _ => Err(fail("string does not hold a JSON list")),
                }
            }
            Value::Object(_) => Err(fail("cannot convert an object")),
            scalar => Ok(Value::Array(vec![scalar.clone()])),
        },
        ReturnType::Map => match value {
            Value::Object(_) => Ok(value.clone()),
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(parsed @ Value::Object(_)) => Ok(parsed),
                _ => Err(fail("string does not hold a JSON object")),
            },
            other => Err(fail(&format!("cannot convert a {}", kind_of(other)))),
        },
    }
}
