//! Field-level validators for incoming recommendation data.
//!
//! Each validator takes the field name so failures can name the offending key.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::error::DataValidationError;

/// Requires the payload to be a JSON object
pub fn object(data: &Value) -> Result<&Map<String, Value>, DataValidationError> {
    data.as_object().ok_or(DataValidationError::NotAnObject)
}

/// Requires an integer that is zero or greater
pub fn non_negative_int(field: &'static str, value: &Value) -> Result<i64, DataValidationError> {
    let n = value.as_i64().ok_or_else(|| DataValidationError::InvalidField {
        field,
        reason: format!("must be an integer, got {}", describe(value)),
    })?;

    if n < 0 {
        return Err(DataValidationError::InvalidField {
            field,
            reason: format!("must not be negative, got {}", n),
        });
    }

    Ok(n)
}

/// Requires a number in the closed range [0, 1]
pub fn weight(field: &'static str, value: &Value) -> Result<f64, DataValidationError> {
    let w = value.as_f64().ok_or_else(|| DataValidationError::InvalidField {
        field,
        reason: format!("must be a number, got {}", describe(value)),
    })?;

    check_weight(field, w)
}

pub fn check_weight(field: &'static str, w: f64) -> Result<f64, DataValidationError> {
    if !(0.0..=1.0).contains(&w) {
        return Err(DataValidationError::InvalidField {
            field,
            reason: format!("must be between 0 and 1, got {}", w),
        });
    }
    Ok(w)
}

/// Resolves an enumeration member from its symbolic name
pub fn enum_name<T: FromStr>(field: &'static str, value: &Value) -> Result<T, DataValidationError> {
    let name = value.as_str().ok_or_else(|| DataValidationError::UnknownVariant {
        field,
        value: value.to_string(),
    })?;

    name.parse().map_err(|_| DataValidationError::UnknownVariant {
        field,
        value: name.to_string(),
    })
}

/// Parses an ISO-8601 timestamp; naive values are taken as UTC
pub fn timestamp(field: &'static str, value: &Value) -> Result<DateTime<Utc>, DataValidationError> {
    let raw = value.as_str().ok_or_else(|| DataValidationError::InvalidField {
        field,
        reason: format!("must be an ISO-8601 string, got {}", describe(value)),
    })?;

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDateTime::from_str(raw)
        .map(|naive| naive.and_utc())
        .map_err(|e| DataValidationError::InvalidField {
            field,
            reason: format!("is not a valid ISO-8601 timestamp: {}", e),
        })
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(n) if n.is_f64() => "a float",
        Value::Number(_) => "an integer",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
