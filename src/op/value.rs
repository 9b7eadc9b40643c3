//! Erased value representation shared by traces, replay maps and models.

use crate::error::OpError;
use serde::Serialize;

/// Values crossing the engine boundary are held as JSON values.
pub type Value = serde_json::Value;

/// Serialize a domain element into its erased form.
pub fn to_value<T: Serialize>(value: &T) -> Result<Value, OpError> {
    Ok(serde_json::to_value(value)?)
}

/// Canonical text key for a value.
///
/// Object keys are ordered (serde_json's default map is a `BTreeMap`), so
/// equal values always produce the same key.
pub fn value_key(value: &Value) -> String {
    value.to_string()
}
