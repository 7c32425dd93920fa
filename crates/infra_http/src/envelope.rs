//! Response envelopes
//!
//! The API answers some endpoints with the bare document and others with a
//! wrapper such as `{"success": true, "data": ...}` or
//! `{"message": "...", "patient": {...}}`. Each call names the wrapper keys it
//! accepts; anything else is read as the bare document.

use serde::de::DeserializeOwned;
use serde_json::Value;

use core_kernel::PortError;

/// Wrapper keys for a list of patients
pub const PATIENTS: &[&str] = &["data", "patients"];
/// Wrapper keys for a single patient
pub const PATIENT: &[&str] = &["data", "patient"];
/// Wrapper keys for follow-up billing requests
pub const REQUESTS: &[&str] = &["data", "requests", "followups"];
/// Wrapper keys for an invoice
pub const INVOICE: &[&str] = &["data", "invoice"];

/// Strips up to two levels of wrapper keys
pub fn unwrap_envelope(value: Value, keys: &[&str]) -> Value {
    let mut value = value;
    for _ in 0..2 {
        let key = match &value {
            Value::Object(map) => keys
                .iter()
                .find(|key| map.get(**key).is_some_and(|inner| !inner.is_null())),
            _ => None,
        };
        match (key, value) {
            (Some(key), Value::Object(mut map)) => {
                value = map.remove(*key).unwrap_or(Value::Null);
            }
            (_, other) => return other,
        }
    }
    value
}

/// Decodes a response body, accepting bare or wrapped documents
pub fn decode<T: DeserializeOwned>(body: &[u8], keys: &[&str]) -> Result<T, PortError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| PortError::transformation(format!("Response is not JSON: {}", e)))?;
    serde_json::from_value(unwrap_envelope(value, keys))
        .map_err(|e| PortError::transformation(format!("Unexpected response shape: {}", e)))
}
