//! Lenient field decoders for documents produced by the clinic API
//!
//! The API omits fields, sends explicit nulls, and is not consistent about
//! amount or date encodings. These decoders read such values as "absent"
//! instead of rejecting the whole document. Every decoder first reads the
//! field as a `serde_json::Value`, so a malformed field never fails the
//! document around it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use core_kernel::Money;

fn money_from_value(value: Value) -> Option<Money> {
    match value {
        Value::Number(_) | Value::String(_) => Money::deserialize(value).ok(),
        _ => None,
    }
}

/// Reads a missing, null or unparseable amount as zero
pub(crate) fn money_or_zero<'de, D>(deserializer: D) -> Result<Money, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(money_opt(deserializer)?.unwrap_or_default())
}

/// Reads a number or a numeric string; anything else is absent
pub(crate) fn money_opt<'de, D>(deserializer: D) -> Result<Option<Money>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(money_from_value))
}

/// Reads a missing or null string as empty
pub(crate) fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads a missing or null list as empty
pub(crate) fn vec_or_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads an RFC 3339 string or epoch milliseconds; anything else is absent
pub(crate) fn datetime_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Some(Value::Number(n)) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    })
}

/// Reads a number or a numeric string; anything else is absent
pub(crate) fn u32_opt<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Reads a string, a number, or an embedded document's `_id`/`name`
/// as display text
pub(crate) fn text_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Object(map)) => map
            .get("name")
            .or_else(|| map.get("_id"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "money_or_zero")]
        amount: Money,
        #[serde(default, deserialize_with = "money_opt")]
        remaining: Option<Money>,
        #[serde(default, deserialize_with = "datetime_opt")]
        at: Option<DateTime<Utc>>,
        #[serde(default, deserialize_with = "u32_opt")]
        age: Option<u32>,
        #[serde(default, deserialize_with = "text_opt")]
        by: Option<String>,
    }

    #[test]
    fn test_nulls_and_missing_fields() {
        let sample: Sample = serde_json::from_str(r#"{"amount": null, "at": "not a date"}"#).unwrap();
        assert!(sample.amount.is_zero());
        assert!(sample.at.is_none());
        assert!(sample.age.is_none());
        assert!(sample.by.is_none());
        assert!(sample.remaining.is_none());
    }

    #[test]
    fn test_malformed_amounts_do_not_fail_the_document() {
        let sample: Sample = serde_json::from_str(
            r#"{"amount": "", "remaining": "n/a", "age": 30, "by": "front desk"}"#,
        )
        .unwrap();
        assert!(sample.amount.is_zero());
        assert!(sample.remaining.is_none());
        assert_eq!(sample.age, Some(30));

        let sample: Sample = serde_json::from_str(r#"{"amount": true, "remaining": {"value": 5}}"#).unwrap();
        assert!(sample.amount.is_zero());
        assert!(sample.remaining.is_none());
    }

    #[test]
    fn test_alternate_encodings() {
        let sample: Sample = serde_json::from_str(
            r#"{"amount": "99.5", "remaining": 12.25, "at": 1709283600000, "age": "42", "by": {"_id": "u1", "name": "Asha"}}"#,
        )
        .unwrap();
        assert_eq!(sample.amount.amount(), dec!(99.5));
        assert_eq!(sample.remaining, Some(Money::new(dec!(12.25))));
        assert!(sample.at.is_some());
        assert_eq!(sample.age, Some(42));
        assert_eq!(sample.by.as_deref(), Some("Asha"));
    }
}
