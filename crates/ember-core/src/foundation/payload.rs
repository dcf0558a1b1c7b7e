//! Helpers for reading partial JSON payloads.
//!
//! Gateway updates often carry only the fields that changed, so every reader
//! here distinguishes three cases for a key:
//!
//! | Payload          | Meaning                     |
//! |------------------|-----------------------------|
//! | key absent       | leave the field untouched   |
//! | `"key": null`    | overwrite the field with null |
//! | `"key": value`   | overwrite the field         |
//!
//! [`patch`] and [`patch_with`] implement that rule for a single field.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::snowflake::Snowflake;

/// A raw JSON payload as received from the API or gateway.
pub type Payload = Value;

/// Returns the value stored under `key`, including an explicit `null`.
pub fn field<'a>(payload: &'a Value, key: &str) -> Option<&'a Value> {
    payload.as_object().and_then(|map| map.get(key))
}

/// Whether `key` is present in the payload (even if `null`).
pub fn has(payload: &Value, key: &str) -> bool {
    field(payload, key).is_some()
}

/// Reads a snowflake under `key`. `null` and malformed values read as `None`.
pub fn snowflake(payload: &Value, key: &str) -> Option<Snowflake> {
    field(payload, key).and_then(Snowflake::deserialize_value)
}

/// Reads a non-null value under `key` and decodes it.
pub fn get<T: DeserializeOwned>(payload: &Value, key: &str) -> Option<T> {
    match field(payload, key) {
        None | Some(Value::Null) => None,
        Some(v) => T::deserialize(v).ok(),
    }
}

/// Overwrites `slot` with the decoded value under `key` if the key is present.
///
/// Decoding uses the slot's own type, so `Option<T>` slots accept an explicit
/// `null`. A value that fails to decode leaves the slot untouched.
///
/// Returns `true` if the slot was overwritten.
pub fn patch<T: DeserializeOwned>(slot: &mut T, payload: &Value, key: &str) -> bool {
    let Some(raw) = field(payload, key) else {
        return false;
    };
    match T::deserialize(raw) {
        Ok(value) => {
            *slot = value;
            true
        }
        Err(err) => {
            debug!(key = %key, error = %err, "Ignoring undecodable payload field");
            false
        }
    }
}

/// Like [`patch`], but converts the raw value with `convert`.
///
/// `convert` receives the raw value (possibly `Value::Null`); returning `None`
/// leaves the slot untouched.
pub fn patch_with<T, F>(slot: &mut T, payload: &Value, key: &str, convert: F) -> bool
where
    F: FnOnce(&Value) -> Option<T>,
{
    let Some(raw) = field(payload, key) else {
        return false;
    };
    match convert(raw) {
        Some(value) => {
            *slot = value;
            true
        }
        None => false,
    }
}

/// Decodes a JSON array of snowflakes, skipping malformed entries.
pub fn snowflake_list(raw: &Value) -> Option<Vec<Snowflake>> {
    raw.as_array().map(|items| {
        items
            .iter()
            .filter_map(Snowflake::deserialize_value)
            .collect()
    })
}

impl Snowflake {
    /// Decodes a snowflake from a JSON value (string or integer).
    pub fn deserialize_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_u64().map(Self::new),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_null_and_present_are_distinct() {
        let mut name: Option<String> = Some("old".into());

        assert!(!patch(&mut name, &json!({}), "name"));
        assert_eq!(name.as_deref(), Some("old"));

        assert!(patch(&mut name, &json!({ "name": null }), "name"));
        assert_eq!(name, None);

        assert!(patch(&mut name, &json!({ "name": "new" }), "name"));
        assert_eq!(name.as_deref(), Some("new"));
    }

    #[test]
    fn undecodable_values_keep_the_slot() {
        let mut position: i64 = 3;
        assert!(!patch(&mut position, &json!({ "position": "high" }), "position"));
        assert_eq!(position, 3);

        // Non-optional slots reject null.
        assert!(!patch(&mut position, &json!({ "position": null }), "position"));
        assert_eq!(position, 3);
    }

    #[test]
    fn patch_with_converts() {
        let mut tags: Vec<String> = vec!["keep".into()];
        let split = |v: &Value| {
            Some(
                v.as_str()
                    .map(|s| s.split(", ").map(str::to_string).collect())
                    .unwrap_or_default(),
            )
        };

        patch_with(&mut tags, &json!({ "tags": "a, b" }), "tags", split);
        assert_eq!(tags, vec!["a", "b"]);

        patch_with(&mut tags, &json!({ "tags": null }), "tags", split);
        assert!(tags.is_empty());
    }

    #[test]
    fn reads_snowflakes() {
        let data = json!({ "id": "10", "n": 11, "bad": true, "list": ["1", 2, "x"] });
        assert_eq!(snowflake(&data, "id"), Some(Snowflake::new(10)));
        assert_eq!(snowflake(&data, "n"), Some(Snowflake::new(11)));
        assert_eq!(snowflake(&data, "bad"), None);
        assert_eq!(snowflake(&data, "missing"), None);
        assert_eq!(
            snowflake_list(&data["list"]),
            Some(vec![Snowflake::new(1), Snowflake::new(2)])
        );
    }
}
