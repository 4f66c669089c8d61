// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Serializes `value` as compact JSON with object keys sorted at every depth.
pub fn stable_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let raw = serde_json::to_value(value)?;
    let normalized = normalize_json_value(raw);
    serde_json::to_vec(&normalized)
}

pub fn stable_json_string<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let raw = serde_json::to_value(value)?;
    serde_json::to_string(&normalize_json_value(raw))
}

#[must_use]
pub fn stable_hash_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

pub fn stable_json_hash_hex<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let bytes = stable_json_bytes(value)?;
    Ok(stable_hash_hex(&bytes))
}

fn normalize_json_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted = Map::new();
            let mut entries: Vec<(String, Value)> = map
                .into_iter()
                .map(|(k, v)| (k, normalize_json_value(v)))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            for (k, v) in entries {
                sorted.insert(k, v);
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_json_value).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::{stable_json_bytes, stable_json_hash_hex, stable_json_string};
    use serde_json::json;

    #[test]
    fn canonical_json_orders_object_keys() {
        let value = json!({
            "studentId": "s1",
            "eventId": "e1",
            "extra": {"z": 1, "a": 2},
        });

        let bytes = stable_json_bytes(&value).expect("stable json bytes");
        let text = String::from_utf8(bytes).expect("utf8 json");
        assert_eq!(
            text,
            r#"{"eventId":"e1","extra":{"a":2,"z":1},"studentId":"s1"}"#
        );
        assert_eq!(stable_json_string(&value).expect("stable string"), text);
    }

    #[test]
    fn canonical_hash_is_deterministic_for_same_value() {
        let value = json!({"b": 2, "a": 1});
        let h1 = stable_json_hash_hex(&value).expect("hash 1");
        let h2 = stable_json_hash_hex(&json!({"a": 1, "b": 2})).expect("hash 2");
        assert_eq!(h1, h2);
    }
}
