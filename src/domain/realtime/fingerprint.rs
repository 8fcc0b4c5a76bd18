//! Content fingerprints of domain events.
//!
//! Two events that look identical to a subscriber (same kind, chat, IDs and
//! message content) hash to the same value. Timestamps are volatile across
//! repeated sync notifications and are excluded.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use super::domain_event::DomainEvent;

/// Keys dropped at any depth before hashing.
const VOLATILE_KEYS: &[&str] = &["ts", "timestamp"];

/// Computes the hex SHA-256 fingerprint of an event and its hydrated entries.
pub fn fingerprint(event: &DomainEvent, entries: &[Value]) -> String {
    let mut document = json!({
        "type": event.kind.as_str(),
        "chatID": event.chat_id,
        "ids": event.ids,
    });
    if !entries.is_empty() {
        document["entries"] = Value::Array(entries.iter().map(strip_volatile).collect());
    }
    // Entry objects are rebuilt in key order, so the serialized form is canonical.
    let canonical = document.to_string();
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

fn strip_volatile(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> = map
                .iter()
                .filter(|(key, _)| !VOLATILE_KEYS.contains(&key.as_str()))
                .map(|(key, v)| (key, strip_volatile(v)))
                .collect();
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(key, v)| (key.clone(), v))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(strip_volatile).collect()),
        other => other.clone(),
    }
}
