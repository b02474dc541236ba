//! Redis-like keyspace shared by the in-memory and file backends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;

/// Plain values, sets and hashes live in separate namespaces. Set members
/// keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct KvData {
    #[serde(default)]
    strings: BTreeMap<String, Value>,
    #[serde(default)]
    sets: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    hashes: BTreeMap<String, BTreeMap<String, String>>,
}

impl KvData {
    pub(crate) fn get(&self, key: &str) -> Option<Value> {
        self.strings.get(key).cloned()
    }

    pub(crate) fn set(&mut self, key: &str, value: Value) {
        self.strings.insert(key.to_string(), value);
    }

    /// Returns `true` when `member` was not already present.
    pub(crate) fn sadd(&mut self, key: &str, member: &str) -> bool {
        let members = self.sets.entry(key.to_string()).or_default();
        if members.iter().any(|m| m == member) {
            return false;
        }
        members.push(member.to_string());
        true
    }

    pub(crate) fn smembers(&self, key: &str) -> Vec<String> {
        self.sets.get(key).cloned().unwrap_or_default()
    }

    pub(crate) fn hincrby(&mut self, key: &str, field: &str, by: i64) -> Result<i64, StoreError> {
        let hash = self.hashes.entry(key.to_string()).or_default();
        let current = match hash.get(field) {
            Some(raw) => raw.parse::<i64>().map_err(|_| StoreError::WrongType {
                key: format!("{key}.{field}"),
                expected: "an integer",
            })?,
            None => 0,
        };
        let next = current.saturating_add(by);
        hash.insert(field.to_string(), next.to_string());
        Ok(next)
    }

    pub(crate) fn hset(&mut self, key: &str, field: &str, value: &str) {
        self.hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
    }

    pub(crate) fn hgetall(&self, key: &str) -> BTreeMap<String, String> {
        self.hashes.get(key).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sets_dedupe_and_keep_order() {
        let mut data = KvData::default();
        assert!(data.sadd("s", "b"));
        assert!(data.sadd("s", "a"));
        assert!(!data.sadd("s", "b"));
        assert_eq!(data.smembers("s"), vec!["b", "a"]);
        assert!(data.smembers("missing").is_empty());
    }

    #[test]
    fn hincrby_starts_at_zero_and_rejects_text() {
        let mut data = KvData::default();
        assert_eq!(data.hincrby("h", "n", 5).unwrap(), 5);
        assert_eq!(data.hincrby("h", "n", -2).unwrap(), 3);
        data.hset("h", "label", "x");
        assert!(matches!(
            data.hincrby("h", "label", 1),
            Err(StoreError::WrongType { .. })
        ));
        assert_eq!(data.hgetall("h").get("n").map(String::as_str), Some("3"));
    }

    #[test]
    fn namespaces_do_not_collide() {
        let mut data = KvData::default();
        data.set("k", json!({"a": 1}));
        data.sadd("k", "m");
        data.hset("k", "f", "v");
        assert_eq!(data.get("k"), Some(json!({"a": 1})));
        assert_eq!(data.smembers("k"), vec!["m"]);
        assert_eq!(data.hgetall("k").len(), 1);
    }
}
