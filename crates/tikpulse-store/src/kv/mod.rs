//! Key-value backends with a small Redis-like command set.

mod data;
mod file;
mod rest;

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use serde_json::Value;
use tikpulse_core::StoreBackend;

use crate::error::StoreError;
use data::KvData;

pub use file::FileKv;
pub use rest::RestKv;

const REST_TIMEOUT_SECS: u64 = 10;

/// Process-local keyspace. Lost on restart.
#[derive(Debug, Default)]
pub struct MemoryKv {
    data: Mutex<KvData>,
}

impl MemoryKv {
    fn with<T>(&self, op: impl FnOnce(&mut KvData) -> T) -> T {
        let mut data = self.data.lock().unwrap_or_else(PoisonError::into_inner);
        op(&mut data)
    }
}

#[derive(Debug)]
pub enum KvStore {
    Memory(MemoryKv),
    File(FileKv),
    Rest(RestKv),
}

impl KvStore {
    #[must_use]
    pub fn memory() -> Self {
        KvStore::Memory(MemoryKv::default())
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the REST client cannot be built.
    pub fn from_backend(backend: &StoreBackend) -> Result<Self, StoreError> {
        Ok(match backend {
            StoreBackend::Memory => Self::memory(),
            StoreBackend::File(path) => KvStore::File(FileKv::new(path.clone())),
            StoreBackend::Rest { url, token } => {
                KvStore::Rest(RestKv::new(url.as_str(), token.as_str(), REST_TIMEOUT_SECS)?)
            }
        })
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        match self {
            KvStore::Memory(_) => "memory",
            KvStore::File(_) => "file",
            KvStore::Rest(_) => "rest",
        }
    }

    /// # Errors
    ///
    /// Backend I/O, HTTP or decoding failures.
    pub async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        match self {
            KvStore::Memory(m) => Ok(m.with(|d| d.get(key))),
            KvStore::File(f) => f.read(|d| d.get(key)).await,
            KvStore::Rest(r) => r.get(key).await,
        }
    }

    /// # Errors
    ///
    /// Backend I/O, HTTP or encoding failures.
    pub async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        match self {
            KvStore::Memory(m) => {
                m.with(|d| d.set(key, value));
                Ok(())
            }
            KvStore::File(f) => {
                f.update(|d| {
                    d.set(key, value);
                    Ok(())
                })
                .await
            }
            KvStore::Rest(r) => r.set(key, &value).await,
        }
    }

    /// Add `member` to the set at `key`; `true` if it was new.
    ///
    /// # Errors
    ///
    /// Backend I/O or HTTP failures.
    pub async fn sadd(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        match self {
            KvStore::Memory(m) => Ok(m.with(|d| d.sadd(key, member))),
            KvStore::File(f) => f.update(|d| Ok(d.sadd(key, member))).await,
            KvStore::Rest(r) => r.sadd(key, member).await,
        }
    }

    /// # Errors
    ///
    /// Backend I/O or HTTP failures, or a non-set value over REST.
    pub async fn smembers(&self, key: &str) -> Result<Vec<String>, StoreError> {
        match self {
            KvStore::Memory(m) => Ok(m.with(|d| d.smembers(key))),
            KvStore::File(f) => f.read(|d| d.smembers(key)).await,
            KvStore::Rest(r) => r.smembers(key).await,
        }
    }

    /// Increment an integer hash field, creating it at 0.
    ///
    /// # Errors
    ///
    /// [`StoreError::WrongType`] when the field holds a non-integer.
    pub async fn hincrby(&self, key: &str, field: &str, by: i64) -> Result<i64, StoreError> {
        match self {
            KvStore::Memory(m) => m.with(|d| d.hincrby(key, field, by)),
            KvStore::File(f) => f.update(|d| d.hincrby(key, field, by)).await,
            KvStore::Rest(r) => r.hincrby(key, field, by).await,
        }
    }

    /// # Errors
    ///
    /// Backend I/O or HTTP failures.
    pub async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        match self {
            KvStore::Memory(m) => {
                m.with(|d| d.hset(key, field, value));
                Ok(())
            }
            KvStore::File(f) => {
                f.update(|d| {
                    d.hset(key, field, value);
                    Ok(())
                })
                .await
            }
            KvStore::Rest(r) => r.hset(key, field, value).await,
        }
    }

    /// # Errors
    ///
    /// Backend I/O or HTTP failures, or a non-hash value over REST.
    pub async fn hgetall(&self, key: &str) -> Result<BTreeMap<String, String>, StoreError> {
        match self {
            KvStore::Memory(m) => Ok(m.with(|d| d.hgetall(key))),
            KvStore::File(f) => f.read(|d| d.hgetall(key)).await,
            KvStore::Rest(r) => r.hgetall(key).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn file_backend_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("kv.json");

        let first = KvStore::File(FileKv::new(&path));
        first.set("analysis:a:1", json!({"views": 10})).await.unwrap();
        first.sadd("niche:tech", "analysis:a:1").await.unwrap();
        first.hincrby("stats:global", "total_analyses", 1).await.unwrap();

        let second = KvStore::File(FileKv::new(&path));
        assert_eq!(
            second.get("analysis:a:1").await.unwrap(),
            Some(json!({"views": 10}))
        );
        assert_eq!(
            second.smembers("niche:tech").await.unwrap(),
            vec!["analysis:a:1"]
        );
        assert_eq!(
            second.hincrby("stats:global", "total_analyses", 1).await.unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn file_backend_treats_missing_file_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::File(FileKv::new(dir.path().join("absent.json")));
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.hgetall("h").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_backend_reports_corrupt_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.json");
        std::fs::write(&path, "not json").unwrap();
        let store = KvStore::File(FileKv::new(&path));
        assert!(matches!(store.get("k").await, Err(StoreError::Json(_))));
    }

    #[test]
    fn backend_selection_follows_config() {
        assert_eq!(
            KvStore::from_backend(&StoreBackend::Memory).unwrap().backend_name(),
            "memory"
        );
        assert_eq!(
            KvStore::from_backend(&StoreBackend::File("x.json".into()))
                .unwrap()
                .backend_name(),
            "file"
        );
        let rest = KvStore::from_backend(&StoreBackend::Rest {
            url: "https://kv.example".to_string(),
            token: "tok".to_string(),
        })
        .unwrap();
        assert_eq!(rest.backend_name(), "rest");
        assert!(format!("{rest:?}").contains("[redacted]"));
    }
}
