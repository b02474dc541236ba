//! Redis-compatible REST backend (Upstash / Vercel KV style).
//!
//! Every command is a `POST {url}` with a JSON array body such as
//! `["SADD", "niche:tech", "analysis:a:1"]` and a `{"result": ...}` reply.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::StoreError;

#[derive(Deserialize)]
struct CommandReply {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct RestKv {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl std::fmt::Debug for RestKv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestKv")
            .field("url", &self.url)
            .field("token", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl RestKv {
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the HTTP client cannot be built.
    pub fn new(
        url: impl Into<String>,
        token: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            token: token.into(),
        })
    }

    async fn command(&self, args: Value) -> Result<Value, StoreError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&args)
            .send()
            .await?;

        let status = response.status();
        let reply: CommandReply = response.json().await.map_err(|e| {
            StoreError::Rest(format!("undecodable reply (status {status}): {e}"))
        })?;
        if let Some(error) = reply.error {
            return Err(StoreError::Rest(error));
        }
        if !status.is_success() {
            return Err(StoreError::Rest(format!("status {status}")));
        }
        Ok(reply.result)
    }

    pub(crate) async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        match self.command(json!(["GET", key])).await? {
            Value::Null => Ok(None),
            // Values are stored as JSON text.
            Value::String(raw) => Ok(Some(
                serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
            )),
            other => Ok(Some(other)),
        }
    }

    pub(crate) async fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(value)?;
        self.command(json!(["SET", key, encoded])).await?;
        Ok(())
    }

    pub(crate) async fn sadd(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let added = self.command(json!(["SADD", key, member])).await?;
        Ok(added.as_i64().unwrap_or(0) > 0)
    }

    pub(crate) async fn smembers(&self, key: &str) -> Result<Vec<String>, StoreError> {
        match self.command(json!(["SMEMBERS", key])).await? {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => Ok(items.into_iter().filter_map(value_to_string).collect()),
            _ => Err(StoreError::WrongType {
                key: key.to_string(),
                expected: "a set",
            }),
        }
    }

    pub(crate) async fn hincrby(&self, key: &str, field: &str, by: i64) -> Result<i64, StoreError> {
        let reply = self.command(json!(["HINCRBY", key, field, by])).await?;
        reply.as_i64().ok_or_else(|| StoreError::WrongType {
            key: format!("{key}.{field}"),
            expected: "an integer",
        })
    }

    pub(crate) async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        self.command(json!(["HSET", key, field, value])).await?;
        Ok(())
    }

    pub(crate) async fn hgetall(&self, key: &str) -> Result<BTreeMap<String, String>, StoreError> {
        match self.command(json!(["HGETALL", key])).await? {
            Value::Null => Ok(BTreeMap::new()),
            // Redis replies with a flat [field, value, field, value, ...] list.
            Value::Array(items) => Ok(items
                .chunks_exact(2)
                .filter_map(|pair| {
                    Some((value_to_string(pair[0].clone())?, value_to_string(pair[1].clone())?))
                })
                .collect()),
            Value::Object(map) => Ok(map
                .into_iter()
                .filter_map(|(k, v)| Some((k, value_to_string(v)?)))
                .collect()),
            _ => Err(StoreError::WrongType {
                key: key.to_string(),
                expected: "a hash",
            }),
        }
    }
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
