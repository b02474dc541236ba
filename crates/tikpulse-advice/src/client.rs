//! Minimal OpenAI-compatible chat-completions client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AdviceError;

/// Error bodies are truncated to this many characters before being surfaced.
const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Chat client bound to one model and endpoint.
#[derive(Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("api_key", &"[redacted]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    /// # Errors
    ///
    /// Returns [`AdviceError::Http`] if the HTTP client cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, AdviceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `messages` in JSON-object mode and return the first choice's
    /// content, trimmed.
    ///
    /// # Errors
    ///
    /// - [`AdviceError::Http`] on transport failure or an undecodable body.
    /// - [`AdviceError::Api`] on a non-2xx status.
    /// - [`AdviceError::EmptyResponse`] when no choice carries content.
    pub async fn complete_json(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, AdviceError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        tracing::debug!(model = %self.model, messages = messages.len(), "chat completion request");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdviceError::Api {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(AdviceError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ChatClient::new("k", "https://api.example/v1/", "m", 5).unwrap();
        assert_eq!(client.base_url, "https://api.example/v1");
    }

    #[test]
    fn request_serializes_json_object_mode() {
        let messages = [ChatMessage::system("s"), ChatMessage::user("u")];
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            temperature: 0.3,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "u");
    }

    #[test]
    fn debug_redacts_key() {
        let client = ChatClient::new("sk-secret", "https://api.example/v1", "m", 5).unwrap();
        assert!(!format!("{client:?}").contains("sk-secret"));
    }
}
