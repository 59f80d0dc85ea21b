//! Client for the local chat completions endpoint.
//!
//! Every call resolves to a [`Completion`]: either the model's text or the reason
//! the call failed. Nothing here returns an error to the caller.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::config::LlmConfig;

/// User-Agent string sent with every completion request
const USER_AGENT: &str = concat!("listing-scribe/", env!("CARGO_PKG_VERSION"));

/// Why a completion call did not produce usable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionFailure {
    /// The request never got a response (connection refused, timeout, ...).
    Transport(String),
    /// The endpoint answered with a non-success status.
    Status { code: u16, body: String },
    /// A success status whose body lacks `choices[0].message.content`.
    Malformed(String),
}

impl fmt::Display for CompletionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionFailure::Transport(msg) => write!(f, "request failed: {}", msg),
            CompletionFailure::Status { code, body } => write!(f, "{} - {}", code, body),
            CompletionFailure::Malformed(msg) => write!(f, "unexpected response body: {}", msg),
        }
    }
}

/// Outcome of a single completion call. Consumed immediately, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Text(String),
    Failed(CompletionFailure),
}

/// Anything that can turn a prompt into a [`Completion`].
#[async_trait]
pub trait CompletionSource: Send + Sync {
    async fn complete(&self, prompt: &str) -> Completion;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: String,
}

/// OpenAI-compatible chat completions client (Ollama's `/v1/chat/completions`).
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    url: String,
    model: String,
}

impl ChatClient {
    /// Build a client for the given endpoint and model.
    ///
    /// With `timeout` unset a hung endpoint blocks the caller indefinitely.
    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            url: url.into(),
            model: model.into(),
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.url.clone(), config.model.clone(), config.timeout())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn request(&self, prompt: &str) -> Result<String, CompletionFailure> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionFailure::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CompletionFailure::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(CompletionFailure::Status {
                code: status.as_u16(),
                body: text,
            });
        }

        parse_content(&text)
    }
}

#[async_trait]
impl CompletionSource for ChatClient {
    async fn complete(&self, prompt: &str) -> Completion {
        match self.request(prompt).await {
            Ok(content) => {
                tracing::debug!(content = %content, "completion received");
                Completion::Text(content)
            }
            Err(failure) => {
                tracing::warn!(url = %self.url, "completion failed: {}", failure);
                Completion::Failed(failure)
            }
        }
    }
}

/// Pull `choices[0].message.content` out of a success body
fn parse_content(body: &str) -> Result<String, CompletionFailure> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| CompletionFailure::Malformed(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| CompletionFailure::Malformed("no choices in response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_content_takes_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Rating: 4.2"}},{"message":{"content":"ignored"}}]}"#;
        assert_eq!(parse_content(body).unwrap(), "Rating: 4.2");
    }

    #[test]
    fn parse_content_rejects_missing_fields() {
        // Shape of a non-chat JSON body the endpoint could still answer 200 with
        let body = r#"{"rating": 4.5, "review": "Great property, highly recommend it!"}"#;
        assert!(matches!(
            parse_content(body),
            Err(CompletionFailure::Malformed(_))
        ));

        assert!(matches!(
            parse_content(r#"{"choices":[]}"#),
            Err(CompletionFailure::Malformed(_))
        ));
        assert!(matches!(
            parse_content("not json"),
            Err(CompletionFailure::Malformed(_))
        ));
    }

    #[test]
    fn request_body_matches_chat_contract() {
        let body = ChatRequest {
            model: "tinyllama:latest",
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "model": "tinyllama:latest",
                "messages": [{"role": "user", "content": "hello"}]
            })
        );
    }

    #[test]
    fn client_takes_timeout_from_config() {
        let config: crate::config::LlmConfig = toml::from_str(
            r#"
            url = "http://127.0.0.1:11434/v1/chat/completions"
            model = "llama3:8b"
            timeout_secs = 5
            "#,
        )
        .unwrap();

        let client = ChatClient::from_config(&config).unwrap();
        assert_eq!(client.model(), "llama3:8b");
        assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
    }
}
