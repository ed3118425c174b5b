//! Anthropic Messages API backend for note generation.
//!
//! Streams `content_block_delta` text out of the Messages API as plain
//! fragments. Record extraction reuses [`RecordBuffer`], the same
//! blank-line-delimited reader the consumer-side decoder is built on.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::{RelnotesError, Result};
use crate::generate::llm::{FragmentStream, NoteGenerator};
use crate::stream::codec::RecordBuffer;

/// Anthropic API endpoint.
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version header.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Configuration for the Anthropic backend.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key for the `x-api-key` header.
    pub api_key: String,
    /// Model to use.
    pub model: String,
    /// Maximum tokens per note.
    pub max_tokens: u32,
    /// Temperature for sampling (0.0-1.0).
    pub temperature: Option<f32>,
    /// Endpoint override, for tests and proxies.
    pub base_url: String,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "claude-3-5-haiku-latest".to_string(),
            max_tokens: 512,
            temperature: Some(0.3),
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }
}

/// Streaming event subset we care about; everything else is ignored.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum SseEvent {
    #[serde(rename = "content_block_delta")]
    ContentBlockDelta { delta: DeltaData },

    #[serde(rename = "message_stop")]
    MessageStop,

    #[serde(rename = "error")]
    Error { error: ApiErrorBody },

    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum DeltaData {
    #[serde(rename = "text_delta")]
    TextDelta { text: String },

    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiErrorBody,
}

/// What one parsed record means for the fragment stream.
#[derive(Debug)]
enum ProviderEvent {
    Text(String),
    Stop,
}

/// Note generation backed by the Anthropic Messages API.
pub struct AnthropicGenerator {
    client: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicGenerator {
    pub fn new(config: AnthropicConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Variant with a custom HTTP client, for tests.
    pub fn with_client(client: reqwest::Client, config: AnthropicConfig) -> Self {
        Self { client, config }
    }

    fn build_request_body(&self, system: &str, user: &str) -> Value {
        let mut body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "system": system,
            "messages": [{"role": "user", "content": user}],
            "stream": true
        });
        if let Some(temp) = self.config.temperature {
            body["temperature"] = json!(temp);
        }
        body
    }

    /// Drains the SSE response into text fragments on `tx`.
    async fn process_stream(
        mut stream: impl Stream<Item = std::result::Result<bytes::Bytes, reqwest::Error>> + Unpin,
        tx: mpsc::Sender<Result<String>>,
    ) -> Result<()> {
        let mut records = RecordBuffer::new();

        while let Some(chunk) = stream.next().await {
            records.push(&chunk?);
            while let Some(record) = records.next_record() {
                match Self::parse_record(&record)? {
                    Some(ProviderEvent::Text(text)) => {
                        if tx.send(Ok(text)).await.is_err() {
                            // Receiver dropped, stop processing.
                            return Ok(());
                        }
                    }
                    Some(ProviderEvent::Stop) => return Ok(()),
                    None => {}
                }
            }
        }

        Ok(())
    }

    /// Parse one SSE record; `Ok(None)` means "nothing for the consumer".
    fn parse_record(record: &str) -> Result<Option<ProviderEvent>> {
        let mut data = String::new();
        for line in record.lines() {
            if let Some(value) = line.strip_prefix("data:") {
                data.push_str(value.trim());
            }
        }
        if data.is_empty() {
            return Ok(None);
        }

        let parsed: SseEvent = serde_json::from_str(&data).map_err(|e| {
            RelnotesError::Generation(format!("Failed to parse provider event: {e}"))
        })?;

        match parsed {
            SseEvent::ContentBlockDelta {
                delta: DeltaData::TextDelta { text },
            } => Ok(Some(ProviderEvent::Text(text))),
            SseEvent::ContentBlockDelta { .. } => Ok(None),
            SseEvent::MessageStop => Ok(Some(ProviderEvent::Stop)),
            SseEvent::Error { error } => Err(RelnotesError::Generation(error.message)),
            SseEvent::Other => Ok(None),
        }
    }
}

#[async_trait]
impl NoteGenerator for AnthropicGenerator {
    async fn stream_note(&self, system: &str, user: &str) -> Result<FragmentStream> {
        let body = self.build_request_body(system, user);

        let response = self
            .client
            .post(&self.config.base_url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorResponse>(&error_text) {
                Ok(parsed) => parsed.error.message,
                Err(_) => error_text,
            };
            return Err(RelnotesError::Generation(format!(
                "Provider returned {status}: {message}"
            )));
        }

        let (tx, rx) = mpsc::channel(100);
        let stream = response.bytes_stream();
        tokio::spawn(async move {
            if let Err(e) = Self::process_stream(stream, tx.clone()).await {
                let _ = tx.send(Err(e)).await;
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    fn description(&self) -> String {
        format!("Anthropic ({})", self.config.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = AnthropicConfig::new("key");
        assert_eq!(config.model, "claude-3-5-haiku-latest");
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.base_url, ANTHROPIC_API_URL);
    }

    #[test]
    fn request_body_enables_streaming() {
        let generator = AnthropicGenerator::new(AnthropicConfig::new("key"));
        let body = generator.build_request_body("sys", "user");
        assert_eq!(body["stream"], true);
        assert_eq!(body["system"], "sys");
        assert_eq!(body["messages"][0]["content"], "user");
    }

    #[test]
    fn parse_text_delta() {
        let record = "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hello\"}}";
        match AnthropicGenerator::parse_record(record).unwrap() {
            Some(ProviderEvent::Text(text)) => assert_eq!(text, "Hello"),
            _ => panic!("expected text event"),
        }
    }

    #[test]
    fn parse_message_stop() {
        let record = "event: message_stop\ndata: {\"type\":\"message_stop\"}";
        assert!(matches!(
            AnthropicGenerator::parse_record(record).unwrap(),
            Some(ProviderEvent::Stop)
        ));
    }

    #[test]
    fn parse_ping_yields_nothing() {
        let record = "event: ping\ndata: {\"type\":\"ping\"}";
        assert!(AnthropicGenerator::parse_record(record).unwrap().is_none());
    }

    #[test]
    fn parse_error_event_is_fatal() {
        let record = "data: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"try later\"}}";
        let err = AnthropicGenerator::parse_record(record).unwrap_err();
        assert!(err.to_string().contains("try later"));
    }

    #[test]
    fn comment_records_yield_nothing() {
        assert!(AnthropicGenerator::parse_record(": keep-alive")
            .unwrap()
            .is_none());
    }
}
