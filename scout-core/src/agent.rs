//! HTTP client for the research agent
//!
//! The agent is an opaque HTTP endpoint that takes a text message and
//! answers with a chunked body of concatenated JSON objects.
//!
//! ## Conversation protocol
//!
//! - First turn: `POST <endpoint>` with `{"message": "..."}`. The response
//!   carries the run identifier in a header (`X-Toolhouse-Run-ID` by default).
//! - Follow-up turns: `PUT <endpoint>/<run id>` with the same body shape.
//!
//! A non-success status, or a body declared empty, is a hard error.

use std::time::Duration;

use bytes::Bytes;
use futures_util::Stream;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;

use crate::config::AgentConfig;
use crate::error::{Error, Result};

/// HTTP client for the research agent
pub struct AgentClient {
    http_client: reqwest::Client,
    endpoint: String,
    run_id_header: HeaderName,
    deadline: Duration,
}

/// An accepted agent response whose body has not been read yet
pub struct AgentResponse {
    /// Run identifier issued for a new conversation
    pub run_id: Option<String>,
    response: reqwest::Response,
}

impl AgentClient {
    /// Create a new agent client from configuration
    ///
    /// Returns an error if the configuration is invalid or missing required fields.
    pub fn new(config: &AgentConfig) -> Result<Self> {
        config.validate()?;

        let endpoint = config
            .endpoint
            .as_deref()
            .ok_or_else(|| Error::Config("agent.endpoint is required".to_string()))?
            .trim_end_matches('/')
            .to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(api_key) = &config.api_key {
            let auth_value = format!("Bearer {}", api_key);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth_value)
                    .map_err(|e| Error::Config(format!("invalid api_key: {}", e)))?,
            );
        }

        let run_id_header = HeaderName::from_bytes(config.run_id_header.trim().as_bytes())
            .map_err(|e| Error::Config(format!("invalid run_id_header: {}", e)))?;

        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint,
            run_id_header,
            deadline: config.deadline(),
        })
    }

    /// Send a message to the agent and wait for the response headers.
    ///
    /// Without `run_id` this opens a new conversation (POST) and captures the
    /// run identifier the agent issues; with one it continues that
    /// conversation (PUT).
    pub async fn open(&self, message: &str, run_id: Option<&str>) -> Result<AgentResponse> {
        let request = match run_id {
            Some(run_id) => self.http_client.put(self.conversation_url(run_id)),
            None => self.http_client.post(&self.endpoint),
        };

        tracing::debug!(
            follow_up = run_id.is_some(),
            message_len = message.len(),
            "Sending message to agent"
        );

        let response = request
            .json(&MessageRequest { message })
            .send()
            .await
            .map_err(|e| Error::from_request(e, self.deadline))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(Error::Status {
                status: status.as_u16(),
                body: error_text,
            });
        }

        if response.content_length() == Some(0) {
            return Err(Error::EmptyBody);
        }

        let captured = if run_id.is_none() {
            response
                .headers()
                .get(&self.run_id_header)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        } else {
            None
        };

        if run_id.is_none() && captured.is_none() {
            tracing::warn!(
                header = %self.run_id_header,
                "Agent did not return a run identifier; follow-ups will start new conversations"
            );
        }

        Ok(AgentResponse {
            run_id: captured,
            response,
        })
    }

    /// URL used for follow-up turns of a conversation
    pub fn conversation_url(&self, run_id: &str) -> String {
        format!("{}/{}", self.endpoint, urlencoding::encode(run_id))
    }

    /// Endpoint new conversations are posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Client-side deadline for a whole search
    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

impl AgentResponse {
    /// Response body as a stream of byte chunks, in arrival order
    pub fn into_chunks(self) -> impl Stream<Item = reqwest::Result<Bytes>> {
        self.response.bytes_stream()
    }
}

/// Request body for both POST and PUT turns
#[derive(Serialize)]
struct MessageRequest<'a> {
    message: &'a str,
}
