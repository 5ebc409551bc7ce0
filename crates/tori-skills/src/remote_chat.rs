//! HTTP adapter for a remote chat backend (`POST {message, context}` → `{reply}`).
//!
//! Deployments disagree on field names (`message`/`prompt`, `context`/`student`/`profile`,
//! `reply`/`answer`), so the wire shape is described by a [`RemoteAdapter`].

use serde_json::{Map, Value};
use std::time::Duration;
use tori_core::{ContextFormat, CoreConfig, RemoteCollaborator, RemoteError, StudentContext};

const COLLABORATOR_NAME: &str = "remote-chat";

/// Request/response field mapping for one backend deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteAdapter {
    pub message_field: String,
    pub context_field: String,
    pub context_format: ContextFormat,
    pub reply_fields: Vec<String>,
}

impl Default for RemoteAdapter {
    fn default() -> Self {
        Self {
            message_field: "message".to_string(),
            context_field: "context".to_string(),
            context_format: ContextFormat::Text,
            reply_fields: vec!["reply".to_string(), "answer".to_string()],
        }
    }
}

impl RemoteAdapter {
    pub fn from_config(config: &CoreConfig) -> Self {
        let reply_fields: Vec<String> = config
            .reply_fields
            .iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();
        Self {
            message_field: config.message_field.clone(),
            context_field: config.context_field.clone(),
            context_format: config.context_format,
            reply_fields: if reply_fields.is_empty() {
                Self::default().reply_fields
            } else {
                reply_fields
            },
        }
    }

    /// JSON body for one request. The context field is omitted when there is no context.
    pub fn request_body(&self, text: &str, context: Option<&StudentContext>) -> Value {
        let mut body = Map::new();
        body.insert(self.message_field.clone(), Value::String(text.to_string()));
        if let Some(ctx) = context.filter(|c| !c.is_empty()) {
            let value = match self.context_format {
                ContextFormat::Text => Value::String(ctx.as_prompt_text()),
                ContextFormat::Object => serde_json::json!({
                    "name": ctx.display_name(),
                    "id": ctx.student_id(),
                }),
            };
            body.insert(self.context_field.clone(), value);
        }
        Value::Object(body)
    }

    /// First non-blank string among the reply fields, returned untouched.
    pub fn extract_reply(&self, body: &Value) -> Option<String> {
        self.reply_fields.iter().find_map(|field| {
            body.get(field)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        })
    }
}

/// Remote chat backend reached over HTTP.
pub struct RemoteChatClient {
    endpoint: String,
    adapter: RemoteAdapter,
    timeout: Duration,
    client: reqwest::Client,
}

impl RemoteChatClient {
    pub fn new(endpoint: impl Into<String>, adapter: RemoteAdapter, timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into(),
            adapter,
            timeout,
            client,
        })
    }

    /// Builds a client from config. `None` when no remote endpoint is configured.
    pub fn from_config(config: &CoreConfig) -> Result<Option<Self>, RemoteError> {
        let Some(endpoint) = config.remote_endpoint() else {
            return Ok(None);
        };
        Self::new(endpoint, RemoteAdapter::from_config(config), config.remote_timeout()).map(Some)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_transport(&self, e: reqwest::Error) -> RemoteError {
        if e.is_timeout() {
            RemoteError::Timeout(self.timeout)
        } else {
            RemoteError::Transport(e.to_string())
        }
    }
}

#[async_trait::async_trait]
impl RemoteCollaborator for RemoteChatClient {
    fn name(&self) -> &str {
        COLLABORATOR_NAME
    }

    async fn ask(&self, text: &str, context: Option<&StudentContext>) -> Result<String, RemoteError> {
        let body = self.adapter.request_body(text, context);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(target: "tori::remote", status = status.as_u16(), "Backend returned error status");
            return Err(RemoteError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(|e| self.map_transport(e))?;
        let value: Value =
            serde_json::from_slice(&bytes).map_err(|e| RemoteError::Malformed(e.to_string()))?;
        self.adapter.extract_reply(&value).ok_or(RemoteError::EmptyReply)
    }
}
