//! Shared types used across all Tori crates.

use serde::{Deserialize, Serialize};

use crate::knowledge::Topic;

/// Display name used in greetings when the student did not give one.
pub const DEFAULT_GREETING_NAME: &str = "there";

/// Student identity supplied by the session layer. Read-only inside the core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentContext {
    /// Display name captured on the login page.
    #[serde(default, deserialize_with = "scalar_as_text")]
    pub name: Option<String>,
    /// Opaque student identifier. Numeric ids are kept as their decimal text.
    #[serde(default, deserialize_with = "scalar_as_text")]
    pub id: Option<String>,
}

/// Accepts a string, number or bool as text; anything else reads as absent.
fn scalar_as_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

impl StudentContext {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            id: Some(id.into()),
        }
    }

    /// Trimmed display name, if one was given.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Trimmed identifier, if one was given.
    pub fn student_id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Name to address the student by (never empty).
    pub fn greeting_name(&self) -> &str {
        self.display_name().unwrap_or(DEFAULT_GREETING_NAME)
    }

    /// True when neither name nor id carries anything.
    pub fn is_empty(&self) -> bool {
        self.display_name().is_none() && self.student_id().is_none()
    }

    /// Plain-text rendering sent to collaborators that take a context string.
    pub fn as_prompt_text(&self) -> String {
        let mut lines = Vec::new();
        if let Some(name) = self.display_name() {
            lines.push(format!("Name: {}", name));
        }
        if let Some(id) = self.student_id() {
            lines.push(format!("Student ID: {}", id));
        }
        lines.join("\n")
    }
}

/// One user message handed to the resolver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    pub text: String,
    #[serde(default)]
    pub context: Option<StudentContext>,
}

impl ChatRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: StudentContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn greeting_name(&self) -> &str {
        self.context
            .as_ref()
            .map(StudentContext::greeting_name)
            .unwrap_or(DEFAULT_GREETING_NAME)
    }
}

/// How a reply was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionPath {
    /// Remote collaborator answered.
    Remote,
    /// Remote collaborator failed; answered from the knowledge base.
    LocalFallback,
    /// No remote collaborator configured; answered from the knowledge base.
    LocalDirect,
}

impl ResolutionPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::LocalFallback => "local-fallback",
            Self::LocalDirect => "local-direct",
        }
    }
}

/// Reply produced by the resolver. `topic` is `None` when the remote collaborator answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    pub topic: Option<Topic>,
    pub path: ResolutionPath,
}

/// A single rendered exchange. Created per message and dropped after display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    pub input: String,
    pub topic: Option<Topic>,
    pub reply: String,
    pub path: ResolutionPath,
    /// Whether the reply was handed to speech output successfully.
    pub spoken: bool,
}

/// Shape of the context field sent to the remote collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextFormat {
    /// `"Name: Sam\nStudent ID: 123"`
    #[default]
    Text,
    /// `{ "name": "Sam", "id": "123" }`
    Object,
}

fn default_reply_fields() -> Vec<String> {
    vec!["reply".to_string(), "answer".to_string()]
}

/// Global application configuration. Load from TOML or env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Application identity shown in logs.
    pub app_name: String,
    /// HTTP port for the gateway.
    pub port: u16,
    /// Remote chat backend. When set the resolver runs remote-first, otherwise local-only.
    #[serde(default)]
    pub remote_endpoint: Option<String>,
    /// Upper bound on one remote call before falling back.
    pub remote_timeout_secs: u64,
    /// Request field carrying the user text (`message` or `prompt`).
    pub message_field: String,
    /// Request field carrying the student context (`context`, `student` or `profile`).
    pub context_field: String,
    #[serde(default)]
    pub context_format: ContextFormat,
    /// Response fields checked in order for the reply text.
    #[serde(default = "default_reply_fields")]
    pub reply_fields: Vec<String>,
    /// Optional JSON file overriding built-in knowledge entries.
    #[serde(default)]
    pub knowledge_path: Option<String>,
    /// LLM proxy mode ("mock" or "live").
    pub llm_mode: String,
    pub llm_api_url: String,
    pub llm_model: String,
    pub llm_temperature: f32,
}

impl CoreConfig {
    /// Non-blank remote endpoint, if configured.
    pub fn remote_endpoint(&self) -> Option<&str> {
        self.remote_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn remote_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.remote_timeout_secs.max(1))
    }

    /// Load config from file and environment. Precedence: env > `TORI_CONFIG` path (default `config/tori`) > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::var("TORI_CONFIG").unwrap_or_else(|_| "config/tori".to_string());
        let builder = config::Config::builder()
            .set_default("app_name", "Tori Assistant")?
            .set_default("port", 3000_i64)?
            .set_default("remote_timeout_secs", 10_i64)?
            .set_default("message_field", "message")?
            .set_default("context_field", "context")?
            .set_default("llm_mode", "mock")?
            .set_default("llm_api_url", "https://api.openai.com/v1/chat/completions")?
            .set_default("llm_model", "gpt-3.5-turbo")?
            .set_default("llm_temperature", 0.6_f64)?;

        let built = builder
            .add_source(config::File::with_name(&config_path).required(false))
            .add_source(
                config::Environment::with_prefix("TORI")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("reply_fields"),
            )
            .build()?;

        built.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_name_defaults_when_blank() {
        let ctx = StudentContext {
            name: Some("   ".to_string()),
            id: None,
        };
        assert_eq!(ctx.greeting_name(), "there");
        assert!(ctx.is_empty());
        assert_eq!(ChatRequest::new("hi").greeting_name(), "there");
    }

    #[test]
    fn prompt_text_lists_present_fields() {
        let ctx = StudentContext::new(" Sam ", "s123");
        assert_eq!(ctx.as_prompt_text(), "Name: Sam\nStudent ID: s123");
        let only_id = StudentContext {
            name: None,
            id: Some("s9".to_string()),
        };
        assert_eq!(only_id.as_prompt_text(), "Student ID: s9");
    }

    #[test]
    fn numeric_identity_reads_as_text() {
        let ctx: StudentContext = serde_json::from_str(r#"{ "name": "Sam", "id": 12345 }"#).unwrap();
        assert_eq!(ctx.student_id(), Some("12345"));
        assert_eq!(ctx.greeting_name(), "Sam");

        let odd: StudentContext = serde_json::from_str(r#"{ "name": ["x"], "id": null }"#).unwrap();
        assert!(odd.is_empty());
    }

    #[test]
    fn resolution_path_serializes_kebab_case() {
        let json = serde_json::to_value(ResolutionPath::LocalFallback).unwrap();
        assert_eq!(json, "local-fallback");
        assert_eq!(ResolutionPath::LocalDirect.as_str(), "local-direct");
    }

    #[test]
    fn load_uses_defaults_without_file() {
        std::env::set_var("TORI_CONFIG", "/nonexistent/tori-config");
        let cfg = CoreConfig::load().unwrap();
        assert_eq!(cfg.message_field, "message");
        assert_eq!(cfg.reply_fields, vec!["reply", "answer"]);
        assert_eq!(cfg.remote_timeout(), std::time::Duration::from_secs(10));
        assert_eq!(cfg.context_format, ContextFormat::Text);
    }
}
