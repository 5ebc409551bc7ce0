//! Model Router: answers a student prompt with an LLM (mock or live OpenAI-compatible API).

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tori_core::{CoreConfig, RemoteCollaborator, RemoteError, StudentContext, DEFAULT_REMOTE_TIMEOUT};

const COLLABORATOR_NAME: &str = "ModelRouter";
const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
const ENV_LLM_API_KEY: &str = "TORI_LLM_API_KEY";
const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_TEMPERATURE: f32 = 0.6;

const SYSTEM_PROMPT: &str = "You are Tori, a friendly university student assistant.
Be concise, specific, and helpful. If you don't know, say so and suggest Student Services.";

/// Sent when the student submits an empty message.
const EMPTY_PROMPT: &str = "Hello";
const NO_ANSWER: &str = "Sorry, I could not answer that.";

/// Mode for LLM invocation: mock (returns simulated generation) or live (calls external API).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LlmMode {
    #[default]
    Mock,
    Live,
}

impl LlmMode {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "live" | "openai" => LlmMode::Live,
            _ => LlmMode::Mock,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Routes a prompt string to a mock LLM or a live chat-completions API.
pub struct ModelRouter {
    mode: LlmMode,
    client: reqwest::Client,
    timeout: Duration,
    api_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

impl ModelRouter {
    pub fn with_mode(mode: LlmMode) -> Self {
        Self {
            mode,
            client: http_client(DEFAULT_REMOTE_TIMEOUT),
            timeout: DEFAULT_REMOTE_TIMEOUT,
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Mode, endpoint and model from config; API key from `OPENAI_API_KEY` or `TORI_LLM_API_KEY`.
    pub fn from_config(config: &CoreConfig) -> Self {
        let api_key = std::env::var(ENV_OPENAI_API_KEY)
            .or_else(|_| std::env::var(ENV_LLM_API_KEY))
            .ok();
        Self {
            mode: LlmMode::parse(&config.llm_mode),
            client: http_client(config.remote_timeout()),
            timeout: config.remote_timeout(),
            api_url: config.llm_api_url.clone(),
            api_key,
            model: config.llm_model.clone(),
            temperature: config.llm_temperature,
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    /// Bounds each live completion call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self.timeout = timeout;
        self
    }

    pub fn mode(&self) -> LlmMode {
        self.mode
    }

    /// Answers `message`; `context` is appended to the system prompt when present.
    pub async fn generate(&self, message: &str, context: Option<&str>) -> Result<String, RemoteError> {
        match self.mode {
            LlmMode::Mock => Ok(self.mock_generate(message)),
            LlmMode::Live => self.live_generate(message, context).await,
        }
    }

    /// Mock LLM: deterministic reply echoing a preview of the prompt.
    fn mock_generate(&self, prompt: &str) -> String {
        let preview = prompt
            .chars()
            .take(80)
            .chain(if prompt.chars().count() > 80 { "…" } else { "" }.chars())
            .collect::<String>();
        format!(
            "[Generated – Mock LLM]\n\nYou asked: \"{}\". I can help with fees, enrolment, grades, campus events, contacts, or a MyLearn walkthrough.",
            preview
        )
    }

    fn api_key(&self) -> Result<&str, RemoteError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| RemoteError::MissingCredentials(format!("{} is not set", ENV_OPENAI_API_KEY)))
    }

    fn build_messages(&self, message: &str, context: Option<&str>) -> Vec<ChatMessage> {
        let system = match context.map(str::trim).filter(|c| !c.is_empty()) {
            Some(ctx) => format!("{}\nContext:\n{}", SYSTEM_PROMPT, ctx),
            None => SYSTEM_PROMPT.to_string(),
        };
        let user = if message.is_empty() { EMPTY_PROMPT } else { message };
        vec![
            ChatMessage { role: "system".to_string(), content: system },
            ChatMessage { role: "user".to_string(), content: user.to_string() },
        ]
    }

    async fn live_generate(&self, message: &str, context: Option<&str>) -> Result<String, RemoteError> {
        let key = self.api_key()?;
        let request_body = ChatCompletionRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            messages: self.build_messages(message, context),
        };

        tracing::info!(target: "tori::remote", model = %self.model, "Dispatching to chat completions API");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(target: "tori::remote", status = status.as_u16(), body = %error_text, "LLM API error");
            return Err(RemoteError::Status(status.as_u16()));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Malformed(e.to_string()))?;

        let generated = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| NO_ANSWER.to_string());

        Ok(generated.trim().to_string())
    }
}

impl ModelRouter {
    fn map_transport(&self, e: reqwest::Error) -> RemoteError {
        if e.is_timeout() {
            RemoteError::Timeout(self.timeout)
        } else {
            RemoteError::Transport(e.to_string())
        }
    }
}

/// HTTP client with a per-request timeout. Falls back to reqwest defaults if the builder fails.
fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        tracing::warn!(target: "tori::remote", error = %e, "HTTP client builder failed, using defaults");
        reqwest::Client::new()
    })
}

impl Default for ModelRouter {
    fn default() -> Self {
        Self::with_mode(LlmMode::Mock)
    }
}

#[async_trait::async_trait]
impl RemoteCollaborator for ModelRouter {
    fn name(&self) -> &str {
        COLLABORATOR_NAME
    }

    async fn ask(&self, text: &str, context: Option<&StudentContext>) -> Result<String, RemoteError> {
        let context = context.map(StudentContext::as_prompt_text);
        self.generate(text, context.as_deref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::Value;

    async fn spawn_completions() -> String {
        let app = Router::new()
            .route("/v1/chat/completions", post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer test-key") {
                    return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({ "error": "bad key" })));
                }
                let content = format!("  {}  ", body);
                (StatusCode::OK, Json(serde_json::json!({ "choices": [ { "message": { "content": content } } ] })))
            }))
            .route("/v1/empty", post(|| async { Json(serde_json::json!({ "choices": [] })) }))
            .route(
                "/v1/slow",
                post(|| async {
                    tokio::time::sleep(std::time::Duration::from_secs(3)).await;
                    Json(serde_json::json!({ "choices": [] }))
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn live(base: &str, path: &str, key: Option<&str>) -> ModelRouter {
        ModelRouter::with_mode(LlmMode::Live)
            .with_api_url(format!("{}{}", base, path))
            .with_api_key(key.map(String::from))
    }

    #[test]
    fn mode_parsing() {
        assert_eq!(LlmMode::parse("LIVE"), LlmMode::Live);
        assert_eq!(LlmMode::parse("openai"), LlmMode::Live);
        assert_eq!(LlmMode::parse("mock"), LlmMode::Mock);
        assert_eq!(LlmMode::parse("anything"), LlmMode::Mock);
    }

    #[tokio::test]
    async fn mock_is_deterministic() {
        let router = ModelRouter::default();
        let a = router.generate("When is census date?", None).await.unwrap();
        let b = router.generate("When is census date?", Some("Name: Sam")).await.unwrap();
        assert_eq!(a, b);
        assert!(a.contains("When is census date?"));
    }

    #[tokio::test]
    async fn live_without_key_reports_missing_credentials() {
        let router = live("http://127.0.0.1:9", "/v1/chat/completions", Some("  "));
        let err = router.generate("hi", None).await.unwrap_err();
        assert!(matches!(err, RemoteError::MissingCredentials(_)));
    }

    #[tokio::test]
    async fn live_sends_system_prompt_with_context() {
        let base = spawn_completions().await;
        let router = live(&base, "/v1/chat/completions", Some("test-key"));
        let ctx = StudentContext::new("Sam", "s1");
        let reply = router.ask("", Some(&ctx)).await.unwrap();
        assert!(!reply.starts_with(' '));
        let sent: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(sent["model"], "gpt-3.5-turbo");
        assert_eq!(sent["messages"][0]["role"], "system");
        let system = sent["messages"][0]["content"].as_str().unwrap();
        assert!(system.starts_with("You are Tori"));
        assert!(system.ends_with("\nContext:\nName: Sam\nStudent ID: s1"));
        assert_eq!(sent["messages"][1]["content"], "Hello");
    }

    #[tokio::test]
    async fn live_errors_and_empty_choices() {
        let base = spawn_completions().await;
        let wrong_key = live(&base, "/v1/chat/completions", Some("nope"));
        assert!(matches!(wrong_key.generate("hi", None).await, Err(RemoteError::Status(401))));

        let empty = live(&base, "/v1/empty", Some("test-key"));
        assert_eq!(empty.generate("hi", None).await.unwrap(), NO_ANSWER);
    }

    #[tokio::test]
    async fn live_call_is_bounded_by_timeout() {
        let base = spawn_completions().await;
        let router = live(&base, "/v1/slow", Some("test-key")).with_timeout(Duration::from_millis(200));
        let err = router.generate("hi", None).await.unwrap_err();
        assert!(matches!(err, RemoteError::Timeout(t) if t == Duration::from_millis(200)));
    }

    #[test]
    fn from_config_uses_remote_timeout() {
        std::env::set_var("TORI_CONFIG", "/nonexistent/tori-config");
        let mut config = CoreConfig::load().unwrap();
        config.remote_timeout_secs = 4;
        assert_eq!(ModelRouter::from_config(&config).timeout, Duration::from_secs(4));
        assert_eq!(ModelRouter::default().timeout, DEFAULT_REMOTE_TIMEOUT);
    }
}
