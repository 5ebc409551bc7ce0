//! Axum-based gateway for the Tori help-chat. Config-driven via CoreConfig.

mod handlers;

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use handlers::chat::ChatBody;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tori_core::{CoreConfig, KnowledgeBase, Resolver};
use tori_skills::{ModelRouter, RemoteChatClient};
use tracing::Instrument;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Reply body for `/api/ask` when the LLM call fails.
const ASK_ERROR_REPLY: &str = "Error contacting AI (check server logs & OPENAI_API_KEY).";

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[tori-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let verify_only = std::env::args().any(|a| a == "--verify");
    if let Err(e) = run(verify_only).await {
        tracing::error!(target: "tori::gateway", error = %e, "Gateway failed");
        std::process::exit(1);
    }
}

async fn run(verify_only: bool) -> Result<(), BoxError> {
    let config = Arc::new(CoreConfig::load()?);
    let state = build_state(Arc::clone(&config))?;

    if verify_only {
        println!(
            "{}: config OK, resolver mode = {}",
            config.app_name,
            resolver_mode(&state.resolver)
        );
        return Ok(());
    }

    let app = build_app(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(target: "tori::gateway", "{} listening on {}", config.app_name, addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Knowledge base, resolver mode and LLM proxy, all fixed for the life of the process.
fn build_state(config: Arc<CoreConfig>) -> Result<AppState, BoxError> {
    let knowledge = match config.knowledge_path.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(path) => KnowledgeBase::load_json_path(path)?,
        None => KnowledgeBase::builtin(),
    };
    let knowledge = Arc::new(knowledge);

    let resolver = match RemoteChatClient::from_config(&config)? {
        Some(client) => {
            tracing::info!(target: "tori::gateway", endpoint = client.endpoint(), "Resolver mode: remote-first");
            Resolver::remote_first_with_timeout(knowledge, Arc::new(client), config.remote_timeout())
        }
        None => {
            tracing::info!(target: "tori::gateway", "Resolver mode: local-only");
            Resolver::local_only(knowledge)
        }
    };

    let model_router = ModelRouter::from_config(&config);
    tracing::info!(target: "tori::gateway", mode = ?model_router.mode(), "LLM proxy ready");

    Ok(AppState {
        config,
        resolver: Arc::new(resolver),
        model_router: Arc::new(model_router),
    })
}

fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/ask", post(ask))
        .with_state(state)
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<CoreConfig>,
    pub(crate) resolver: Arc<Resolver>,
    pub(crate) model_router: Arc<ModelRouter>,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn resolver_mode(resolver: &Resolver) -> &'static str {
    if resolver.is_remote_first() {
        "remote-first"
    } else {
        "local-only"
    }
}

/// GET /api/health – liveness check.
async fn health(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "ok": true,
        "ts": now_millis(),
        "app": state.config.app_name,
        "mode": resolver_mode(&state.resolver),
    }))
}

/// POST /api/chat – resolves one message (remote-first or local-only per config). Always 200.
///
/// An unreadable body is answered from the knowledge base as an empty message.
async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> axum::Json<serde_json::Value> {
    let span = tracing::info_span!("chat", turn_id = %uuid::Uuid::new_v4());
    async move {
        let out = match body {
            Ok(Json(body)) => {
                let req = body.into_request();
                tracing::info!(target: "tori::gateway", chars = req.text.len(), "Chat request received");
                state.resolver.resolve(&req).await
            }
            Err(rejection) => {
                tracing::warn!(target: "tori::gateway", error = %rejection, "Unreadable chat body, answering locally");
                state.resolver.resolve_locally(&ChatBody::default().into_request())
            }
        };
        tracing::info!(target: "tori::gateway", path = out.path.as_str(), topic = ?out.topic, "Chat reply sent");
        axum::Json(serde_json::json!({
            "reply": out.reply,
            "topic": out.topic,
            "path": out.path,
        }))
    }
    .instrument(span)
    .await
}

/// POST /api/ask – LLM proxy returning `{ reply }`; the remote shape `/api/chat` can delegate to.
async fn ask(State(state): State<AppState>, Json(body): Json<ChatBody>) -> impl IntoResponse {
    let context = body.context_text();
    tracing::info!(target: "tori::gateway", chars = body.message.len(), "Ask request received");
    match state.model_router.generate(&body.message, context.as_deref()).await {
        Ok(reply) => (StatusCode::OK, axum::Json(serde_json::json!({ "reply": reply }))),
        Err(e) => {
            tracing::error!(target: "tori::gateway", error = %e, "AI error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(serde_json::json!({ "reply": ASK_ERROR_REPLY })),
            )
        }
    }
}
