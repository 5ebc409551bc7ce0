//! Response resolver: remote-first delegation with silent local fallback.

mod remote;

pub use remote::{RemoteCollaborator, RemoteError};

use crate::classifier::classify;
use crate::knowledge::KnowledgeBase;
use crate::shared::{ChatReply, ChatRequest, ResolutionPath};
use std::sync::Arc;
use std::time::Duration;

/// Default bound on one remote call.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

/// Shown only if a knowledge entry somehow renders empty.
pub const UNREACHABLE_REPLY: &str = "Sorry, I couldn't reach the AI right now.";

/// Remote collaborator plus the timeout applied around each call.
struct RemoteRoute {
    collaborator: Arc<dyn RemoteCollaborator>,
    timeout: Duration,
}

/// Turns a chat request into a reply. The operating mode is fixed at construction.
///
/// Holds no per-call state; share it behind an `Arc` across concurrent turns.
pub struct Resolver {
    knowledge: Arc<KnowledgeBase>,
    remote: Option<RemoteRoute>,
}

impl Resolver {
    /// Local-only: every reply comes straight from the knowledge base.
    pub fn local_only(knowledge: Arc<KnowledgeBase>) -> Self {
        Self {
            knowledge,
            remote: None,
        }
    }

    /// Remote-first with the default timeout.
    pub fn remote_first(knowledge: Arc<KnowledgeBase>, collaborator: Arc<dyn RemoteCollaborator>) -> Self {
        Self::remote_first_with_timeout(knowledge, collaborator, DEFAULT_REMOTE_TIMEOUT)
    }

    pub fn remote_first_with_timeout(
        knowledge: Arc<KnowledgeBase>,
        collaborator: Arc<dyn RemoteCollaborator>,
        timeout: Duration,
    ) -> Self {
        Self {
            knowledge,
            remote: Some(RemoteRoute {
                collaborator,
                timeout,
            }),
        }
    }

    /// True when a remote collaborator is configured.
    pub fn is_remote_first(&self) -> bool {
        self.remote.is_some()
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Resolves one message. Never fails and never returns an empty reply.
    pub async fn resolve(&self, req: &ChatRequest) -> ChatReply {
        let Some(route) = &self.remote else {
            return self.answer_locally(req, ResolutionPath::LocalDirect);
        };

        tracing::debug!(
            target: "tori::resolver",
            chars = req.text.len(),
            collaborator = route.collaborator.name(),
            "Remote attempt"
        );
        let outcome = tokio::time::timeout(
            route.timeout,
            route.collaborator.ask(&req.text, req.context.as_ref()),
        )
        .await
        .unwrap_or(Err(RemoteError::Timeout(route.timeout)));

        match outcome {
            Ok(reply) if !reply.trim().is_empty() => ChatReply {
                reply,
                topic: None,
                path: ResolutionPath::Remote,
            },
            Ok(_) => {
                tracing::warn!(target: "tori::resolver", error = %RemoteError::EmptyReply, "Remote failed, answering locally");
                self.answer_locally(req, ResolutionPath::LocalFallback)
            }
            Err(e) => {
                tracing::warn!(target: "tori::resolver", error = %e, "Remote failed, answering locally");
                self.answer_locally(req, ResolutionPath::LocalFallback)
            }
        }
    }

    /// Answers from the knowledge base without contacting the remote collaborator.
    pub fn resolve_locally(&self, req: &ChatRequest) -> ChatReply {
        self.answer_locally(req, ResolutionPath::LocalDirect)
    }

    /// Classify and look up the canned reply.
    fn answer_locally(&self, req: &ChatRequest, path: ResolutionPath) -> ChatReply {
        let topic = classify(&req.text);
        let mut reply = self.knowledge.reply(topic, req.greeting_name());
        if reply.trim().is_empty() {
            reply = UNREACHABLE_REPLY.to_string();
        }
        tracing::debug!(target: "tori::resolver", topic = %topic, path = path.as_str(), "Answered locally");
        ChatReply {
            reply,
            topic: Some(topic),
            path,
        }
    }
}
