use crate::shared::StudentContext;
use std::time::Duration;

/// Why a remote attempt produced no usable reply. Always recovered by the resolver.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("backend returned HTTP {0}")]
    Status(u16),
    #[error("malformed response body: {0}")]
    Malformed(String),
    #[error("response carried no reply text")]
    EmptyReply,
    #[error("backend credentials missing: {0}")]
    MissingCredentials(String),
}

/// External AI backend consulted before the knowledge base in remote-first mode.
#[async_trait::async_trait]
pub trait RemoteCollaborator: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Sends the user text (and optional student context) and returns the backend's reply.
    async fn ask(&self, text: &str, context: Option<&StudentContext>) -> Result<String, RemoteError>;
}
