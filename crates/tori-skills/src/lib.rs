//! Remote collaborators for the Tori resolver: HTTP chat backend adapter and LLM model router.

mod model_router;
mod remote_chat;

pub use model_router::{LlmMode, ModelRouter};
pub use remote_chat::{RemoteAdapter, RemoteChatClient};
