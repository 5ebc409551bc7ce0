//! tori-core: Tori help-chat core (topic classifier, knowledge base, response resolver, chat session).

mod classifier;
mod knowledge;
mod orchestrator;
mod session;
mod shared;
mod voice;

// Shared
pub use shared::{
    ChatReply, ChatRequest, ChatTurn, ContextFormat, CoreConfig, ResolutionPath, StudentContext,
    DEFAULT_GREETING_NAME,
};

// Classifier + knowledge base
pub use classifier::classify;
pub use knowledge::{KnowledgeBase, KnowledgeError, Topic, UnknownTopic, NAME_PLACEHOLDER};

// Resolver
pub use orchestrator::{RemoteCollaborator, RemoteError, Resolver, DEFAULT_REMOTE_TIMEOUT, UNREACHABLE_REPLY};

// Session + speech collaborators
pub use session::{ChatSession, SessionSettings};
pub use voice::{Capability, SpeechInput, SpeechOutput, VoiceCapabilities, VoiceError, VoiceProfile};
