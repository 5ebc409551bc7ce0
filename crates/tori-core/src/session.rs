//! Per-user chat session: resolves turns and hands replies to speech when allowed.

use crate::orchestrator::Resolver;
use crate::shared::{ChatRequest, ChatTurn, StudentContext};
use crate::voice::{VoiceCapabilities, VoiceError, VoiceProfile};
use std::sync::Arc;

/// Per-session switches owned by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Speak replies aloud when speech output is supported.
    pub audio_enabled: bool,
    pub voice: VoiceProfile,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            audio_enabled: true,
            voice: VoiceProfile::default(),
        }
    }
}

pub struct ChatSession {
    resolver: Arc<Resolver>,
    settings: SessionSettings,
    capabilities: VoiceCapabilities,
    context: Option<StudentContext>,
}

impl ChatSession {
    pub fn new(resolver: Arc<Resolver>, settings: SessionSettings, capabilities: VoiceCapabilities) -> Self {
        Self {
            resolver,
            settings,
            capabilities,
            context: None,
        }
    }

    /// Attaches the logged-in student's identity to every turn.
    pub fn with_context(mut self, context: StudentContext) -> Self {
        self.context = Some(context).filter(|c| !c.is_empty());
        self
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn set_audio_enabled(&mut self, enabled: bool) {
        tracing::debug!(target: "tori::session", enabled, "Audio toggled");
        self.settings.audio_enabled = enabled;
    }

    /// True when replies will be spoken.
    pub fn speaks(&self) -> bool {
        self.settings.audio_enabled && self.capabilities.output.is_supported()
    }

    /// Resolves one typed message and speaks the reply if enabled.
    pub async fn send(&self, text: &str) -> ChatTurn {
        let mut req = ChatRequest::new(text);
        req.context = self.context.clone();
        let reply = self.resolver.resolve(&req).await;
        let spoken = self.speak(&reply.reply).await;
        ChatTurn {
            input: req.text,
            topic: reply.topic,
            reply: reply.reply,
            path: reply.path,
            spoken,
        }
    }

    /// Captures one utterance. Fails with `CapabilityUnavailable` in text-only sessions.
    pub async fn listen(&self) -> Result<String, VoiceError> {
        let engine = self
            .capabilities
            .input
            .get()
            .ok_or(VoiceError::CapabilityUnavailable("speech recognition"))?;
        engine.listen_once(&self.settings.voice.lang).await
    }

    /// Listens once and sends what was heard.
    pub async fn send_spoken(&self) -> Result<ChatTurn, VoiceError> {
        let heard = self.listen().await?;
        Ok(self.send(&heard).await)
    }

    async fn speak(&self, text: &str) -> bool {
        if !self.settings.audio_enabled {
            return false;
        }
        let Some(engine) = self.capabilities.output.get() else {
            return false;
        };
        match engine.speak(text, &self.settings.voice).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(target: "tori::session", error = %e, "Speech output failed, continuing text-only");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{KnowledgeBase, Topic};
    use crate::shared::ResolutionPath;
    use crate::voice::{SpeechInput, SpeechOutput};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingVoice {
        said: Mutex<Vec<String>>,
        broken: bool,
    }

    #[async_trait::async_trait]
    impl SpeechOutput for RecordingVoice {
        async fn speak(&self, text: &str, _profile: &VoiceProfile) -> Result<(), VoiceError> {
            if self.broken {
                return Err(VoiceError::Synthesis("no voices".into()));
            }
            self.said.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct FixedEar(&'static str);

    #[async_trait::async_trait]
    impl SpeechInput for FixedEar {
        async fn listen_once(&self, lang: &str) -> Result<String, VoiceError> {
            assert_eq!(lang, "en-AU");
            Ok(self.0.to_string())
        }
    }

    fn resolver() -> Arc<Resolver> {
        Arc::new(Resolver::local_only(Arc::new(KnowledgeBase::builtin())))
    }

    #[tokio::test]
    async fn speaks_reply_when_enabled() {
        let voice = Arc::new(RecordingVoice::default());
        let caps = VoiceCapabilities::detect(Some(voice.clone()), None);
        let session = ChatSession::new(resolver(), SessionSettings::default(), caps);
        let turn = session.send("grades please").await;
        assert!(turn.spoken);
        assert_eq!(turn.topic, Some(Topic::Grades));
        assert_eq!(voice.said.lock().unwrap().as_slice(), [turn.reply.clone()]);
    }

    #[tokio::test]
    async fn muted_or_unsupported_output_stays_text_only() {
        let voice = Arc::new(RecordingVoice::default());
        let mut session = ChatSession::new(
            resolver(),
            SessionSettings::default(),
            VoiceCapabilities::detect(Some(voice.clone()), None),
        );
        session.set_audio_enabled(false);
        let muted = session.send("fees").await;
        assert!(!muted.spoken);
        assert!(voice.said.lock().unwrap().is_empty());

        let text_only = ChatSession::new(resolver(), SessionSettings::default(), VoiceCapabilities::none());
        let turn = text_only.send("fees").await;
        assert!(!text_only.speaks());
        assert_eq!(turn.reply, muted.reply);
        assert_eq!(turn.path, ResolutionPath::LocalDirect);
    }

    #[tokio::test]
    async fn speech_failure_keeps_the_turn() {
        let voice = Arc::new(RecordingVoice {
            broken: true,
            ..Default::default()
        });
        let session = ChatSession::new(
            resolver(),
            SessionSettings::default(),
            VoiceCapabilities::detect(Some(voice), None),
        );
        let turn = session.send("helpdesk").await;
        assert!(!turn.spoken);
        assert_eq!(turn.topic, Some(Topic::Contacts));
    }

    #[tokio::test]
    async fn listen_requires_speech_input() {
        let session = ChatSession::new(resolver(), SessionSettings::default(), VoiceCapabilities::none());
        let err = session.listen().await.unwrap_err();
        assert!(matches!(err, VoiceError::CapabilityUnavailable(_)));
    }

    #[tokio::test]
    async fn spoken_question_is_resolved_with_context() {
        let caps = VoiceCapabilities::detect(None, Some(Arc::new(FixedEar("something else entirely"))));
        let session = ChatSession::new(resolver(), SessionSettings::default(), caps)
            .with_context(StudentContext::new("Priya", "s42"));
        let turn = session.send_spoken().await.unwrap();
        assert_eq!(turn.input, "something else entirely");
        assert_eq!(turn.topic, Some(Topic::Fallback));
        assert!(turn.reply.contains("Priya"));
        assert!(!turn.spoken);
    }

    #[tokio::test]
    async fn typed_turns_carry_session_identity() {
        let session = ChatSession::new(resolver(), SessionSettings::default(), VoiceCapabilities::none())
            .with_context(StudentContext::new("Priya", "s42"));
        let turn = session.send("xyz").await;
        assert!(turn.reply.contains("Priya"));

        let blank = ChatSession::new(resolver(), SessionSettings::default(), VoiceCapabilities::none())
            .with_context(StudentContext::new("  ", ""));
        assert!(blank.send("xyz").await.reply.contains("there"));
    }
}
