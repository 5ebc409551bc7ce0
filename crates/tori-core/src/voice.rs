//! Speech collaborators. Engines live outside the core; the core only sees
//! whether each direction is available and degrades to text when it is not.

use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    #[error("{0} is not supported in this session")]
    CapabilityUnavailable(&'static str),
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
    #[error("speech recognition failed: {0}")]
    Recognition(String),
}

/// Voice tuning handed to speech engines.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceProfile {
    pub rate: f32,
    pub pitch: f32,
    /// BCP 47 tag for recognition.
    pub lang: String,
    /// Preferred synthesis voices, best first. Engines match by case-insensitive substring.
    pub preferred_voices: Vec<String>,
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self {
            rate: 1.02,
            pitch: 1.06,
            lang: "en-AU".to_string(),
            preferred_voices: ["Google UK English Female", "Samantha", "Zira", "female"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl VoiceProfile {
    /// Picks the best available voice name: preferred names in order, then any English voice.
    pub fn choose_voice<'a>(&self, available: &'a [(String, String)]) -> Option<&'a str> {
        self.preferred_voices
            .iter()
            .find_map(|want| {
                let want = want.to_lowercase();
                available
                    .iter()
                    .find(|(name, _)| name.to_lowercase().contains(&want))
            })
            .or_else(|| {
                available
                    .iter()
                    .find(|(_, lang)| lang.to_lowercase().starts_with("en"))
            })
            .map(|(name, _)| name.as_str())
    }
}

/// Text-to-speech engine.
#[async_trait::async_trait]
pub trait SpeechOutput: Send + Sync {
    async fn speak(&self, text: &str, profile: &VoiceProfile) -> Result<(), VoiceError>;
}

/// One-shot speech recognition.
#[async_trait::async_trait]
pub trait SpeechInput: Send + Sync {
    async fn listen_once(&self, lang: &str) -> Result<String, VoiceError>;
}

/// A session capability, checked once when the session starts.
#[derive(Clone)]
pub enum Capability<T> {
    Supported(T),
    Unsupported,
}

impl<T> Capability<T> {
    pub fn from_option(engine: Option<T>) -> Self {
        match engine {
            Some(e) => Self::Supported(e),
            None => Self::Unsupported,
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Supported(e) => Some(e),
            Self::Unsupported => None,
        }
    }
}

/// Speech directions available to a session.
#[derive(Clone)]
pub struct VoiceCapabilities {
    pub output: Capability<Arc<dyn SpeechOutput>>,
    pub input: Capability<Arc<dyn SpeechInput>>,
}

impl VoiceCapabilities {
    /// Text-only session.
    pub fn none() -> Self {
        Self {
            output: Capability::Unsupported,
            input: Capability::Unsupported,
        }
    }

    pub fn detect(output: Option<Arc<dyn SpeechOutput>>, input: Option<Arc<dyn SpeechInput>>) -> Self {
        let caps = Self {
            output: Capability::from_option(output),
            input: Capability::from_option(input),
        };
        tracing::info!(
            target: "tori::session",
            speech_output = caps.output.is_supported(),
            speech_input = caps.input.is_supported(),
            "Voice capabilities detected"
        );
        caps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voices(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter().map(|(n, l)| (n.to_string(), l.to_string())).collect()
    }

    #[test]
    fn prefers_named_voices_in_order() {
        let profile = VoiceProfile::default();
        let available = voices(&[("Microsoft Zira", "en-US"), ("Samantha", "en-US")]);
        assert_eq!(profile.choose_voice(&available), Some("Samantha"));
    }

    #[test]
    fn falls_back_to_any_english_voice() {
        let profile = VoiceProfile::default();
        let available = voices(&[("Thomas", "fr-FR"), ("Daniel", "en-GB")]);
        assert_eq!(profile.choose_voice(&available), Some("Daniel"));
        assert_eq!(profile.choose_voice(&voices(&[("Thomas", "fr-FR")])), None);
    }

    #[test]
    fn none_is_text_only() {
        let caps = VoiceCapabilities::none();
        assert!(!caps.output.is_supported());
        assert!(caps.input.get().is_none());
    }
}
