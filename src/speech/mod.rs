//! Read-aloud support: a speech-synthesis collaborator behind a capability
//! seam.
//!
//! No synthesis engine ships with the crate; platforms provide a
//! [`SpeechBackend`] and the controller degrades gracefully when none is
//! available (feature disabled, user informed once).

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SpeechError {
    #[error("text-to-speech is not supported on this system")]
    Unsupported,

    #[error("speech synthesis error: {0}")]
    Backend(String),
}

/// An available synthesis voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// BCP-47 language tag, e.g. "en-IN".
    pub lang: String,
}

/// Delivery settings tuned for reading clinical answers aloud.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpeechSettings {
    /// Slightly slower than default for terminology clarity.
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    /// Preferred voice language prefix; best-effort, not a hard requirement.
    pub preferred_lang: String,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            rate: 0.95,
            pitch: 1.0,
            volume: 0.9,
            preferred_lang: "en".to_string(),
        }
    }
}

/// Platform synthesis engine. One utterance at a time; `speak` replaces any
/// utterance in flight.
pub trait SpeechBackend: Send {
    fn voices(&self) -> Vec<Voice>;
    fn speak(
        &mut self,
        text: &str,
        voice: Option<&Voice>,
        settings: &SpeechSettings,
    ) -> Result<(), SpeechError>;
    fn pause(&mut self) -> Result<(), SpeechError>;
    fn resume(&mut self) -> Result<(), SpeechError>;
    fn cancel(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadAloudState {
    #[default]
    Idle,
    Speaking,
    Paused,
}

/// Controller for reading responses aloud. Owns the backend (if any) and the
/// speaking/paused state the rendering layer displays.
#[derive(Default)]
pub struct ReadAloud {
    backend: Option<Box<dyn SpeechBackend>>,
    settings: SpeechSettings,
    state: ReadAloudState,
}

impl ReadAloud {
    /// Capability detection, queried once at startup. No backend is bundled,
    /// so detection currently always reports unsupported; the seam exists so
    /// platform engines can be slotted in without touching callers.
    pub fn detect(settings: SpeechSettings) -> Self {
        tracing::debug!("No speech synthesis backend available; read-aloud disabled");
        Self {
            backend: None,
            settings,
            state: ReadAloudState::Idle,
        }
    }

    pub fn with_backend(backend: Box<dyn SpeechBackend>, settings: SpeechSettings) -> Self {
        Self {
            backend: Some(backend),
            settings,
            state: ReadAloudState::Idle,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.backend.is_some()
    }

    pub fn state(&self) -> ReadAloudState {
        self.state
    }

    /// Start reading `text`, cancelling any utterance in flight. Prefers a
    /// voice matching the configured language prefix when the backend offers
    /// one.
    pub fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        let backend = self.backend.as_mut().ok_or(SpeechError::Unsupported)?;
        backend.cancel();

        let voice = preferred_voice(&backend.voices(), &self.settings.preferred_lang);
        backend.speak(text, voice.as_ref(), &self.settings)?;
        self.state = ReadAloudState::Speaking;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), SpeechError> {
        if self.state != ReadAloudState::Speaking {
            return Ok(());
        }
        let backend = self.backend.as_mut().ok_or(SpeechError::Unsupported)?;
        backend.pause()?;
        self.state = ReadAloudState::Paused;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), SpeechError> {
        if self.state != ReadAloudState::Paused {
            return Ok(());
        }
        let backend = self.backend.as_mut().ok_or(SpeechError::Unsupported)?;
        backend.resume()?;
        self.state = ReadAloudState::Speaking;
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(backend) = self.backend.as_mut() {
            backend.cancel();
        }
        self.state = ReadAloudState::Idle;
    }

    /// Completion notification from the backend: the utterance finished.
    pub fn on_complete(&mut self) {
        self.state = ReadAloudState::Idle;
    }
}

/// Pick the first voice whose language matches the preferred prefix.
fn preferred_voice(voices: &[Voice], lang_prefix: &str) -> Option<Voice> {
    voices
        .iter()
        .find(|v| v.lang.starts_with(lang_prefix))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct FakeBackend {
        spoken: Arc<Mutex<Vec<(String, Option<String>)>>>,
        voices: Vec<Voice>,
    }

    impl SpeechBackend for FakeBackend {
        fn voices(&self) -> Vec<Voice> {
            self.voices.clone()
        }

        fn speak(
            &mut self,
            text: &str,
            voice: Option<&Voice>,
            _settings: &SpeechSettings,
        ) -> Result<(), SpeechError> {
            self.spoken
                .lock()
                .unwrap()
                .push((text.to_string(), voice.map(|v| v.name.clone())));
            Ok(())
        }

        fn pause(&mut self) -> Result<(), SpeechError> {
            Ok(())
        }

        fn resume(&mut self) -> Result<(), SpeechError> {
            Ok(())
        }

        fn cancel(&mut self) {}
    }

    #[test]
    fn test_unsupported_without_backend() {
        let mut ra = ReadAloud::detect(SpeechSettings::default());
        assert!(!ra.is_supported());
        assert!(matches!(ra.speak("hello"), Err(SpeechError::Unsupported)));
        assert_eq!(ra.state(), ReadAloudState::Idle);
    }

    #[test]
    fn test_state_transitions() {
        let backend = FakeBackend::default();
        let mut ra = ReadAloud::with_backend(Box::new(backend), SpeechSettings::default());

        ra.speak("first-line therapy is metformin").unwrap();
        assert_eq!(ra.state(), ReadAloudState::Speaking);

        ra.pause().unwrap();
        assert_eq!(ra.state(), ReadAloudState::Paused);

        ra.resume().unwrap();
        assert_eq!(ra.state(), ReadAloudState::Speaking);

        ra.on_complete();
        assert_eq!(ra.state(), ReadAloudState::Idle);
    }

    #[test]
    fn test_pause_when_idle_is_noop() {
        let mut ra =
            ReadAloud::with_backend(Box::new(FakeBackend::default()), SpeechSettings::default());
        ra.pause().unwrap();
        assert_eq!(ra.state(), ReadAloudState::Idle);
        ra.resume().unwrap();
        assert_eq!(ra.state(), ReadAloudState::Idle);
    }

    #[test]
    fn test_prefers_english_voice() {
        let backend = FakeBackend {
            voices: vec![
                Voice {
                    name: "Hindi".into(),
                    lang: "hi-IN".into(),
                },
                Voice {
                    name: "English (India)".into(),
                    lang: "en-IN".into(),
                },
            ],
            ..FakeBackend::default()
        };
        let spoken = backend.spoken.clone();
        let mut ra = ReadAloud::with_backend(Box::new(backend), SpeechSettings::default());

        ra.speak("hello").unwrap();
        let log = spoken.lock().unwrap();
        assert_eq!(log[0].1.as_deref(), Some("English (India)"));
    }

    #[test]
    fn test_no_matching_voice_falls_back_to_default() {
        let backend = FakeBackend {
            voices: vec![Voice {
                name: "Hindi".into(),
                lang: "hi-IN".into(),
            }],
            ..FakeBackend::default()
        };
        let spoken = backend.spoken.clone();
        let mut ra = ReadAloud::with_backend(Box::new(backend), SpeechSettings::default());

        ra.speak("hello").unwrap();
        assert_eq!(spoken.lock().unwrap()[0].1, None);
    }

    #[test]
    fn test_stop_returns_to_idle() {
        let mut ra =
            ReadAloud::with_backend(Box::new(FakeBackend::default()), SpeechSettings::default());
        ra.speak("hello").unwrap();
        ra.stop();
        assert_eq!(ra.state(), ReadAloudState::Idle);
    }
}
