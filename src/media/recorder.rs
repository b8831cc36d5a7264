//! Voice recording: one microphone capture session from start request to
//! finalized audio attachment.
//!
//! The capture device sits behind [`CaptureDevice`] so the state machine is
//! platform-agnostic; the cpal-backed implementation lives in `capture.rs`
//! behind the `audio` feature.

use std::any::Any;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use super::store::Attachment;
use super::validator::MediaCategory;
use super::wav;

/// Recording lifecycle errors. Never fatal to the composer — the session
/// stays idle and the user can retry.
#[derive(Debug, Clone, Error)]
pub enum RecorderError {
    #[error("could not access microphone: {0}")]
    AccessDenied(String),
}

/// A granted capture session: a stream of PCM16 mono frames at `sample_rate`.
///
/// Dropping the stream releases the device, so teardown works even when
/// `stop` was never invoked.
pub struct CaptureStream {
    sample_rate: u32,
    frames: Receiver<Vec<i16>>,
    _keep_alive: Box<dyn Any + Send>,
}

impl CaptureStream {
    pub fn new(
        sample_rate: u32,
        frames: Receiver<Vec<i16>>,
        keep_alive: impl Any + Send + 'static,
    ) -> Self {
        Self {
            sample_rate,
            frames,
            _keep_alive: Box::new(keep_alive),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Pull all frames captured since the last drain.
    fn drain_into(&self, out: &mut Vec<i16>) {
        while let Ok(frame) = self.frames.try_recv() {
            out.extend_from_slice(&frame);
        }
    }
}

/// Microphone acquisition seam. `open` is the one-shot asynchronous request
/// that may be refused (permission denial, no device).
pub trait CaptureDevice {
    fn open(&self) -> Result<CaptureStream, RecorderError>;
}

/// Where the session stands. `Finalizing` is observable only from within
/// `stop`; callers see `Idle`, `Recording`, or `Complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderState {
    #[default]
    Idle,
    Recording,
    Finalizing,
    Complete,
}

/// One audio-capture session's lifecycle, producing a single attachment.
#[derive(Default)]
pub struct RecorderSession {
    state: RecorderState,
    started_at: Option<Instant>,
    samples: Vec<i16>,
    stream: Option<CaptureStream>,
}

impl RecorderSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    /// Whole seconds elapsed since capture began; zero when not recording.
    pub fn elapsed_secs(&self) -> u64 {
        self.started_at
            .map(|t| t.elapsed().as_secs())
            .unwrap_or(0)
    }

    /// Request the microphone and begin capturing.
    ///
    /// A `start` while already recording is a no-op. On denial the session
    /// stays idle and the error is returned for the user to see.
    pub fn start(&mut self, device: &dyn CaptureDevice) -> Result<(), RecorderError> {
        if self.state == RecorderState::Recording {
            tracing::debug!("Recorder already running; ignoring start");
            return Ok(());
        }

        match device.open() {
            Ok(stream) => {
                tracing::info!("Recording started ({} Hz)", stream.sample_rate());
                self.samples.clear();
                self.stream = Some(stream);
                self.started_at = Some(Instant::now());
                self.state = RecorderState::Recording;
                Ok(())
            }
            Err(e) => {
                self.state = RecorderState::Idle;
                Err(e)
            }
        }
    }

    /// Pull captured frames off the stream. Call periodically while recording
    /// (e.g. once per UI frame) to keep the channel from backing up.
    pub fn poll(&mut self) {
        if let Some(stream) = &self.stream {
            stream.drain_into(&mut self.samples);
        }
    }

    /// Stop capturing and finalize the take into a WAV attachment.
    ///
    /// Returns `None` when not recording, and also when nothing was captured:
    /// a zero-length take is discarded rather than emitted as an empty file.
    pub fn stop(&mut self) -> Option<Attachment> {
        if self.state != RecorderState::Recording {
            return None;
        }
        self.state = RecorderState::Finalizing;

        // Releasing the stream stops capture and frees the device.
        let Some(stream) = self.stream.take() else {
            self.state = RecorderState::Idle;
            return None;
        };
        stream.drain_into(&mut self.samples);
        let sample_rate = stream.sample_rate();
        drop(stream);

        self.started_at = None;

        if self.samples.is_empty() {
            tracing::info!("Discarding empty recording");
            self.state = RecorderState::Idle;
            return None;
        }

        let samples = std::mem::take(&mut self.samples);
        let seconds = wav::duration_secs(&samples, sample_rate);
        let data = wav::encode_pcm16_mono(&samples, sample_rate);
        let stamp = chrono::Utc::now().timestamp_millis();

        tracing::info!("Recording finalized: {:.1}s, {} bytes", seconds, data.len());
        self.state = RecorderState::Complete;

        Some(Attachment {
            id: stamp.to_string(),
            file_name: format!("recording-{}.wav", stamp),
            mime: "audio/wav".to_string(),
            category: MediaCategory::Audio,
            size: data.len() as u64,
            preview: None,
            data: Arc::new(data),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    /// Scripted capture device delivering a fixed set of frames.
    struct FakeMic {
        frames: Vec<Vec<i16>>,
    }

    impl CaptureDevice for FakeMic {
        fn open(&self) -> Result<CaptureStream, RecorderError> {
            let (tx, rx) = mpsc::channel();
            for frame in &self.frames {
                tx.send(frame.clone()).unwrap();
            }
            Ok(CaptureStream::new(8000, rx, tx))
        }
    }

    struct DeniedMic;

    impl CaptureDevice for DeniedMic {
        fn open(&self) -> Result<CaptureStream, RecorderError> {
            Err(RecorderError::AccessDenied("permission denied".into()))
        }
    }

    #[test]
    fn test_full_session_produces_wav_attachment() {
        let mic = FakeMic {
            frames: vec![vec![1i16; 160], vec![2i16; 160]],
        };
        let mut session = RecorderSession::new();
        session.start(&mic).unwrap();
        assert!(session.is_recording());

        session.poll();
        let att = session.stop().expect("attachment");
        assert_eq!(session.state(), RecorderState::Complete);
        assert_eq!(att.mime, "audio/wav");
        assert_eq!(att.category, MediaCategory::Audio);
        assert!(att.file_name.starts_with("recording-"));
        assert!(att.file_name.ends_with(".wav"));
        // 44-byte header + 320 samples * 2 bytes
        assert_eq!(att.size, 44 + 640);
        assert_eq!(&att.data[0..4], b"RIFF");
    }

    #[test]
    fn test_start_while_recording_is_noop() {
        let mic = FakeMic {
            frames: vec![vec![1i16; 160]],
        };
        let mut session = RecorderSession::new();
        session.start(&mic).unwrap();
        session.poll();
        // Second start must not reset the in-flight capture.
        session.start(&mic).unwrap();
        let att = session.stop().expect("attachment");
        assert_eq!(att.size, 44 + 320);
    }

    #[test]
    fn test_denied_access_leaves_session_idle() {
        let mut session = RecorderSession::new();
        let err = session.start(&DeniedMic).unwrap_err();
        assert!(matches!(err, RecorderError::AccessDenied(_)));
        assert_eq!(session.state(), RecorderState::Idle);
        assert_eq!(session.elapsed_secs(), 0);
        assert!(session.stop().is_none());
    }

    #[test]
    fn test_empty_take_is_discarded() {
        let mic = FakeMic { frames: vec![] };
        let mut session = RecorderSession::new();
        session.start(&mic).unwrap();
        assert!(session.stop().is_none());
        assert_eq!(session.state(), RecorderState::Idle);
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let mut session = RecorderSession::new();
        assert!(session.stop().is_none());
        assert_eq!(session.state(), RecorderState::Idle);
    }

    #[test]
    fn test_counter_resets_after_stop() {
        let mic = FakeMic {
            frames: vec![vec![0i16; 10]],
        };
        let mut session = RecorderSession::new();
        session.start(&mic).unwrap();
        session.poll();
        session.stop();
        assert_eq!(session.elapsed_secs(), 0);
    }

    #[test]
    fn test_fresh_start_after_complete() {
        let mic = FakeMic {
            frames: vec![vec![0i16; 10]],
        };
        let mut session = RecorderSession::new();
        session.start(&mic).unwrap();
        session.poll();
        session.stop().expect("first take");

        session.start(&mic).unwrap();
        assert!(session.is_recording());
        session.poll();
        session.stop().expect("second take");
    }
}
