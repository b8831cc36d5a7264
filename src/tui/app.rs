//! TUI application state and main event loop.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

use super::compose::ComposeState;
use super::ui;
use crate::assistant::Assistant;
use crate::compose::MessageComposer;
use crate::config::Config;
use crate::media::progress::UploadProgress;
use crate::media::recorder::RecorderSession;
use crate::media::store::{Attachment, AttachmentStore, FileCandidate};
use crate::media::validator::{FileValidator, MediaCategory};
use crate::models::message::ChatMessage;
use crate::speech::ReadAloud;

/// Input poll interval (~30 fps).
const FRAME_DURATION_MS: u64 = 33;

/// Nominal transfer rate for the simulated attachment upload. There is no
/// backend to talk to; the progress display is driven by this rate.
const SIM_UPLOAD_RATE: f64 = 1.5 * 1024.0 * 1024.0;

/// A pretend in-flight transfer for the attachments of a just-sent message.
struct UploadSim {
    file_name: String,
    total_bytes: u64,
    started: std::time::Instant,
}

impl UploadSim {
    fn sample(&self) -> UploadProgress {
        let sent = self.started.elapsed().as_secs_f64() * SIM_UPLOAD_RATE;
        let percent = if self.total_bytes == 0 {
            100.0
        } else {
            (sent / self.total_bytes as f64 * 100.0).min(100.0)
        };
        UploadProgress {
            file_name: self.file_name.clone(),
            percent,
            bytes_per_second: Some(SIM_UPLOAD_RATE),
            total_bytes: self.total_bytes,
        }
    }
}

/// Which input the compose area is capturing.
#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Compose,
    /// Typing a file path to attach.
    AttachPath,
}

/// Results of background attachment work, delivered to the UI loop.
enum AppEvent {
    AttachmentAdded {
        file_name: String,
        category: MediaCategory,
    },
    AttachmentRejected(String),
}

/// Application state
pub struct App {
    pub should_exit: bool,
    pub mode: InputMode,
    pub compose: ComposeState,
    pub attach_input: String,
    pub messages: Vec<ChatMessage>,
    pub recorder: RecorderSession,
    pub read_aloud: ReadAloud,
    /// Transient status/error line.
    pub notice: Option<String>,
    composer: MessageComposer,
    assistant: Assistant,
    auto_read: bool,
    upload: Option<UploadSim>,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    fn new(config: Config) -> Self {
        let store = AttachmentStore::new(FileValidator::new(config.media.clone()));
        let read_aloud = ReadAloud::detect(config.voice.settings.clone());
        let auto_read = config.voice.enabled && config.voice.auto_read;

        let notice = if auto_read && !read_aloud.is_supported() {
            Some("Text-to-speech not supported on this system; read-aloud disabled".to_string())
        } else {
            None
        };

        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            should_exit: false,
            mode: InputMode::default(),
            compose: ComposeState::default(),
            attach_input: String::new(),
            messages: Vec::new(),
            recorder: RecorderSession::new(),
            read_aloud,
            notice,
            composer: MessageComposer::new(store),
            assistant: Assistant::new(),
            auto_read,
            upload: None,
            events_tx,
            events_rx,
        }
    }

    pub fn pending_attachments(&self) -> Vec<Attachment> {
        self.composer.store().snapshot()
    }

    /// Handle input events
    fn handle_events(&mut self) -> Result<()> {
        if event::poll(Duration::from_millis(FRAME_DURATION_MS))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match self.mode {
                    InputMode::Compose => self.handle_compose_key(key),
                    InputMode::AttachPath => self.handle_attach_key(key),
                },
                Event::Resize(_, _) => {
                    // Handled on next draw.
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_compose_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                self.read_aloud.stop();
                self.should_exit = true;
            }
            KeyCode::Enter => self.send(),
            KeyCode::Char('r') if ctrl => self.toggle_recording(),
            KeyCode::Char('p') if ctrl => self.toggle_speech_pause(),
            KeyCode::Char('o') if ctrl => {
                self.mode = InputMode::AttachPath;
                self.attach_input.clear();
            }
            KeyCode::Char('x') if ctrl => {
                self.composer.store().remove_last();
            }
            KeyCode::Char('u') if ctrl => {
                self.compose.clear();
                self.composer.store().clear();
            }
            KeyCode::Char('v') if ctrl => self.read_last_reply(),
            KeyCode::Char(c) if !ctrl => self.compose.insert_char(c),
            KeyCode::Backspace => self.compose.backspace(),
            KeyCode::Delete => self.compose.delete(),
            KeyCode::Left => self.compose.move_left(),
            KeyCode::Right => self.compose.move_right(),
            KeyCode::Home => self.compose.move_home(),
            KeyCode::End => self.compose.move_end(),
            _ => {}
        }
    }

    fn handle_attach_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.mode = InputMode::Compose;
                self.attach_input.clear();
            }
            KeyCode::Enter => {
                let path = std::mem::take(&mut self.attach_input);
                self.mode = InputMode::Compose;
                if !path.trim().is_empty() {
                    self.spawn_attach(PathBuf::from(path.trim()));
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.attach_input.push(c);
            }
            KeyCode::Backspace => {
                self.attach_input.pop();
            }
            _ => {}
        }
    }

    /// Read the candidate and admit it to the store off the UI loop; image
    /// previews decode before the append lands.
    fn spawn_attach(&mut self, path: PathBuf) {
        let store = self.composer.store().clone();
        let tx = self.events_tx.clone();
        self.notice = Some(format!("Attaching {}...", path.display()));

        tokio::spawn(async move {
            let read = tokio::task::spawn_blocking(move || FileCandidate::read(&path)).await;
            let candidate = match read {
                Ok(Ok(c)) => c,
                Ok(Err(e)) => {
                    let _ = tx.send(AppEvent::AttachmentRejected(format!("{:#}", e)));
                    return;
                }
                Err(e) => {
                    let _ = tx.send(AppEvent::AttachmentRejected(e.to_string()));
                    return;
                }
            };

            let file_name = candidate.file_name.clone();
            match store.add(candidate).await {
                Ok(category) => {
                    let _ = tx.send(AppEvent::AttachmentAdded {
                        file_name,
                        category,
                    });
                }
                Err(e) => {
                    let _ = tx.send(AppEvent::AttachmentRejected(e.to_string()));
                }
            }
        });
    }

    fn send(&mut self) {
        let text = self.compose.take();
        match self.composer.try_send(&text, &mut self.assistant) {
            Some(outgoing) => {
                let reply = self.assistant.respond(&outgoing);
                if let Some(first) = outgoing.attachments.first() {
                    self.upload = Some(UploadSim {
                        file_name: first.file_name.clone(),
                        total_bytes: outgoing.attachments.iter().map(|a| a.size).sum(),
                        started: std::time::Instant::now(),
                    });
                }
                self.messages.push(ChatMessage::from_outgoing(outgoing));
                self.notice = None;
                if self.auto_read && self.read_aloud.is_supported() {
                    if let Err(e) = self.read_aloud.speak(&reply.text) {
                        self.notice = Some(e.to_string());
                    }
                }
                self.messages.push(reply);
            }
            None => {
                // Nothing to send; put the text back untouched.
                self.compose.input = text;
                self.compose.move_end();
            }
        }
    }

    fn toggle_recording(&mut self) {
        if self.recorder.is_recording() {
            match self.recorder.stop() {
                Some(attachment) => {
                    let name = attachment.file_name.clone();
                    match self.composer.store().add_attachment(attachment) {
                        Ok(()) => self.notice = Some(format!("Recorded {}", name)),
                        Err(e) => self.notice = Some(e.to_string()),
                    }
                }
                None => self.notice = Some("Recording discarded (no audio captured)".to_string()),
            }
            return;
        }

        #[cfg(feature = "audio")]
        {
            use crate::media::capture::SystemMicrophone;
            match self.recorder.start(&SystemMicrophone) {
                Ok(()) => self.notice = None,
                Err(e) => self.notice = Some(e.to_string()),
            }
        }
        #[cfg(not(feature = "audio"))]
        {
            self.notice =
                Some("Voice recording requires a build with the `audio` feature".to_string());
        }
    }

    /// Pause a reply being read aloud, or resume a paused one.
    fn toggle_speech_pause(&mut self) {
        use crate::speech::ReadAloudState;
        let result = match self.read_aloud.state() {
            ReadAloudState::Speaking => self.read_aloud.pause(),
            ReadAloudState::Paused => self.read_aloud.resume(),
            ReadAloudState::Idle => return,
        };
        if let Err(e) = result {
            self.notice = Some(e.to_string());
        }
    }

    fn read_last_reply(&mut self) {
        use crate::models::message::Sender;
        let Some(last) = self
            .messages
            .iter()
            .rev()
            .find(|m| m.sender == Sender::Assistant)
        else {
            return;
        };
        let text = last.text.clone();
        if let Err(e) = self.read_aloud.speak(&text) {
            self.notice = Some(e.to_string());
        }
    }

    /// Per-frame upkeep: drain capture frames, advance the upload display,
    /// and collect background task results.
    fn tick(&mut self) {
        self.recorder.poll();

        if let Some(sim) = &self.upload {
            let progress = sim.sample();
            if progress.is_complete() {
                self.notice = Some(format!("\u{2713} {} uploaded", progress.file_name));
                self.upload = None;
            } else {
                let eta = progress
                    .time_remaining()
                    .map(|t| format!(" \u{00B7} {} remaining", t))
                    .unwrap_or_default();
                self.notice = Some(format!(
                    "Uploading {} ({}) \u{00B7} {:.0}% \u{00B7} {}{}",
                    progress.file_name,
                    progress.size_label(),
                    progress.percent,
                    progress.speed_label(),
                    eta
                ));
            }
        }

        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                AppEvent::AttachmentAdded {
                    file_name,
                    category,
                } => {
                    self.notice = Some(format!("Attached {} ({})", file_name, category.as_str()));
                }
                AppEvent::AttachmentRejected(reason) => {
                    self.notice = Some(reason);
                }
            }
        }
    }

    fn render(&self, frame: &mut ratatui::Frame) {
        ui::render(frame, self);
    }
}

/// Run the TUI application, restoring the terminal on the way out.
pub async fn run(config: Config) -> Result<()> {
    let mut terminal = ratatui::init();
    let result = run_app(&mut terminal, config).await;
    ratatui::restore();
    result
}

async fn run_app(terminal: &mut DefaultTerminal, config: Config) -> Result<()> {
    let mut app = App::new(config);

    while !app.should_exit {
        app.tick();
        terminal.draw(|frame| app.render(frame))?;
        app.handle_events()?;
    }

    Ok(())
}
