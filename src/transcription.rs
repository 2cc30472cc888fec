//! Dictation: audio capture and speech-to-text collaborators, and the
//! session that feeds their output into a note.
//!
//! Capture and recognition live outside this crate behind [`Recorder`] and
//! [`SpeechToText`]. Recorded audio is ephemeral: the file is removed after
//! transcription whether or not it succeeded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use crate::notification::{notify_error, notify_transcription_complete, Notifier};
use crate::services::NotesStore;

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("Already recording")]
    AlreadyRecording,

    #[error("Not recording")]
    NotRecording,

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Audio capture failed: {0}")]
    Capture(String),

    #[error("Speech model unavailable: {0}")]
    Model(String),

    #[error("Speech-to-text failed: {0}")]
    Engine(String),
}

impl TranscriptionError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TranscriptionError::Capture(_)
                | TranscriptionError::Model(_)
                | TranscriptionError::Engine(_)
        )
    }
}

/// One-time speech model download progress, 0 to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadProgress {
    pub percent: u8,
}

#[async_trait]
pub trait Recorder: Send + Sync {
    async fn start_recording(&self) -> Result<(), TranscriptionError>;

    /// Stop and return the path of the recorded 16 kHz mono WAV file.
    async fn stop_recording(&self) -> Result<PathBuf, TranscriptionError>;
}

#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe `audio` and delete it. `language` is an ISO 639-1 code,
    /// `None` to auto-detect.
    async fn transcribe_and_delete(
        &self,
        audio: &Path,
        language: Option<&str>,
        progress: UnboundedSender<DownloadProgress>,
    ) -> Result<String, TranscriptionError>;
}

/// Records dictation for one note at a time and appends the recognised text
/// to that note's transcription.
pub struct DictationSession {
    recorder: Arc<dyn Recorder>,
    engine: Arc<dyn SpeechToText>,
    notes: Arc<NotesStore>,
    notifier: Arc<dyn Notifier>,
    language: Option<String>,
    phase: Mutex<Phase>,
}

/// Recording state. Every transition happens under the `phase` lock, and the
/// in-between states keep a second caller out while the device call awaits.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Idle,
    Starting(String),
    Recording(String),
    Stopping(String),
}

impl Phase {
    fn note_id(&self) -> Option<&str> {
        match self {
            Phase::Idle => None,
            Phase::Starting(id) | Phase::Recording(id) | Phase::Stopping(id) => Some(id),
        }
    }
}

impl DictationSession {
    pub fn new(
        recorder: Arc<dyn Recorder>,
        engine: Arc<dyn SpeechToText>,
        notes: Arc<NotesStore>,
        notifier: Arc<dyn Notifier>,
        language: Option<String>,
    ) -> Self {
        Self {
            recorder,
            engine,
            notes,
            notifier,
            language,
            phase: Mutex::new(Phase::Idle),
        }
    }

    /// Note being dictated into, from the moment `start` claims it until
    /// `finish` has stopped the recorder.
    pub fn active_note(&self) -> Option<String> {
        self.phase.lock().note_id().map(String::from)
    }

    pub async fn start(&self, note_id: &str) -> Result<(), TranscriptionError> {
        {
            let mut phase = self.phase.lock();
            if *phase != Phase::Idle {
                return Err(TranscriptionError::AlreadyRecording);
            }
            if self.notes.get(note_id).is_none() {
                return Err(TranscriptionError::NoteNotFound(note_id.to_string()));
            }
            *phase = Phase::Starting(note_id.to_string());
        }

        if let Err(e) = self.recorder.start_recording().await {
            *self.phase.lock() = Phase::Idle;
            return Err(e);
        }
        *self.phase.lock() = Phase::Recording(note_id.to_string());
        log::info!("Dictation started for note {}", note_id);
        Ok(())
    }

    /// Stop recording, transcribe, and append the text to the note.
    ///
    /// Failures are reported through the notifier and returned; nothing is
    /// retried. Returns the recognised text (empty when no speech was found).
    pub async fn finish(
        &self,
        progress: UnboundedSender<DownloadProgress>,
    ) -> Result<String, TranscriptionError> {
        let result = self.finish_inner(progress).await;
        if let Err(e) = &result {
            notify_error(self.notifier.as_ref(), "Transcription failed", &e.to_string());
        }
        result
    }

    async fn finish_inner(
        &self,
        progress: UnboundedSender<DownloadProgress>,
    ) -> Result<String, TranscriptionError> {
        let note_id = {
            let mut phase = self.phase.lock();
            let Phase::Recording(id) = &*phase else {
                return Err(TranscriptionError::NotRecording);
            };
            let id = id.clone();
            *phase = Phase::Stopping(id.clone());
            id
        };

        let audio = match self.recorder.stop_recording().await {
            Ok(audio) => audio,
            Err(e) => {
                // The device may still be capturing; keep the session armed.
                *self.phase.lock() = Phase::Recording(note_id);
                return Err(e);
            }
        };
        *self.phase.lock() = Phase::Idle;
        log::info!(
            "Transcribing dictation for note {} (language: {})",
            note_id,
            self.language.as_deref().unwrap_or("auto")
        );

        let transcribed = self
            .engine
            .transcribe_and_delete(&audio, self.language.as_deref(), progress)
            .await;
        remove_leftover_audio(&audio).await;
        let text = transcribed?;

        let text = text.trim();
        if text.is_empty() {
            log::info!("No speech detected for note {}", note_id);
            return Ok(String::new());
        }
        if !self.notes.append_transcription(&note_id, text) {
            return Err(TranscriptionError::NoteNotFound(note_id));
        }

        notify_transcription_complete(self.notifier.as_ref(), text.split_whitespace().count());
        Ok(text.to_string())
    }
}

/// Delete the recording if the engine did not.
async fn remove_leftover_audio(path: &Path) {
    match tokio::fs::try_exists(path).await {
        Ok(true) => match tokio::fs::remove_file(path).await {
            Ok(()) => log::info!("Deleted ephemeral audio: {}", path.display()),
            Err(e) => log::warn!("Failed to delete audio file {}: {}", path.display(), e),
        },
        Ok(false) => {}
        Err(e) => log::warn!("Could not check audio file {}: {}", path.display(), e),
    }
}
