//! Application-level errors
//!
//! Errors are classified by recoverability:
//! - Retryable: database busy/IO, speech engine hiccups
//! - NonRetryable: bad input such as a note with no transcript
//! - RequiresUserAction: broken config file, nothing to generate with

use thiserror::Error;

use crate::db::DbError;
use crate::services::GenerationError;
use crate::transcription::TranscriptionError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Store(#[from] DbError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Transcription(#[from] TranscriptionError),

    #[error("No async runtime: {0}")]
    Runtime(String),
}

impl AppError {
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Store(e) => matches!(e, DbError::Sqlite(_) | DbError::Connection(_)),
            AppError::Transcription(e) => e.is_retryable(),
            AppError::Config(_) | AppError::Generation(_) | AppError::Runtime(_) => false,
        }
    }

    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            AppError::Config(_)
                | AppError::Store(DbError::HomeDirNotFound)
                | AppError::Store(DbError::CreateDir(_))
                | AppError::Generation(GenerationError::NoTemplate(_))
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AppError::Store(DbError::HomeDirNotFound) | AppError::Store(DbError::CreateDir(_)) => {
                "Set databasePath in ~/.chartnote/config.json to a writable location."
            }
            AppError::Store(_) => "Try again. Your edits are kept in memory.",
            AppError::Config(_) => "Fix or remove ~/.chartnote/config.json.",
            AppError::Generation(GenerationError::EmptyTranscription(_)) => {
                "Dictate or paste a transcript first."
            }
            AppError::Generation(GenerationError::NoTemplate(_)) => {
                "Create a template or restore the built-in ones."
            }
            AppError::Generation(GenerationError::NoteNotFound(_)) => "Select a note and retry.",
            AppError::Transcription(TranscriptionError::Model(_)) => {
                "Check your connection so the speech model can download."
            }
            AppError::Transcription(_) => "Try recording again.",
            AppError::Runtime(_) => "Start the core from inside a tokio runtime.",
        }
    }
}

/// Serializable error representation for IPC
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub message: String,
    pub error_type: ErrorType,
    pub can_retry: bool,
    pub recovery_suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorType {
    Retryable,
    NonRetryable,
    RequiresUserAction,
}

impl From<&AppError> for ErrorPayload {
    fn from(err: &AppError) -> Self {
        let error_type = if err.requires_user_action() {
            ErrorType::RequiresUserAction
        } else if err.is_retryable() {
            ErrorType::Retryable
        } else {
            ErrorType::NonRetryable
        };

        ErrorPayload {
            message: err.to_string(),
            error_type,
            can_retry: err.is_retryable(),
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}
