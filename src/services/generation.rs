//! Prompt assembly for note generation.
//!
//! Picks the template a note should be generated with and compiles the
//! note's transcript under it. Invoking the model is the caller's job.

use thiserror::Error;

use crate::templates::compile;
use crate::types::Template;

use super::{NotesStore, TemplatesStore};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("No template available for note {0}")]
    NoTemplate(String),

    #[error("Note {0} has no transcription yet")]
    EmptyTranscription(String),
}

/// Template for a note: its own reference, then `fallback_template_id`, then
/// the first system template. References to missing templates are skipped.
pub fn resolve_template(
    templates: &TemplatesStore,
    template_id: Option<&str>,
    fallback_template_id: Option<&str>,
) -> Option<Template> {
    [template_id, fallback_template_id]
        .into_iter()
        .flatten()
        .find_map(|id| {
            let found = templates.get(id);
            if found.is_none() {
                log::warn!("Template {} referenced but not loaded, falling back", id);
            }
            found
        })
        .or_else(|| templates.first_system())
}

/// Compile the generation prompt for `note_id`.
pub fn prompt_for_note(
    notes: &NotesStore,
    templates: &TemplatesStore,
    note_id: &str,
    fallback_template_id: Option<&str>,
) -> Result<String, GenerationError> {
    let note = notes
        .get(note_id)
        .ok_or_else(|| GenerationError::NoteNotFound(note_id.to_string()))?;

    if note.transcription.trim().is_empty() {
        return Err(GenerationError::EmptyTranscription(note_id.to_string()));
    }

    let template = resolve_template(templates, note.template_id.as_deref(), fallback_template_id)
        .ok_or_else(|| GenerationError::NoTemplate(note_id.to_string()))?;

    log::debug!("Compiling note {} with template {}", note_id, template.id);
    Ok(compile(&note.transcription, &template))
}
