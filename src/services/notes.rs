//! Notes store: the editor's list of notes, the selected note, and their
//! persistence.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;

use crate::db::{notes, DbError, SqlValue, StoreHandle};
use crate::scheduler::SaveScheduler;
use crate::types::{Note, NoteField};
use crate::util::{new_id, now_ms};

use super::selection_after_delete;

#[derive(Default)]
struct NotesState {
    /// Display order: most recently updated first as of the last load,
    /// new notes prepended.
    notes: Vec<Note>,
    selected: Option<String>,
}

pub struct NotesStore {
    store: Arc<dyn StoreHandle>,
    state: Mutex<NotesState>,
    saves: SaveScheduler<Note>,
}

impl NotesStore {
    pub fn new(store: Arc<dyn StoreHandle>, save_delay: Duration, runtime: Handle) -> Self {
        Self {
            saves: SaveScheduler::new(Arc::clone(&store), save_delay, runtime),
            store,
            state: Mutex::new(NotesState::default()),
        }
    }

    /// Replace memory with every note in the database, newest first.
    ///
    /// On failure the store is left empty and the error returned. Rows that
    /// cannot be hydrated are skipped.
    pub async fn load(&self) -> Result<usize, DbError> {
        let rows = match self.store.select(notes::SELECT_ALL, Vec::new()).await {
            Ok(rows) => rows,
            Err(e) => {
                log::warn!("Failed to load notes: {}", e);
                *self.state.lock() = NotesState::default();
                return Err(e);
            }
        };

        let loaded: Vec<Note> = rows
            .iter()
            .filter_map(|row| match notes::note_from_row(row) {
                Ok(note) => Some(note),
                Err(e) => {
                    log::warn!("Skipping unreadable note row: {}", e);
                    None
                }
            })
            .collect();

        let count = loaded.len();
        *self.state.lock() = NotesState {
            notes: loaded,
            selected: None,
        };
        log::info!("Loaded {} notes", count);
        Ok(count)
    }

    /// Insert a blank note, then prepend and select it.
    pub async fn create(&self) -> Result<Note, DbError> {
        self.insert(Note::blank(new_id(), now_ms())).await
    }

    /// Like [`create`](Self::create) with the template reference preset.
    pub async fn create_from_template(&self, template_id: &str) -> Result<Note, DbError> {
        let mut note = Note::blank(new_id(), now_ms());
        note.template_id = Some(template_id.to_string());
        self.insert(note).await
    }

    async fn insert(&self, note: Note) -> Result<Note, DbError> {
        self.store
            .execute(notes::INSERT, notes::note_params(&note))
            .await?;

        let mut state = self.state.lock();
        state.notes.insert(0, note.clone());
        state.selected = Some(note.id.clone());
        log::info!("Created note {}", note.id);
        Ok(note)
    }

    /// Delete `id` from the database and from memory.
    ///
    /// Any pending save for the note is dropped before the DELETE is issued.
    /// If the DELETE fails, memory is left untouched. Returns whether the
    /// note was present in memory.
    pub async fn delete(&self, id: &str) -> Result<bool, DbError> {
        self.saves.cancel(id);
        self.store
            .execute(notes::DELETE, vec![SqlValue::Text(id.to_string())])
            .await?;
        // Edits made while the DELETE was in flight must not be written.
        self.saves.cancel(id);

        let mut state = self.state.lock();
        let Some(index) = state.notes.iter().position(|n| n.id == id) else {
            return Ok(false);
        };
        state.notes.remove(index);
        if state.selected.as_deref() == Some(id) {
            state.selected = selection_after_delete(&state.notes, index, |n| n.id.as_str());
        }
        log::info!("Deleted note {}", id);
        Ok(true)
    }

    /// Apply `edit` to note `id`, bump `updated_at` and schedule a save.
    fn mutate(&self, id: &str, edit: impl FnOnce(&mut Note)) -> bool {
        let snapshot = {
            let mut state = self.state.lock();
            let Some(note) = state.notes.iter_mut().find(|n| n.id == id) else {
                log::debug!("Ignoring edit for unknown note {}", id);
                return false;
            };
            edit(note);
            note.touch(now_ms());
            note.clone()
        };
        self.saves.schedule(snapshot);
        true
    }

    pub fn update_title(&self, id: &str, title: &str) -> bool {
        self.mutate(id, |note| note.title = title.to_string())
    }

    pub fn update_field(&self, id: &str, field: NoteField, value: &str) -> bool {
        self.mutate(id, |note| *note.field_mut(field) = value.to_string())
    }

    pub fn set_template(&self, id: &str, template_id: Option<&str>) -> bool {
        self.mutate(id, |note| note.template_id = template_id.map(String::from))
    }

    /// Append dictated `text` to the note's transcription, separated from
    /// existing text by a single space. Blank text is ignored.
    pub fn append_transcription(&self, id: &str, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.mutate(id, |note| {
            let existing = &mut note.transcription;
            if !existing.is_empty() && !existing.ends_with(char::is_whitespace) {
                existing.push(' ');
            }
            existing.push_str(text);
        })
    }

    /// Select `id`, or clear the selection with `None`. Selecting an unknown
    /// id is refused.
    pub fn select(&self, id: Option<&str>) -> bool {
        let mut state = self.state.lock();
        match id {
            None => {
                state.selected = None;
                true
            }
            Some(id) if state.notes.iter().any(|n| n.id == id) => {
                state.selected = Some(id.to_string());
                true
            }
            Some(_) => false,
        }
    }

    pub fn selected_id(&self) -> Option<String> {
        self.state.lock().selected.clone()
    }

    pub fn selected(&self) -> Option<Note> {
        let state = self.state.lock();
        let id = state.selected.as_deref()?;
        state.notes.iter().find(|n| n.id == id).cloned()
    }

    pub fn get(&self, id: &str) -> Option<Note> {
        self.state.lock().notes.iter().find(|n| n.id == id).cloned()
    }

    pub fn list(&self) -> Vec<Note> {
        self.state.lock().notes.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_pending_save(&self, id: &str) -> bool {
        self.saves.is_pending(id)
    }

    /// Write every pending edit now.
    pub async fn flush(&self) -> usize {
        self.saves.flush().await
    }
}
