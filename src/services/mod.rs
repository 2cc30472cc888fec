//! In-memory entity stores backed by the durable store.
//!
//! Each store owns its entities plus the current selection behind one mutex.
//! Structural changes (create, delete) hit the database first and only touch
//! memory once the write succeeded. Field edits apply to memory at once and
//! are persisted through the store's [`SaveScheduler`](crate::scheduler::SaveScheduler).

pub mod generation;
pub mod notes;
pub mod templates;

pub use generation::{prompt_for_note, GenerationError};
pub use notes::NotesStore;
pub use templates::TemplatesStore;

/// Which entity to select after the one at `removed_index` was deleted from
/// `remaining`: whatever now occupies that index, else the new last entity,
/// else nothing.
pub(crate) fn selection_after_delete<T>(
    remaining: &[T],
    removed_index: usize,
    id_of: impl Fn(&T) -> &str,
) -> Option<String> {
    remaining
        .get(removed_index)
        .or_else(|| remaining.last())
        .map(|entity| id_of(entity).to_string())
}
