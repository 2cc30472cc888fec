use crate::scheduler::Persisted;
use crate::types::Note;

use super::{DbError, Row, SqlValue};

pub const SELECT_ALL: &str = "SELECT id, title, subjective, objective, assessment, plan,
            transcription, template_id, created_at, updated_at
     FROM notes
     ORDER BY updated_at DESC";

pub const INSERT: &str = "INSERT INTO notes (id, title, subjective, objective, assessment, plan,
            transcription, template_id, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";

pub const UPDATE: &str = "UPDATE notes
     SET title = ?2, subjective = ?3, objective = ?4, assessment = ?5, plan = ?6,
         transcription = ?7, template_id = ?8, updated_at = ?9
     WHERE id = ?1";

pub const DELETE: &str = "DELETE FROM notes WHERE id = ?1";

/// Bind every column in table order for INSERT.
pub fn note_params(note: &Note) -> Vec<SqlValue> {
    let mut params = update_params(note);
    params.insert(8, SqlValue::Integer(note.created_at));
    params
}

/// Everything but `created_at`, which never changes after insert.
fn update_params(note: &Note) -> Vec<SqlValue> {
    vec![
        SqlValue::Text(note.id.clone()),
        SqlValue::Text(note.title.clone()),
        SqlValue::Text(note.subjective.clone()),
        SqlValue::Text(note.objective.clone()),
        SqlValue::Text(note.assessment.clone()),
        SqlValue::Text(note.plan.clone()),
        SqlValue::Text(note.transcription.clone()),
        note.template_id
            .clone()
            .map(SqlValue::Text)
            .unwrap_or(SqlValue::Null),
        SqlValue::Integer(note.updated_at),
    ]
}

pub fn note_from_row(row: &Row) -> Result<Note, DbError> {
    Ok(Note {
        id: row.text("id")?,
        title: row.text("title")?,
        subjective: row.text("subjective")?,
        objective: row.text("objective")?,
        assessment: row.text("assessment")?,
        plan: row.text("plan")?,
        transcription: row.text("transcription")?,
        template_id: row.opt_text("template_id")?,
        created_at: row.integer("created_at")?,
        updated_at: row.integer("updated_at")?,
    })
}

impl Persisted for Note {
    fn id(&self) -> &str {
        &self.id
    }

    fn save_statement(&self) -> (&'static str, Vec<SqlValue>) {
        (UPDATE, update_params(self))
    }
}
