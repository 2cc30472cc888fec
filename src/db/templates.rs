use crate::scheduler::Persisted;
use crate::types::{Template, TemplateSection};

use super::{DbError, Row, SqlValue};

pub const SELECT_ALL: &str = "SELECT id, is_system, title, description, general_instructions,
            sections, created_at, updated_at
     FROM templates
     ORDER BY is_system DESC, created_at ASC";

pub const COUNT_SYSTEM: &str = "SELECT COUNT(*) AS n FROM templates WHERE is_system = 1";

pub const INSERT: &str = "INSERT INTO templates (id, is_system, title, description,
            general_instructions, sections, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

/// Only user templates are ever rewritten; the guard keeps a stray write
/// from touching a seeded row.
pub const UPDATE: &str = "UPDATE templates
     SET title = ?2, description = ?3, general_instructions = ?4, sections = ?5,
         updated_at = ?6
     WHERE id = ?1 AND is_system = 0";

pub const DELETE: &str = "DELETE FROM templates WHERE id = ?1 AND is_system = 0";

/// Serialize the ordered section list for the `sections` column.
pub fn sections_json(sections: &[TemplateSection]) -> String {
    // Vec<TemplateSection> holds only strings and unit enums; serialization cannot fail.
    serde_json::to_string(sections).unwrap_or_else(|_| "[]".to_string())
}

pub fn template_params(template: &Template) -> Vec<SqlValue> {
    vec![
        SqlValue::Text(template.id.clone()),
        SqlValue::Integer(i64::from(template.is_system)),
        SqlValue::Text(template.title.clone()),
        SqlValue::Text(template.description.clone()),
        SqlValue::Text(template.general_instructions.clone()),
        SqlValue::Text(sections_json(&template.sections)),
        SqlValue::Integer(template.created_at),
        SqlValue::Integer(template.updated_at),
    ]
}

fn update_params(template: &Template) -> Vec<SqlValue> {
    vec![
        SqlValue::Text(template.id.clone()),
        SqlValue::Text(template.title.clone()),
        SqlValue::Text(template.description.clone()),
        SqlValue::Text(template.general_instructions.clone()),
        SqlValue::Text(sections_json(&template.sections)),
        SqlValue::Integer(template.updated_at),
    ]
}

/// Hydrate a template row.
///
/// A `sections` blob that fails to parse yields an empty section list
/// instead of failing the row; the template stays usable and editable.
pub fn template_from_row(row: &Row) -> Result<Template, DbError> {
    let id = row.text("id")?;
    let raw_sections = row.text("sections")?;
    let sections = match serde_json::from_str::<Vec<TemplateSection>>(&raw_sections) {
        Ok(sections) => sections,
        Err(e) => {
            log::warn!("Template {}: unreadable sections blob ({}), loading empty", id, e);
            Vec::new()
        }
    };

    Ok(Template {
        id,
        is_system: row.integer("is_system")? != 0,
        title: row.text("title")?,
        description: row.text("description")?,
        general_instructions: row.text("general_instructions")?,
        sections,
        created_at: row.integer("created_at")?,
        updated_at: row.integer("updated_at")?,
    })
}

impl Persisted for Template {
    fn id(&self) -> &str {
        &self.id
    }

    fn save_statement(&self) -> (&'static str, Vec<SqlValue>) {
        (UPDATE, update_params(self))
    }
}
