//! Domain types shared by the stores, the template compiler and the
//! embedding UI. Field names serialize in camelCase.

use serde::{Deserialize, Serialize};

/// Application configuration loaded from `~/.chartnote/config.json`.
///
/// Every field is defaulted so a partial (or absent) file still yields a
/// usable config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Override for the SQLite file. Defaults to `~/.chartnote/chartnote.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<String>,
    /// Quiet period before a field edit is written to disk.
    #[serde(default = "default_save_debounce_ms")]
    pub save_debounce_ms: u64,
    /// Template used for generation when a note has no template reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_template_id: Option<String>,
    /// ISO 639-1 code handed to the speech-to-text engine. `None` = auto-detect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription_language: Option<String>,
}

fn default_save_debounce_ms() -> u64 {
    500
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            save_debounce_ms: default_save_debounce_ms(),
            default_template_id: None,
            transcription_language: None,
        }
    }
}

/// A clinical note in SOAP layout plus its raw dictation transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub subjective: String,
    pub objective: String,
    pub assessment: String,
    pub plan: String,
    pub transcription: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds, never decreases.
    pub updated_at: i64,
}

impl Note {
    /// A blank note stamped at `now`.
    pub fn blank(id: impl Into<String>, now: i64) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            subjective: String::new(),
            objective: String::new(),
            assessment: String::new(),
            plan: String::new(),
            transcription: String::new(),
            template_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn field_mut(&mut self, field: NoteField) -> &mut String {
        match field {
            NoteField::Subjective => &mut self.subjective,
            NoteField::Objective => &mut self.objective,
            NoteField::Assessment => &mut self.assessment,
            NoteField::Plan => &mut self.plan,
            NoteField::Transcription => &mut self.transcription,
        }
    }

    /// Refresh `updated_at`, clamping so it never moves backwards.
    pub fn touch(&mut self, now: i64) {
        self.updated_at = self.updated_at.max(now);
    }
}

/// Free-text fields of a [`Note`] addressable by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteField {
    Subjective,
    Objective,
    Assessment,
    Plan,
    Transcription,
}

/// How a section's content should be laid out in the generated note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionStyle {
    /// Let the model decide. Only ever set by a user edit.
    #[default]
    Auto,
    BulletList,
    Paragraph,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DetailLevel {
    #[default]
    Normal,
    High,
}

/// One named block of instructions inside a [`Template`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSection {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub style: SectionStyle,
    #[serde(default)]
    pub detail: DetailLevel,
    #[serde(default)]
    pub instructions: String,
}

impl TemplateSection {
    /// A new section with a fresh id, Paragraph style and Normal detail.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            style: SectionStyle::Paragraph,
            detail: DetailLevel::Normal,
            instructions: String::new(),
        }
    }
}

/// Partial update applied by `TemplatesStore::update_section`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<SectionStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<DetailLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl SectionPatch {
    pub fn apply(self, section: &mut TemplateSection) {
        if let Some(title) = self.title {
            section.title = title;
        }
        if let Some(style) = self.style {
            section.style = style;
        }
        if let Some(detail) = self.detail {
            section.detail = detail;
        }
        if let Some(instructions) = self.instructions {
            section.instructions = instructions;
        }
    }
}

/// A note template: general instructions plus an ordered list of sections.
///
/// System templates are seeded once and never modified afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub is_system: bool,
    pub title: String,
    pub description: String,
    pub general_instructions: String,
    pub sections: Vec<TemplateSection>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Template {
    /// An empty user-defined template stamped at `now`.
    pub fn user(id: impl Into<String>, title: impl Into<String>, now: i64) -> Self {
        Self {
            id: id.into(),
            is_system: false,
            title: title.into(),
            description: String::new(),
            general_instructions: String::new(),
            sections: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self, now: i64) {
        self.updated_at = self.updated_at.max(now);
    }

    pub fn section_index(&self, section_id: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.id == section_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_empty_json() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.save_debounce_ms, 500);
    }

    #[test]
    fn test_config_camel_case_fields() {
        let config: Config = serde_json::from_str(
            r#"{"databasePath": "/tmp/x.db", "saveDebounceMs": 250, "defaultTemplateId": "system-soap"}"#,
        )
        .unwrap();
        assert_eq!(config.database_path.as_deref(), Some("/tmp/x.db"));
        assert_eq!(config.save_debounce_ms, 250);
        assert_eq!(config.default_template_id.as_deref(), Some("system-soap"));
    }

    #[test]
    fn test_blank_note_timestamps_equal() {
        let note = Note::blank("n1", 1_000);
        assert_eq!(note.created_at, 1_000);
        assert_eq!(note.updated_at, 1_000);
        assert!(note.title.is_empty());
        assert!(note.template_id.is_none());
    }

    #[test]
    fn test_touch_never_moves_backwards() {
        let mut note = Note::blank("n1", 5_000);
        note.touch(4_000);
        assert_eq!(note.updated_at, 5_000);
        note.touch(6_000);
        assert_eq!(note.updated_at, 6_000);
    }

    #[test]
    fn test_note_field_uses_lowercase_names() {
        assert_eq!(
            serde_json::to_value(NoteField::Subjective).unwrap(),
            "subjective"
        );
        assert_eq!(
            serde_json::to_value(NoteField::Transcription).unwrap(),
            "transcription"
        );

        let fields: Vec<NoteField> =
            serde_json::from_str(r#"["objective", "assessment", "plan"]"#).unwrap();
        assert_eq!(
            fields,
            vec![NoteField::Objective, NoteField::Assessment, NoteField::Plan]
        );
        assert!(serde_json::from_str::<NoteField>(r#""Subjective""#).is_err());
    }

    #[test]
    fn test_section_serializes_camel_case_enums() {
        let section = TemplateSection {
            id: "s1".into(),
            title: "Plan".into(),
            style: SectionStyle::BulletList,
            detail: DetailLevel::High,
            instructions: "List next steps".into(),
        };
        let json = serde_json::to_value(&section).unwrap();
        assert_eq!(json["style"], "bulletList");
        assert_eq!(json["detail"], "high");
    }

    #[test]
    fn test_section_missing_style_defaults_to_auto() {
        let section: TemplateSection =
            serde_json::from_str(r#"{"id": "s1", "title": "Plan"}"#).unwrap();
        assert_eq!(section.style, SectionStyle::Auto);
        assert_eq!(section.detail, DetailLevel::Normal);
        assert!(section.instructions.is_empty());
    }

    #[test]
    fn test_section_patch_only_touches_given_fields() {
        let mut section = TemplateSection::new("Assessment");
        section.instructions = "keep".into();
        SectionPatch {
            style: Some(SectionStyle::BulletList),
            ..SectionPatch::default()
        }
        .apply(&mut section);
        assert_eq!(section.title, "Assessment");
        assert_eq!(section.style, SectionStyle::BulletList);
        assert_eq!(section.instructions, "keep");
    }
}
