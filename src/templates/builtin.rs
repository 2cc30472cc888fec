use crate::types::Template;

use super::parser::{leading_instructions, parse_sections};

/// A built-in template as authored: metadata plus one flat markdown prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinTemplate {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub prompt: &'static str,
}

/// All built-in templates in display order.
pub const BUILTIN_TEMPLATES: &[BuiltinTemplate] = &[
    BuiltinTemplate {
        id: "system-soap",
        title: "SOAP Note",
        description: "Standard Subjective / Objective / Assessment / Plan note for a clinic visit.",
        prompt: include_str!("builtin/soap.md"),
    },
    BuiltinTemplate {
        id: "system-follow-up",
        title: "Follow-up Visit",
        description: "Short progress note focused on changes since the last visit.",
        prompt: include_str!("builtin/follow_up.md"),
    },
    BuiltinTemplate {
        id: "system-consultation",
        title: "Consultation Letter",
        description: "Specialist reply letter to the referring clinician.",
        prompt: include_str!("builtin/consultation.md"),
    },
    BuiltinTemplate {
        id: "system-therapy-session",
        title: "Therapy Session",
        description: "Psychotherapy progress note with risk assessment.",
        prompt: include_str!("builtin/therapy_session.md"),
    },
];

impl BuiltinTemplate {
    /// Structure the flat prompt into a read-only system [`Template`].
    pub fn to_template(&self, now: i64) -> Template {
        Template {
            id: self.id.to_string(),
            is_system: true,
            title: self.title.to_string(),
            description: self.description.to_string(),
            general_instructions: leading_instructions(self.prompt).to_string(),
            sections: parse_sections(self.prompt),
            created_at: now,
            updated_at: now,
        }
    }
}
