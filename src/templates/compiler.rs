//! Template → prompt compilation.
//!
//! The compiled prompt has a fixed shape:
//!
//! ```text
//! <general instructions>          (omitted when empty)
//!
//! <SECTIONS_INTRO>
//!
//! ## <section title>
//! <style directive>               (omitted for Auto)
//! <detail directive>              (omitted for Normal)
//! <instructions>                  (omitted when empty)
//!
//! ## <next section> ...
//!
//! ---
//!
//! TRANSCRIPT:
//!
//! <transcript>
//! ```
//!
//! No length limit is applied here; truncation belongs to the caller that
//! talks to the model.

use crate::types::{DetailLevel, SectionStyle, Template, TemplateSection};

pub const SECTIONS_INTRO: &str =
    "Structure the clinical note using the following sections, in this order:";
pub const SEPARATOR: &str = "---";
pub const TRANSCRIPT_LABEL: &str = "TRANSCRIPT:";

fn style_directive(style: SectionStyle) -> Option<&'static str> {
    match style {
        SectionStyle::Auto => None,
        SectionStyle::BulletList => Some("Format: bullet points"),
        SectionStyle::Paragraph => Some("Format: prose paragraphs"),
    }
}

fn detail_directive(detail: DetailLevel) -> Option<&'static str> {
    match detail {
        DetailLevel::Normal => None,
        DetailLevel::High => Some("Detail level: high (be thorough and comprehensive)"),
    }
}

/// One section's lines joined by single newlines.
pub fn compile_section(section: &TemplateSection) -> String {
    let mut lines = vec![format!("## {}", section.title.trim())];
    lines.extend(style_directive(section.style).map(String::from));
    lines.extend(detail_directive(section.detail).map(String::from));

    let instructions = section.instructions.trim();
    if !instructions.is_empty() {
        lines.push(instructions.to_string());
    }

    lines.join("\n")
}

/// All sections in order, separated by a blank line.
pub fn compile_sections(sections: &[TemplateSection]) -> String {
    sections
        .iter()
        .map(compile_section)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the full generation prompt for `transcript` under `template`.
pub fn compile(transcript: &str, template: &Template) -> String {
    let mut parts: Vec<String> = Vec::new();

    let general = template.general_instructions.trim();
    if !general.is_empty() {
        parts.push(general.to_string());
    }

    parts.push(SECTIONS_INTRO.to_string());

    let sections = compile_sections(&template.sections);
    if !sections.is_empty() {
        parts.push(sections);
    }

    parts.push(SEPARATOR.to_string());
    parts.push(TRANSCRIPT_LABEL.to_string());
    parts.push(transcript.trim().to_string());

    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(
        title: &str,
        style: SectionStyle,
        detail: DetailLevel,
        instructions: &str,
    ) -> TemplateSection {
        TemplateSection {
            id: format!("id-{}", title),
            title: title.to_string(),
            style,
            detail,
            instructions: instructions.to_string(),
        }
    }

    fn template_with(sections: Vec<TemplateSection>) -> Template {
        let mut template = Template::user("t1", "Test", 0);
        template.sections = sections;
        template
    }

    #[test]
    fn test_compile_orders_header_instructions_transcript() {
        let template = template_with(vec![section(
            "Subjective",
            SectionStyle::Paragraph,
            DetailLevel::Normal,
            "do X",
        )]);
        let prompt = compile("hello", &template);

        let header = prompt.find("## Subjective").expect("header present");
        let body = prompt.find("do X").expect("instructions present");
        let transcript = prompt.find("TRANSCRIPT:\n\nhello").expect("transcript present");
        assert!(header < body);
        assert!(body < transcript);
    }

    #[test]
    fn test_compile_exact_shape() {
        let mut template = template_with(vec![
            section("Subjective", SectionStyle::Paragraph, DetailLevel::Normal, "  History  "),
            section("Plan", SectionStyle::BulletList, DetailLevel::High, ""),
        ]);
        template.general_instructions = "  Be concise. ".into();

        let prompt = compile("  patient says hi \n", &template);
        let expected = [
            "Be concise.",
            SECTIONS_INTRO,
            "## Subjective\nFormat: prose paragraphs\nHistory\n\n## Plan\nFormat: bullet points\nDetail level: high (be thorough and comprehensive)",
            SEPARATOR,
            TRANSCRIPT_LABEL,
            "patient says hi",
        ]
        .join("\n\n");
        assert_eq!(prompt, expected);
    }

    #[test]
    fn test_auto_style_and_normal_detail_emit_no_directives() {
        let compiled = compile_section(&section(
            "Assessment",
            SectionStyle::Auto,
            DetailLevel::Normal,
            "Diagnosis",
        ));
        assert_eq!(compiled, "## Assessment\nDiagnosis");
    }

    #[test]
    fn test_header_only_section() {
        let compiled = compile_section(&section(
            "Plan",
            SectionStyle::Auto,
            DetailLevel::Normal,
            "   ",
        ));
        assert_eq!(compiled, "## Plan");
    }

    #[test]
    fn test_empty_general_instructions_are_omitted() {
        let template = template_with(vec![section(
            "A",
            SectionStyle::Auto,
            DetailLevel::Normal,
            "",
        )]);
        let prompt = compile("t", &template);
        assert!(prompt.starts_with(SECTIONS_INTRO));
    }

    #[test]
    fn test_template_without_sections() {
        let prompt = compile("words", &template_with(Vec::new()));
        assert_eq!(
            prompt,
            format!("{}\n\n---\n\nTRANSCRIPT:\n\nwords", SECTIONS_INTRO)
        );
    }

    #[test]
    fn test_section_order_is_preserved() {
        let template = template_with(vec![
            section("Plan", SectionStyle::Auto, DetailLevel::Normal, ""),
            section("Subjective", SectionStyle::Auto, DetailLevel::Normal, ""),
        ]);
        let prompt = compile("", &template);
        assert!(prompt.find("## Plan").unwrap() < prompt.find("## Subjective").unwrap());
    }

    #[test]
    fn test_parsed_prompt_compiles_back_to_same_headers() {
        let flat = "Intro.\n\n## History\nAsk about onset.\n\n## Plan\n- a\n- b\n- c\n- d\n";
        let mut template = template_with(crate::templates::parser::parse_sections(flat));
        template.general_instructions =
            crate::templates::parser::leading_instructions(flat).to_string();

        let prompt = compile("x", &template);
        assert!(prompt.starts_with("Intro."));
        assert!(prompt.contains("## History\nFormat: prose paragraphs\nAsk about onset."));
        assert!(prompt.contains("## Plan\nFormat: bullet points\n- a\n- b\n- c\n- d"));
    }
}
