//! Legacy flat-prompt parser.
//!
//! Built-in templates are authored as a single markdown prompt with one
//! `## Title` line per section. Seeding turns that text into structured
//! [`TemplateSection`]s with a two-pass scan: the first pass records where
//! every header line sits, the second slices each section body as the
//! half-open range between the end of its header line and the start of the
//! next one.

use crate::types::{DetailLevel, SectionStyle, TemplateSection};

/// A section is treated as a bullet list once it has more than this many
/// lines starting with `- `.
pub const BULLET_LINE_THRESHOLD: usize = 3;

const HEADER_PREFIX: &str = "## ";

/// Byte positions of one `## Title` line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Header<'a> {
    title: &'a str,
    /// Offset of the `#` that starts the line.
    line_start: usize,
    /// Offset just past the line's newline (or end of text).
    body_start: usize,
}

/// First pass: find every header line.
fn scan_headers(text: &str) -> Vec<Header<'_>> {
    let mut headers = Vec::new();
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let content = line.strip_suffix('\n').unwrap_or(line);
        let content = content.strip_suffix('\r').unwrap_or(content);

        if let Some(rest) = content.strip_prefix(HEADER_PREFIX) {
            let title = rest.trim();
            if !title.is_empty() {
                headers.push(Header {
                    title,
                    line_start: offset,
                    body_start: offset + line.len(),
                });
            }
        }
        offset += line.len();
    }

    headers
}

/// Raw body of header `idx`: everything up to the next header or end of text.
fn body_of<'a>(text: &'a str, headers: &[Header<'_>], idx: usize) -> &'a str {
    let start = headers[idx].body_start;
    let end = headers
        .get(idx + 1)
        .map(|next| next.line_start)
        .unwrap_or(text.len());
    &text[start..end]
}

/// Infer a style from the body text. Never returns [`SectionStyle::Auto`].
pub fn infer_style(body: &str) -> SectionStyle {
    let bullet_lines = body.lines().filter(|line| line.starts_with("- ")).count();
    if bullet_lines > BULLET_LINE_THRESHOLD {
        SectionStyle::BulletList
    } else {
        SectionStyle::Paragraph
    }
}

/// Second pass: split `prompt` into its ordered sections.
///
/// Text before the first header is not part of any section (see
/// [`leading_instructions`]). A prompt without headers yields no sections.
pub fn parse_sections(prompt: &str) -> Vec<TemplateSection> {
    let headers = scan_headers(prompt);

    (0..headers.len())
        .map(|idx| {
            let body = body_of(prompt, &headers, idx);
            TemplateSection {
                id: uuid::Uuid::new_v4().to_string(),
                title: headers[idx].title.to_string(),
                style: infer_style(body),
                detail: DetailLevel::Normal,
                instructions: body.trim().to_string(),
            }
        })
        .collect()
}

/// Trimmed text before the first section header (the whole prompt when it
/// has no headers).
pub fn leading_instructions(prompt: &str) -> &str {
    match scan_headers(prompt).first() {
        Some(first) => prompt[..first.line_start].trim(),
        None => prompt.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bullets(n: usize) -> String {
        (0..n).map(|i| format!("- item {}\n", i)).collect()
    }

    #[test]
    fn test_parses_titles_and_bodies_in_order() {
        let prompt = "Intro line.\n\n## Subjective\nHistory here.\n\n## Plan\nNext steps.\n";
        let sections = parse_sections(prompt);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "Subjective");
        assert_eq!(sections[0].instructions, "History here.");
        assert_eq!(sections[1].title, "Plan");
        assert_eq!(sections[1].instructions, "Next steps.");
    }

    #[test]
    fn test_last_section_runs_to_end_of_text() {
        let sections = parse_sections("## Only\nline one\nline two");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].instructions, "line one\nline two");
    }

    #[test]
    fn test_title_is_trimmed() {
        let sections = parse_sections("##   Assessment  \nbody");
        assert_eq!(sections[0].title, "Assessment");
    }

    #[test]
    fn test_no_headers_yields_empty_sections() {
        assert!(parse_sections("Just write a note.\n- a\n- b").is_empty());
        assert!(parse_sections("").is_empty());
    }

    #[test]
    fn test_other_heading_levels_are_body_text() {
        let prompt = "## Plan\n### Medications\nList them.\n# Not a section";
        let sections = parse_sections(prompt);
        assert_eq!(sections.len(), 1);
        assert_eq!(
            sections[0].instructions,
            "### Medications\nList them.\n# Not a section"
        );
    }

    #[test]
    fn test_header_requires_space_and_title() {
        let sections = parse_sections("##NoSpace\n## \n## Real\nbody");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Real");
        assert_eq!(sections[0].instructions, "body");
    }

    #[test]
    fn test_crlf_line_endings() {
        let prompt = "## Subjective\r\nHistory.\r\n## Plan\r\nSteps.\r\n";
        let sections = parse_sections(prompt);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "Subjective");
        assert_eq!(sections[0].instructions, "History.");
        assert_eq!(sections[1].instructions, "Steps.");
    }

    #[test]
    fn test_four_bullets_is_bullet_list() {
        let prompt = format!("## Plan\n{}", bullets(4));
        assert_eq!(parse_sections(&prompt)[0].style, SectionStyle::BulletList);
    }

    #[test]
    fn test_three_bullets_is_paragraph() {
        let prompt = format!("## Plan\n{}", bullets(3));
        assert_eq!(parse_sections(&prompt)[0].style, SectionStyle::Paragraph);
    }

    #[test]
    fn test_bullets_in_next_section_do_not_count() {
        let prompt = format!("## A\n{}## B\n{}", bullets(2), bullets(2));
        let sections = parse_sections(&prompt);
        assert_eq!(sections[0].style, SectionStyle::Paragraph);
        assert_eq!(sections[1].style, SectionStyle::Paragraph);
    }

    #[test]
    fn test_indented_dashes_are_not_bullets() {
        let body = "  - a\n  - b\n  - c\n  - d\n";
        assert_eq!(infer_style(body), SectionStyle::Paragraph);
    }

    #[test]
    fn test_detail_is_always_normal_and_ids_unique() {
        let sections = parse_sections("## A\nx\n## B\ny\n## C\nz");
        assert!(sections.iter().all(|s| s.detail == DetailLevel::Normal));
        assert_ne!(sections[0].id, sections[1].id);
        assert_ne!(sections[1].id, sections[2].id);
        assert_ne!(sections[0].id, sections[2].id);
    }

    #[test]
    fn test_leading_instructions() {
        let prompt = "  Be concise.\n\n## Plan\nSteps";
        assert_eq!(leading_instructions(prompt), "Be concise.");
        assert_eq!(leading_instructions("## Plan\nSteps"), "");
        assert_eq!(leading_instructions(" no headers "), "no headers");
    }
}
