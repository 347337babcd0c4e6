//! Template parser for card files.
//!
//! # Format
//! ```markdown
//! ---
//! id: optional-explicit-id
//! ---
//! Front:
//! What is Rust?
//! Back:
//! A systems programming language.
//! Multiple lines are supported.
//! ```

use crate::error::TemplateError;
use crate::frontmatter;
use crate::types::ParsedTemplate;

const FRONT_MARKER: &str = "Front:";
const BACK_MARKER: &str = "Back:";

/// Parse a document into its front and back sections.
pub fn parse_template(content: &str) -> Result<ParsedTemplate, TemplateError> {
    let body = frontmatter::strip(content);

    let mut section = Section::Preamble;
    let mut front = Vec::new();
    let mut back = Vec::new();

    for line in body.lines() {
        match (section, LineType::of(line)) {
            (Section::Preamble, LineType::Front) => section = Section::Front,
            (Section::Preamble, _) => {}
            (Section::Front, LineType::Back) => section = Section::Back,
            (Section::Front, _) => front.push(line),
            (Section::Back, _) => back.push(line),
        }
    }

    match section {
        Section::Preamble => return Err(TemplateError::MissingFront),
        Section::Front => return Err(TemplateError::MissingBack),
        Section::Back => {}
    }

    let front = front.join("\n").trim().to_string();
    let back = back.join("\n").trim().to_string();

    if front.is_empty() {
        return Err(TemplateError::EmptyFront);
    }
    if back.is_empty() {
        return Err(TemplateError::EmptyBack);
    }

    Ok(ParsedTemplate { front, back })
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Preamble,
    Front,
    Back,
}

enum LineType {
    Front,
    Back,
    Text,
}

impl LineType {
    fn of(line: &str) -> Self {
        match line.trim_end() {
            FRONT_MARKER => Self::Front,
            BACK_MARKER => Self::Back,
            _ => Self::Text,
        }
    }
}
