//! Front matter handling.
//!
//! A front matter block is a `---` line at the very top of the document, any
//! number of `key: value` lines, and a closing `---` line. Values are read
//! informally (no YAML parser), which is enough for `id` and `tags`.
//!
//! Tags come in three mutually exclusive shapes:
//! ```markdown
//! tags: [rust, cli]
//! tags: rust, cli
//! tags:
//!   - rust
//!   - cli
//! ```

use std::collections::BTreeMap;

const DELIMITER: &str = "---";

/// Split a document into its front matter block and body.
///
/// Returns `None` when the document does not open with a delimiter line or
/// the block is never closed.
pub fn split(content: &str) -> Option<(&str, &str)> {
    let text = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = text.split_inclusive('\n');

    let first = lines.next()?;
    if first.trim_end() != DELIMITER || !first.ends_with('\n') {
        return None;
    }

    let block_start = first.len();
    let mut offset = block_start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            return Some((&text[block_start..offset], &text[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// The document without its front matter block.
pub fn strip(content: &str) -> &str {
    match split(content) {
        Some((_, body)) => body,
        None => content,
    }
}

/// Informally parsed front matter fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    fields: BTreeMap<String, String>,
    tags: Vec<String>,
    /// First indented `id:` line, e.g. under a nested mapping.
    nested_id: Option<String>,
}

impl FrontMatter {
    /// Parse the front matter of a document, if it has one.
    pub fn from_document(content: &str) -> Option<Self> {
        split(content).map(|(block, _)| Self::parse(block))
    }

    /// Parse the inner lines of a front matter block.
    pub fn parse(block: &str) -> Self {
        let mut fields = BTreeMap::new();
        let mut tags = Vec::new();
        let mut nested_id = None;
        let mut lines = block.lines().peekable();

        while let Some(line) = lines.next() {
            if line.starts_with(char::is_whitespace) {
                if let Some(value) = line.trim_start().strip_prefix("id:") {
                    let value = unquote(value.trim());
                    if nested_id.is_none() && !value.is_empty() {
                        nested_id = Some(value.to_string());
                    }
                }
                continue;
            }
            if line.starts_with('-') {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() || key.starts_with('#') || fields.contains_key(key) {
                continue;
            }
            let value = value.trim();

            if key == "tags" {
                tags = if let Some(inner) = value.strip_prefix('[') {
                    parse_array_tags(inner)
                } else if !value.is_empty() {
                    parse_simple_tags(value)
                } else {
                    let mut items = Vec::new();
                    while let Some(item) = lines.peek().and_then(|l| list_item(l)) {
                        items.extend(normalize_tag(item));
                        lines.next();
                    }
                    items
                };
            }

            fields.insert(key.to_string(), unquote(value).to_string());
        }

        Self {
            fields,
            tags,
            nested_id,
        }
    }

    /// Raw value of a field with surrounding quotes removed.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Explicit document id, when present and non-empty.
    ///
    /// A top-level `id` wins over an indented one.
    pub fn id(&self) -> Option<&str> {
        self.get("id")
            .filter(|v| !v.is_empty())
            .or(self.nested_id.as_deref())
    }

    /// Tags declared in the block, normalized for Anki.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// `tags: [a, b]` branch. An unclosed bracket reads to the end of the line.
fn parse_array_tags(inner: &str) -> Vec<String> {
    let list = inner.split(']').next().unwrap_or_default();
    list.split(',').filter_map(normalize_tag).collect()
}

/// `tags: a, b` branch.
fn parse_simple_tags(value: &str) -> Vec<String> {
    value.split(',').filter_map(normalize_tag).collect()
}

fn list_item(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if !line.starts_with(char::is_whitespace) && !trimmed.starts_with('-') {
        return None;
    }
    trimmed.strip_prefix('-').map(str::trim)
}

/// Strip quotes, whitespace and a leading `#`; Anki tags cannot hold spaces.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag = unquote(raw).trim_start_matches('#').trim();
    if tag.is_empty() {
        return None;
    }
    Some(
        tag.chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect(),
    )
}

/// Trim whitespace and one layer of surrounding quote characters.
pub fn unquote(value: &str) -> &str {
    value.trim().trim_matches(|c| c == '"' || c == '\'').trim()
}
