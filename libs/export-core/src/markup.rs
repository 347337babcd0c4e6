//! Markdown to Anki field HTML.
//!
//! The transform is an ordered list of text passes. Order matters: wiki
//! images are handled before markdown images, bold before italic, and list
//! detection runs after inline markup so `* item` lines are untouched by the
//! italic pass.
//!
//! Markup produced for images and links is swapped for an opaque placeholder
//! until the last pass, so later passes (italics, tag removal) never rewrite
//! a filename or URL.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

use crate::frontmatter;
use crate::types::{ParsedTemplate, PresentationCard};

static WIKI_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[\[([^\]]+)\]\]").unwrap());
static MARKDOWN_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").unwrap());
static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}[ \t]+(.+)$").unwrap());
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]+)`").unwrap());
static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[-*]\s+(.*)$").unwrap());
static WIKI_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[([^\]\n]+?)\]\]").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]\n]+)\]\(([^)\n]+)\)").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"#[A-Za-z0-9_-]+").unwrap());
static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").unwrap());
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new("\u{E000}(\\d+)\u{E001}").unwrap());

/// Image references that resolved to an uploaded media file.
#[derive(Debug, Clone, Default)]
pub struct ResolvedAssets {
    by_reference: HashMap<String, String>,
}

impl ResolvedAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a reference (as returned by [`image_references`]) to a media filename.
    pub fn insert(&mut self, reference: impl Into<String>, filename: impl Into<String>) {
        self.by_reference.insert(reference.into(), filename.into());
    }

    pub fn get(&self, reference: &str) -> Option<&str> {
        self.by_reference.get(reference).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_reference.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_reference.is_empty()
    }
}

/// Result of rendering one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub html: String,
    /// Media filenames substituted into `html`, one per occurrence.
    pub assets: Vec<String>,
}

/// Distinct image references in a field, wiki references first.
pub fn image_references(markdown: &str) -> Vec<String> {
    let body = frontmatter::strip(markdown);
    let mut refs: Vec<String> = Vec::new();
    let mut push = |reference: String| {
        if !reference.is_empty() && !refs.contains(&reference) {
            refs.push(reference);
        }
    };

    for caps in WIKI_IMAGE.captures_iter(body) {
        push(wiki_target(&caps[1]).to_string());
    }
    let without_wiki = WIKI_IMAGE.replace_all(body, "");
    for caps in MARKDOWN_IMAGE.captures_iter(&without_wiki) {
        push(markdown_target(&caps[2]).to_string());
    }
    refs
}

/// Render both sides of a template.
pub fn render_card(template: &ParsedTemplate, assets: Option<&ResolvedAssets>) -> PresentationCard {
    let front = render(&template.front, assets);
    let back = render(&template.back, assets);

    let mut all_assets = front.assets;
    all_assets.extend(back.assets);

    PresentationCard {
        front: front.html,
        back: back.html,
        assets: all_assets,
    }
}

/// Convert one markdown field to Anki HTML.
///
/// With `assets` set to `None`, image references are left as written.
pub fn render(markdown: &str, assets: Option<&ResolvedAssets>) -> Rendered {
    let mut shield = Shield::default();
    let mut uploaded = Vec::new();

    let text = markdown.replace("\r\n", "\n");
    let text = frontmatter::strip(&text);
    let text = replace_images(text, assets, &mut shield, &mut uploaded);
    let text = convert_headings(&text);
    let text = convert_emphasis(&text);
    let text = convert_code(&text);
    let text = convert_lists(&text);
    let text = flatten_wiki_links(&text);
    let text = convert_links(&text, &mut shield);
    let text = remove_tags(&text);
    let text = collapse_blank_lines(&text);
    let text = shield.restore(&text);

    Rendered {
        html: text.replace('\n', "<br>"),
        assets: uploaded,
    }
}

fn replace_images(
    text: &str,
    assets: Option<&ResolvedAssets>,
    shield: &mut Shield,
    uploaded: &mut Vec<String>,
) -> String {
    let mut substitute = |original: &str, reference: &str| -> String {
        match assets.and_then(|a| a.get(reference)) {
            Some(filename) => {
                uploaded.push(filename.to_string());
                shield.protect(format!("<img src=\"{}\">", escape_attr(filename)))
            }
            None => shield.protect(original.to_string()),
        }
    };

    let text = WIKI_IMAGE
        .replace_all(text, |caps: &Captures| {
            substitute(&caps[0], wiki_target(&caps[1]))
        })
        .into_owned();
    MARKDOWN_IMAGE
        .replace_all(&text, |caps: &Captures| {
            substitute(&caps[0], markdown_target(&caps[2]))
        })
        .into_owned()
}

fn convert_headings(text: &str) -> String {
    HEADING
        .replace_all(text, |caps: &Captures| {
            let title = TAG.replace_all(&caps[1], "");
            format!("<b>{}</b>", title.trim_end())
        })
        .into_owned()
}

/// `***x***` comes out as `<b><i>x</b></i>`. Anki's renderer accepts it.
fn convert_emphasis(text: &str) -> String {
    let text = BOLD.replace_all(text, "<b>$1</b>");
    let text = italicize(&text, '*');
    italicize(&text, '_')
}

fn convert_code(text: &str) -> String {
    CODE.replace_all(text, "<code>$1</code>").into_owned()
}

fn convert_lists(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut items: Vec<String> = Vec::new();

    let close = |items: &mut Vec<String>, lines: &mut Vec<String>| {
        if !items.is_empty() {
            lines.push(format!("<ul>{}</ul>", items.concat()));
            items.clear();
        }
    };

    for line in text.split('\n') {
        match BULLET.captures(line) {
            Some(caps) => items.push(format!("<li>{}</li>", &caps[1])),
            None => {
                close(&mut items, &mut lines);
                lines.push(line.to_string());
            }
        }
    }
    close(&mut items, &mut lines);

    lines.join("\n")
}

fn flatten_wiki_links(text: &str) -> String {
    WIKI_LINK
        .replace_all(text, |caps: &Captures| {
            let inner = &caps[1];
            match inner.split_once('|') {
                Some((_, alias)) => alias.trim().to_string(),
                None => inner.to_string(),
            }
        })
        .into_owned()
}

fn convert_links(text: &str, shield: &mut Shield) -> String {
    LINK.replace_all(text, |caps: &Captures| {
        shield.protect(format!(
            "<a href=\"{}\">{}</a>",
            escape_attr(caps[2].trim()),
            &caps[1]
        ))
    })
    .into_owned()
}

fn remove_tags(text: &str) -> String {
    TAG.replace_all(text, "").into_owned()
}

fn collapse_blank_lines(text: &str) -> String {
    BLANK_RUN.replace_all(text, "\n\n").trim().to_string()
}

/// Convert `delim`-wrapped spans to `<i>`.
///
/// An opening delimiter must be followed by a non-space character and a
/// closing one preceded by one; doubled delimiters never match. Underscores
/// additionally must not sit inside a word, so `snake_case_name` is kept.
fn italicize(text: &str, delim: char) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == delim && opens(&chars, i, delim) {
            if let Some(close) = closes(&chars, i, delim) {
                out.push_str("<i>");
                out.extend(&chars[i + 1..close]);
                out.push_str("</i>");
                i = close + 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn opens(chars: &[char], i: usize, delim: char) -> bool {
    let prev = i.checked_sub(1).map(|p| chars[p]);
    if prev == Some(delim) {
        return false;
    }
    if delim == '_' && prev.is_some_and(char::is_alphanumeric) {
        return false;
    }
    matches!(chars.get(i + 1), Some(&c) if !c.is_whitespace() && c != delim)
}

fn closes(chars: &[char], open: usize, delim: char) -> Option<usize> {
    let offset = chars[open + 1..]
        .iter()
        .position(|&c| c == delim || c == '\n')?;
    let close = open + 1 + offset;
    if chars[close] != delim || chars[close - 1].is_whitespace() {
        return None;
    }
    let next = chars.get(close + 1).copied();
    if next == Some(delim) {
        return None;
    }
    if delim == '_' && next.is_some_and(char::is_alphanumeric) {
        return None;
    }
    Some(close)
}

/// `![[cat.png|200]]` resolves `cat.png`.
fn wiki_target(inner: &str) -> &str {
    inner.split('|').next().unwrap_or(inner).trim()
}

/// `![alt](<media/cat.png> "title")` resolves `media/cat.png`.
fn markdown_target(inner: &str) -> &str {
    let inner = inner.trim();
    let inner = match inner.find(" \"") {
        Some(idx) => &inner[..idx],
        None => inner,
    };
    inner.trim_start_matches('<').trim_end_matches('>').trim()
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// Holds finished markup out of reach of later passes.
#[derive(Default)]
struct Shield {
    slots: Vec<String>,
}

impl Shield {
    fn protect(&mut self, markup: String) -> String {
        let token = format!("\u{E000}{}\u{E001}", self.slots.len());
        self.slots.push(markup);
        token
    }

    fn restore(&self, text: &str) -> String {
        PLACEHOLDER
            .replace_all(text, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|idx| self.slots.get(idx))
                    .cloned()
                    .unwrap_or_default()
            })
            .into_owned()
    }
}
