//! Stable document identity.
//!
//! An explicit `id` in front matter is used verbatim. Otherwise the identity
//! is the SHA-256 of the document path relative to the vault root, so editing
//! a card keeps its identity and moving it gives it a new one.

use sha2::{Digest, Sha256};
use std::path::{Component, Path};

use crate::frontmatter::FrontMatter;
use crate::types::Identity;

/// Derive the identity of a document from its content and relative path.
pub fn derive_identity(content: &str, relative_path: &str) -> Identity {
    if let Some(id) = FrontMatter::from_document(content)
        .as_ref()
        .and_then(FrontMatter::id)
    {
        return Identity::new(id);
    }
    if relative_path.is_empty() {
        return Identity::new("");
    }
    Identity::new(hash_path(relative_path))
}

/// Calculate SHA256 hash of a path string.
pub fn hash_path(relative_path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(relative_path.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Render `path` relative to `root` with `/` separators.
///
/// Falls back to the full path when `path` is not under `root`.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
