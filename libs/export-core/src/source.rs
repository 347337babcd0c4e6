//! Card file discovery.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::identity::relative_path;
use crate::types::SourceDocument;

/// All `.md` files under `dir`, recursively, in sorted order.
///
/// Hidden files and directories are skipped.
pub fn collect_documents(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_md_files(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_md_files(current: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(current)? {
        let path = entry?.path();
        if is_hidden(&path) {
            continue;
        }
        if path.is_dir() {
            collect_md_files(&path, files)?;
        } else if path.extension().map(|e| e == "md").unwrap_or(false) {
            files.push(path);
        }
    }
    Ok(())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

/// Read a card file. The relative path is taken against `vault_root`.
pub fn read_document(vault_root: &Path, path: &Path) -> io::Result<SourceDocument> {
    let content = fs::read_to_string(path)?;
    Ok(SourceDocument {
        path: path.to_path_buf(),
        relative_path: relative_path(vault_root, path),
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn collects_markdown_recursively() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::create_dir_all(root.join(".trash")).unwrap();
        fs::write(root.join("b.md"), "").unwrap();
        fs::write(root.join("a.md"), "").unwrap();
        fs::write(root.join("sub").join("c.md"), "").unwrap();
        fs::write(root.join(".hidden.md"), "").unwrap();
        fs::write(root.join(".trash").join("d.md"), "").unwrap();
        fs::write(root.join("image.png"), "").unwrap();

        let files = collect_documents(root).unwrap();
        let names: Vec<String> = files.iter().map(|p| relative_path(root, p)).collect();
        assert_eq!(names, vec!["a.md", "b.md", "sub/c.md"]);
    }

    #[test]
    fn missing_dir_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(collect_documents(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn read_document_sets_relative_path() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("anki")).unwrap();
        let path = dir.path().join("anki").join("card.md");
        fs::write(&path, "Front:\nQ\nBack:\nA").unwrap();

        let doc = read_document(dir.path(), &path).unwrap();
        assert_eq!(doc.relative_path, "anki/card.md");
        assert_eq!(doc.content, "Front:\nQ\nBack:\nA");
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.md");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert!(read_document(dir.path(), &path).is_err());
    }
}
