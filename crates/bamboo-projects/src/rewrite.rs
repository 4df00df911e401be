//! Literal token rewrite across a project tree
//!
//! Only text files on an allow-list are touched, and only when their content
//! actually changes. A failure stops the walk; files already rewritten stay
//! rewritten.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Version-control metadata directory, never descended into
pub const VCS_DIR: &str = ".git";

/// File names rewritten regardless of extension
const REWRITE_FILE_NAMES: &[&str] = &["go.mod", "go.sum", "README.md", "Makefile"];

/// Extensions (lowercase, without the dot) eligible for rewriting
const REWRITE_EXTENSIONS: &[&str] = &["go", "mod", "sum", "md", "txt", "yaml", "yml", "toml", "env"];

/// What a rewrite pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// Eligible files that were read
    pub files_scanned: usize,
    /// Files written back with new content
    pub files_rewritten: usize,
}

/// Replace every occurrence of `search` with `replacement` under `root`
pub fn rewrite_tree(root: &Path, search: &str, replacement: &str) -> Result<RewriteStats> {
    if search.is_empty() {
        return Err(Error::EmptyRewriteToken);
    }

    let mut stats = RewriteStats::default();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !(entry.file_type().is_dir() && entry.file_name() == VCS_DIR));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| root.display().to_string());
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
            Error::file_io("walk", path, source)
        })?;

        if !entry.file_type().is_file() || !should_rewrite(entry.path()) {
            continue;
        }

        stats.files_scanned += 1;
        if rewrite_file(entry.path(), search.as_bytes(), replacement.as_bytes())? {
            stats.files_rewritten += 1;
        }
    }

    info!(
        scanned = stats.files_scanned,
        rewritten = stats.files_rewritten,
        "Rewrote module path under {}",
        root.display()
    );
    Ok(stats)
}

/// Rewrite one file; returns whether it was written
fn rewrite_file(path: &Path, search: &[u8], replacement: &[u8]) -> Result<bool> {
    let display = || path.display().to_string();

    let content = fs::read(path).map_err(|e| Error::file_io("read", display(), e))?;
    let updated = replace_all(&content, search, replacement);
    if updated == content {
        return Ok(false);
    }

    let permissions = fs::metadata(path)
        .map_err(|e| Error::file_io("stat", display(), e))?
        .permissions();

    fs::write(path, &updated).map_err(|e| Error::file_io("write", display(), e))?;
    fs::set_permissions(path, permissions).map_err(|e| Error::file_io("write", display(), e))?;

    debug!("Rewrote {}", path.display());
    Ok(true)
}

/// Whether a file is a candidate for rewriting, judged by its name
pub fn should_rewrite(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    if REWRITE_FILE_NAMES.contains(&name) {
        return true;
    }

    // Everything after the last dot, so ".env" counts as an env file
    match name.rfind('.') {
        Some(idx) => {
            let ext = name[idx + 1..].to_ascii_lowercase();
            REWRITE_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Non-overlapping, left-to-right literal replace
fn replace_all(haystack: &[u8], needle: &[u8], replacement: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(haystack.len());
    let mut rest = haystack;

    while let Some(pos) = find(rest, needle) {
        out.extend_from_slice(&rest[..pos]);
        out.extend_from_slice(replacement);
        rest = &rest[pos + needle.len()..];
    }
    out.extend_from_slice(rest);
    out
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
