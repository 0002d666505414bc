//! Template rendering into the virtual file tree.
//!
//! Templates are plain text with `{{ key }}` placeholders resolved
//! against a JSON data object. A whole directory can be rendered at once
//! with a per-file inclusion predicate; files starting with `_` map to
//! dotfiles (`_gitignore` → `.gitignore`) so templates survive tooling
//! that mishandles hidden files, and non-UTF-8 files are copied verbatim.

use std::path::Path;

use kiln_core::VirtualFileTree;
use serde_json::{Map, Value};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Render `{{ key }}` placeholders in a template string.
///
/// Unknown keys are left verbatim so a plugin's literal `{{ ... }}`
/// content (e.g. in a framework source template) passes through.
pub fn render(template: &str, data: &Map<String, Value>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let Some(end) = rest[start + 2..].find("}}") else {
            break;
        };
        let key = rest[start + 2..start + 2 + end].trim();
        match data.get(key) {
            Some(value) => {
                out.push_str(&rest[..start]);
                out.push_str(&value_to_string(value));
            }
            None => out.push_str(&rest[..start + 2 + end + 2]),
        }
        rest = &rest[start + 2 + end + 2..];
    }
    out.push_str(rest);
    out
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render every file under `source` into the tree at `prefix`.
///
/// `include` decides per relative path whether the file is rendered at
/// all. Existing tree entries at colliding paths are replaced.
pub fn render_dir(
    tree: &mut VirtualFileTree,
    source: &Path,
    prefix: &str,
    data: &Map<String, Value>,
    include: &dyn Fn(&str) -> bool,
) -> Result<()> {
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            Box::new(Error::Template {
                path: source.to_path_buf(),
                source: e.into(),
            })
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(source)
            .expect("walked entries live under the walk root");
        let rel = dotfile_path(&rel.to_string_lossy().replace('\\', "/"));
        if !include(&rel) {
            continue;
        }

        let bytes = std::fs::read(entry.path()).map_err(|source| {
            Box::new(Error::Template {
                path: entry.path().to_path_buf(),
                source,
            })
        })?;
        let target = join_prefix(prefix, &rel);
        match String::from_utf8(bytes) {
            Ok(text) => tree.insert(target, render(&text, data)),
            Err(raw) => tree.insert(target, raw.into_bytes()),
        }
    }
    Ok(())
}

/// Map a leading `_` on the file name to a `.`.
fn dotfile_path(rel: &str) -> String {
    match rel.rsplit_once('/') {
        Some((dir, name)) => match name.strip_prefix('_') {
            Some(stripped) => format!("{dir}/.{stripped}"),
            None => rel.to_string(),
        },
        None => match rel.strip_prefix('_') {
            Some(stripped) => format!(".{stripped}"),
            None => rel.to_string(),
        },
    }
}

fn join_prefix(prefix: &str, rel: &str) -> String {
    if prefix.is_empty() {
        rel.to_string()
    } else {
        format!("{}/{}", prefix.trim_end_matches('/'), rel)
    }
}
