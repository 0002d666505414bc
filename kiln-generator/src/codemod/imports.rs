//! Import-statement injection.
//!
//! Deduplication is by module source identity, not textual match: a file
//! that already imports from `'vuex'` in any form blocks a second import
//! from `'vuex'`, while side-effect-only imports and existing statement
//! ordering are preserved byte-for-byte.

use indexmap::IndexSet;
use miette::SourceSpan;

use crate::error::{Error, Result};

/// The parsed import header of a source file.
struct Header {
    /// Module sources already imported, in order of appearance.
    modules: IndexSet<String>,
    /// Byte offset just past the last import statement (0 when the file
    /// has no imports).
    end: usize,
}

/// Merge the requested import statements into `source`.
///
/// Each request is either a full import statement
/// (`import router from './router'`) or a bare module source (`'vuex'`),
/// which becomes a side-effect import. Requests whose module is already
/// imported are dropped; the rest are appended after the last existing
/// import, in request order.
///
/// # Errors
///
/// Fails with a parse error when the file's import header is malformed or
/// a request carries no recognizable module source, since silently dropping
/// a request would produce a project that references undeclared modules.
pub fn inject_imports(path: &str, source: &str, requests: &[String]) -> Result<String> {
    let header = scan_header(path, source)?;

    let mut known = header.modules;
    let mut additions: Vec<String> = Vec::new();
    for request in requests {
        let statement = normalize_request(request);
        let Some(module) = statement_module(&statement) else {
            return Err(Error::codemod(
                path,
                format!("import request has no module source: {request}"),
                source,
                None,
            ));
        };
        if known.insert(module) {
            additions.push(statement);
        }
    }
    if additions.is_empty() {
        return Ok(source.to_string());
    }

    let mut block = additions.join("\n");
    block.push('\n');
    if header.end == 0 && !source.is_empty() && !source.starts_with('\n') {
        // Inserting a fresh header above existing code keeps a separating
        // blank line.
        block.push('\n');
    }

    let mut out = String::with_capacity(source.len() + block.len());
    out.push_str(&source[..header.end]);
    out.push_str(&block);
    out.push_str(&source[header.end..]);
    Ok(out)
}

fn normalize_request(request: &str) -> String {
    let trimmed = request.trim();
    if trimmed.starts_with("import") {
        trimmed.trim_end_matches(';').trim_end().to_string()
    } else {
        let module = trimmed.trim_matches(|c| c == '\'' || c == '"');
        format!("import '{module}'")
    }
}

/// Scan the leading import statements of a file.
fn scan_header(path: &str, source: &str) -> Result<Header> {
    let mut modules = IndexSet::new();
    let mut end = 0;
    let mut offset = 0;
    let mut pending: Option<(usize, String)> = None;
    let mut in_block_comment = false;

    for line in source.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        if let Some((start, mut text)) = pending.take() {
            text.push_str(line);
            match statement_module(&text) {
                Some(module) => {
                    modules.insert(module);
                    end = offset;
                }
                None => pending = Some((start, text)),
            }
            continue;
        }

        let trimmed = line.trim();
        if in_block_comment {
            if trimmed.contains("*/") {
                in_block_comment = false;
            }
            continue;
        }
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }
        if trimmed.starts_with("/*") {
            in_block_comment = !trimmed.contains("*/");
            continue;
        }
        if is_import_start(trimmed) {
            match statement_module(line) {
                Some(module) => {
                    modules.insert(module);
                    end = offset;
                }
                None => pending = Some((line_start, line.to_string())),
            }
            continue;
        }
        // First non-import statement ends the header.
        break;
    }

    if let Some((start, text)) = pending {
        let len = text.lines().next().map_or(1, str::len);
        return Err(Error::codemod(
            path,
            "unterminated import statement",
            source,
            Some(SourceSpan::from((start, len))),
        ));
    }

    Ok(Header { modules, end })
}

fn is_import_start(trimmed: &str) -> bool {
    trimmed == "import"
        || trimmed.starts_with("import ")
        || trimmed.starts_with("import{")
        || trimmed.starts_with("import*")
        || trimmed.starts_with("import'")
        || trimmed.starts_with("import\"")
}

/// Extract the module source from a complete import statement, or `None`
/// if the statement is still incomplete (spans further lines).
fn statement_module(statement: &str) -> Option<String> {
    if !braces_balanced(statement) {
        return None;
    }
    let rest = statement.trim_start().strip_prefix("import")?.trim_start();
    if rest.starts_with('\'') || rest.starts_with('"') {
        return quoted(rest);
    }
    let from = find_from_keyword(statement)?;
    quoted(statement[from..].trim_start())
}

fn braces_balanced(statement: &str) -> bool {
    let opens = statement.bytes().filter(|&b| b == b'{').count();
    let closes = statement.bytes().filter(|&b| b == b'}').count();
    opens == closes
}

/// Find the offset just past a `from` keyword with token boundaries.
fn find_from_keyword(statement: &str) -> Option<usize> {
    for (idx, _) in statement.match_indices("from") {
        let before_ok = idx == 0
            || statement[..idx]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_whitespace() || c == '}' || c == '*');
        let after = statement[idx + 4..].chars().next();
        let after_ok = after.is_some_and(|c| c.is_whitespace() || c == '\'' || c == '"');
        if before_ok && after_ok {
            return Some(idx + 4);
        }
    }
    None
}

/// Read a quoted string at the start of `s`, returning its contents only
/// when the closing quote is present.
fn quoted(s: &str) -> Option<String> {
    let mut chars = s.chars();
    let quote = chars.next()?;
    if quote != '\'' && quote != '"' {
        return None;
    }
    let rest = chars.as_str();
    let close = rest.find(quote)?;
    Some(rest[..close].to_string())
}
