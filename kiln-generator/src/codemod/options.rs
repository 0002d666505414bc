//! Option injection into an exported configuration object literal.
//!
//! Locates the file's exported configuration object (the first object
//! literal after `export default`, directly or wrapped in a single call
//! such as `createApp({ ... })`, or after `module.exports =`) and merges
//! the requested entries into it. Keys the user already set are never
//! overwritten, and the existing literal's formatting is preserved.

use miette::SourceSpan;

use super::{is_ident_byte, skip_comment, skip_string};
use crate::error::{Error, Result};

/// Merge `entries` (key, raw JS expression) into the exported
/// configuration object literal of `source`.
///
/// Entries whose key is already present are dropped. An entry whose
/// expression equals its key is emitted in shorthand form (`router,`
/// rather than `router: router,`).
///
/// # Errors
///
/// Fails with a parse error when no exported configuration object can be
/// located or the literal's braces never balance.
pub fn inject_options(path: &str, source: &str, entries: &[(String, String)]) -> Result<String> {
    let literal = find_literal(path, source)?;
    let existing = literal_keys(&source[literal.open + 1..literal.close]);

    let missing: Vec<&(String, String)> = entries
        .iter()
        .filter(|(key, _)| !existing.contains(key))
        .collect();
    if missing.is_empty() {
        return Ok(source.to_string());
    }

    let indent = entry_indent(source, literal.open);
    let mut block = String::new();
    for (key, expr) in missing {
        block.push('\n');
        block.push_str(&indent);
        if key == expr {
            block.push_str(key);
        } else {
            block.push_str(key);
            block.push_str(": ");
            block.push_str(expr);
        }
        block.push(',');
    }

    let body = &source[literal.open + 1..literal.close];
    let mut out = String::with_capacity(source.len() + block.len());
    out.push_str(&source[..literal.open + 1]);
    out.push_str(&block);
    if body.trim().is_empty() {
        // `{}` becomes a multi-line literal.
        out.push('\n');
        out.push_str(&closing_indent(source, literal.open));
    } else {
        out.push_str(body);
    }
    out.push_str(&source[literal.close..]);
    Ok(out)
}

struct Literal {
    /// Byte offset of the opening brace.
    open: usize,
    /// Byte offset of the matching closing brace.
    close: usize,
}

fn find_literal(path: &str, source: &str) -> Result<Literal> {
    let anchor = match source.find("export default") {
        Some(idx) => idx + "export default".len(),
        None => match source.find("module.exports") {
            Some(idx) => {
                let rest = &source[idx + "module.exports".len()..];
                let eq = rest.find('=').ok_or_else(|| {
                    Error::codemod(
                        path,
                        "expected '=' after module.exports",
                        source,
                        Some(SourceSpan::from((idx, "module.exports".len()))),
                    )
                })?;
                idx + "module.exports".len() + eq + 1
            }
            None => {
                return Err(Error::codemod(
                    path,
                    "no exported configuration object found",
                    source,
                    None,
                ));
            }
        },
    };

    let open = literal_open(source, anchor).ok_or_else(|| {
        Error::codemod(
            path,
            "exported value is not an object literal",
            source,
            Some(SourceSpan::from((anchor.min(source.len().saturating_sub(1)), 1))),
        )
    })?;
    let close = matching_brace(source.as_bytes(), open).ok_or_else(|| {
        Error::codemod(
            path,
            "unbalanced braces in configuration object",
            source,
            Some(SourceSpan::from((open, 1))),
        )
    })?;
    Ok(Literal { open, close })
}

/// Find the opening brace of the exported literal, skipping a single
/// identifier-chain call wrapper (`createApp(`, `helpers.define(`).
fn literal_open(source: &str, anchor: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut i = anchor;
    let mut wrappers = 0;
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            return None;
        }
        match bytes[i] {
            b'{' => return Some(i),
            b'(' if wrappers > 0 => {
                i += 1;
            }
            _ if is_ident_byte(bytes[i]) || bytes[i] == b'.' => {
                while i < bytes.len() && (is_ident_byte(bytes[i]) || bytes[i] == b'.') {
                    i += 1;
                }
                wrappers += 1;
            }
            _ => return None,
        }
    }
}

/// Scan from an opening brace to its matching close, skipping strings,
/// template literals and comments.
fn matching_brace(src: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < src.len() {
        match src[i] {
            b'\'' | b'"' | b'`' => i = skip_string(src, i)?,
            b'/' => match skip_comment(src, i) {
                Some(next) => i = next,
                None => i += 1,
            },
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    None
}

/// Collect the top-level keys of an object literal body.
fn literal_keys(body: &str) -> Vec<String> {
    let src = body.as_bytes();
    let mut keys = Vec::new();
    let mut i = 0;
    let mut expect_key = true;

    while i < src.len() {
        match src[i] {
            b if b.is_ascii_whitespace() => i += 1,
            b'/' => match skip_comment(src, i) {
                Some(next) => i = next,
                None => i += 1,
            },
            b'\'' | b'"' | b'`' if expect_key => {
                let Some(end) = skip_string(src, i) else { break };
                keys.push(body[i + 1..end - 1].to_string());
                i = skip_value(src, end);
                expect_key = true;
            }
            b'.' if expect_key => {
                // Spread entry; skip the whole expression.
                i = skip_value(src, i);
            }
            b if expect_key && is_ident_byte(b) => {
                let start = i;
                while i < src.len() && is_ident_byte(src[i]) {
                    i += 1;
                }
                keys.push(body[start..i].to_string());
                i = skip_value(src, i);
                expect_key = true;
            }
            _ => i += 1,
        }
    }
    keys
}

/// Skip past an entry's value (or shorthand tail) up to and including the
/// next top-level comma.
fn skip_value(src: &[u8], mut i: usize) -> usize {
    let mut depth = 0usize;
    while i < src.len() {
        match src[i] {
            b'\'' | b'"' | b'`' => match skip_string(src, i) {
                Some(next) => i = next,
                None => return src.len(),
            },
            b'/' => match skip_comment(src, i) {
                Some(next) => i = next,
                None => i += 1,
            },
            b'{' | b'[' | b'(' => {
                depth += 1;
                i += 1;
            }
            b'}' | b']' | b')' => {
                depth = depth.saturating_sub(1);
                i += 1;
            }
            b',' if depth == 0 => return i + 1,
            _ => i += 1,
        }
    }
    i
}

/// Indentation for injected entries: the opening brace's line indentation
/// plus one level.
fn entry_indent(source: &str, open: usize) -> String {
    format!("{}  ", closing_indent(source, open))
}

fn closing_indent(source: &str, open: usize) -> String {
    let line_start = source[..open].rfind('\n').map_or(0, |idx| idx + 1);
    source[line_start..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}
