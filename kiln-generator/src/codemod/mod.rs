//! Structural source rewriting for files multiple plugins touch.
//!
//! Rather than best-effort string patching, each codemod parses the exact
//! subset of syntax it needs (the import header, one exported
//! configuration object literal) and fails loudly when a file does not
//! have the expected shape. Both operations are idempotent: applying the
//! same request set twice yields byte-identical output.

mod imports;
mod options;

pub use imports::inject_imports;
pub use options::inject_options;

/// Skip over a quoted string starting at byte `i` (a `'`, `"` or
/// backtick), returning the offset just past the closing quote, or `None`
/// if the string never closes. Offsets are byte offsets; multi-byte
/// UTF-8 never collides with the ASCII delimiters compared here.
pub(crate) fn skip_string(src: &[u8], i: usize) -> Option<usize> {
    let quote = src[i];
    let mut j = i + 1;
    while j < src.len() {
        match src[j] {
            b'\\' => j += 2,
            c if c == quote => return Some(j + 1),
            _ => j += 1,
        }
    }
    None
}

/// Skip over a comment starting at byte `i` (`//` or `/* */`), returning
/// the offset just past it, or `None` if `i` is not a comment start.
pub(crate) fn skip_comment(src: &[u8], i: usize) -> Option<usize> {
    if src[i] != b'/' || i + 1 >= src.len() {
        return None;
    }
    match src[i + 1] {
        b'/' => {
            let mut j = i + 2;
            while j < src.len() && src[j] != b'\n' {
                j += 1;
            }
            Some(j)
        }
        b'*' => {
            let mut j = i + 2;
            while j + 1 < src.len() {
                if src[j] == b'*' && src[j + 1] == b'/' {
                    return Some(j + 2);
                }
                j += 1;
            }
            Some(src.len())
        }
        _ => None,
    }
}

pub(crate) fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}
