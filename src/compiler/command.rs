//! Wildcard handling inside command statements
//!
//! A command's text may interpolate compile-time constants through
//! `%name%` wildcards, where the name between the markers is a possibly
//! qualified variable reference. `%%` escapes a literal percent sign, and
//! a single `%` at the very end of the text is taken literally rather
//! than as an unclosed wildcard.

use crate::ast::{CommandStmt, Span};
use crate::error::{DiagnosticKind, Diagnostics};
use crate::name::QualifiedName;
use crate::semantic::frame::Frame;
use crate::semantic::index::Index;

/// Byte offsets of a wildcard's opening and closing `%` in the command
/// text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WildcardIndex {
    pub start: usize,
    pub end: usize,
}

/// Scans the text for wildcard regions, skipping `%%` escapes.
pub fn wildcard_indexes(text: &str) -> Result<Vec<WildcardIndex>, DiagnosticKind> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        // A percent sign with nothing after it is literal.
        if i + 1 >= bytes.len() {
            break;
        }
        if bytes[i + 1] == b'%' {
            i += 2;
            continue;
        }
        let Some(offset) = text[i + 1..].find('%') else {
            return Err(DiagnosticKind::UnclosedWildcard);
        };
        let end = i + 1 + offset;
        found.push(WildcardIndex { start: i, end });
        i = end + 1;
    }
    Ok(found)
}

/// Parses the reference between a wildcard's markers. Whitespace around
/// the whole reference and around each `::` segment is tolerated.
pub fn wildcard_to_name(
    text: &str,
    w: WildcardIndex,
) -> Result<QualifiedName, DiagnosticKind> {
    let inner = text[w.start + 1..w.end].trim();
    let mut parts = Vec::new();
    for part in inner.split("::") {
        let part = part.trim();
        if part.is_empty() {
            return Err(DiagnosticKind::InvalidWildcard);
        }
        parts.push(part.to_string());
    }
    let name = parts.pop().ok_or(DiagnosticKind::InvalidWildcard)?;
    Ok(QualifiedName::new(parts, name))
}

/// The references of every well-formed wildcard in the command, with
/// malformed ones skipped. Used by graph construction, which runs after
/// the wildcards have already been checked.
pub fn wildcard_names(stmt: &CommandStmt) -> Vec<QualifiedName> {
    let Ok(indexes) = wildcard_indexes(&stmt.text) else {
        return Vec::new();
    };
    indexes
        .into_iter()
        .filter_map(|w| wildcard_to_name(&stmt.text, w).ok())
        .collect()
}

/// A span pointing at one wildcard inside the command's own span. Column
/// arithmetic assumes the command sits on a single source line.
fn wildcard_span(stmt: &CommandStmt, w: WildcardIndex) -> Span {
    Span::new(
        stmt.span.start_line,
        stmt.span.start_col + 1 + w.start as u32,
        stmt.span.start_line,
        stmt.span.start_col + 1 + w.end as u32,
    )
}

/// Verifies that every wildcard parses and resolves to a known variable.
pub fn check_wildcards<'a>(
    stmt: &CommandStmt,
    index: &Index<'a>,
    frame: &Frame<'a>,
    diags: &mut Diagnostics,
) {
    let indexes = match wildcard_indexes(&stmt.text) {
        Ok(indexes) => indexes,
        Err(kind) => {
            diags.report(kind, stmt.span);
            return;
        }
    };
    for w in indexes {
        let name = match wildcard_to_name(&stmt.text, w) {
            Ok(name) => name,
            Err(kind) => {
                diags.report(kind, wildcard_span(stmt, w));
                continue;
            }
        };
        if frame.resolve_variable(index, &name).is_none() {
            diags.report(
                DiagnosticKind::UnrecognizedVariable(name.to_string()),
                wildcard_span(stmt, w),
            );
        }
    }
}

/// Produces the final command line: every wildcard replaced by its
/// target's folded value, right to left so earlier offsets stay valid,
/// then `%%` escapes collapsed to `%`.
pub fn make_raw_command<'a>(
    stmt: &CommandStmt,
    index: &Index<'a>,
    frame: &Frame<'a>,
) -> Result<String, (DiagnosticKind, Span)> {
    let indexes = wildcard_indexes(&stmt.text).map_err(|kind| (kind, stmt.span))?;
    let mut text = stmt.text.clone();
    for w in indexes.into_iter().rev() {
        let name =
            wildcard_to_name(&stmt.text, w).map_err(|kind| (kind, wildcard_span(stmt, w)))?;
        let value = frame
            .static_evaluate_variable(index, &name)
            .ok_or((DiagnosticKind::CannotStaticallyEvaluate, wildcard_span(stmt, w)))?;
        text.replace_range(w.start..=w.end, &value.to_string());
    }
    Ok(collapse_escapes(&text))
}

fn collapse_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' && chars.peek() == Some(&'%') {
            chars.next();
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_basic_wildcard() {
        let indexes = wildcard_indexes("say %count% items").unwrap();
        assert_eq!(indexes, vec![WildcardIndex { start: 4, end: 10 }]);
    }

    #[test]
    fn test_scan_escaped_percent() {
        let indexes = wildcard_indexes("give 100%% boost").unwrap();
        assert!(indexes.is_empty());
    }

    #[test]
    fn test_trailing_percent_is_literal() {
        let indexes = wildcard_indexes("progress 50%").unwrap();
        assert!(indexes.is_empty());
    }

    #[test]
    fn test_unclosed_wildcard() {
        assert!(matches!(
            wildcard_indexes("say %count items"),
            Err(DiagnosticKind::UnclosedWildcard)
        ));
    }

    #[test]
    fn test_qualified_wildcard_name() {
        let text = "say % a :: b :: x %";
        let indexes = wildcard_indexes(text).unwrap();
        let name = wildcard_to_name(text, indexes[0]).unwrap();
        assert_eq!(name, QualifiedName::new(vec!["a".into(), "b".into()], "x"));
    }

    #[test]
    fn test_empty_wildcard_part_invalid() {
        let text = "say %a::%";
        let indexes = wildcard_indexes(text).unwrap();
        assert!(matches!(
            wildcard_to_name(text, indexes[0]),
            Err(DiagnosticKind::InvalidWildcard)
        ));
    }

    #[test]
    fn test_collapse_escapes() {
        assert_eq!(collapse_escapes("100%% done"), "100% done");
        assert_eq!(collapse_escapes("%%%%"), "%%");
        assert_eq!(collapse_escapes("plain"), "plain");
    }
}
