//! Minimal placeholder templating over literal text
//!
//! The only syntax is the named reference `${name}`. Everything else,
//! including a lone `$` not followed by `{`, passes through unchanged.
//! Text nodes store raw strings and are parsed at render time, so syntax
//! errors surface through the renderer together with a caller trace.

use crate::error::TemplateError;

/// One parsed piece of a text template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Verbatim text
    Literal(String),

    /// `${name}` symbol reference
    Reference(String),
}

/// Split template text into literal runs and symbol references.
///
/// # Errors
///
/// Returns `UnterminatedPlaceholder` for `${` with no closing `}`,
/// `EmptyPlaceholder` for `${}`, and `InvalidPlaceholderName` when the
/// name is not an identifier.
pub fn parse(input: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut iter = input.char_indices().peekable();

    while let Some((at, ch)) = iter.next() {
        if ch != '$' || !matches!(iter.peek(), Some((_, '{'))) {
            literal.push(ch);
            continue;
        }
        iter.next(); // consume '{'

        let mut name = String::new();
        let mut closed = false;
        for (_, c) in iter.by_ref() {
            if c == '}' {
                closed = true;
                break;
            }
            name.push(c);
        }
        if !closed {
            return Err(TemplateError::UnterminatedPlaceholder { at });
        }
        if name.is_empty() {
            return Err(TemplateError::EmptyPlaceholder { at });
        }
        if !is_identifier(&name) {
            return Err(TemplateError::InvalidPlaceholderName { name, at });
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Reference(name));
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// Check for `[A-Za-z_][A-Za-z0-9_]*`.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
