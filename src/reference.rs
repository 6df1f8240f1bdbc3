//! Scanner for `{{ ... }}` blocks and the `steps.*` reference grammar.
//!
//! ```text
//! reference  := "steps." identifier ("." "body" "." identifier)?
//! identifier := [A-Za-z0-9_-]+
//! ```

use std::ops::Range;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const STEPS_PREFIX: &str = "steps.";
const BODY_SEGMENT: &str = "body";

/// One `{{ ... }}` block found in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatch {
    /// Content between the braces, verbatim.
    pub inner: String,
    /// Byte range of the whole block, braces included.
    pub span: Range<usize>,
}

/// A well-formed `steps.*` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableReference {
    pub raw_text: String,
    pub node_alias: String,
    pub field_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    Reference(VariableReference),
    /// Starts with `steps.` but is not a valid dotted path.
    SyntaxError,
    /// Some other expression; not this engine's concern.
    Ignored,
}

/// Every `{{ ... }}` block in `text`, in order. An unclosed `{{` ends the scan.
pub fn extract_references(text: &str) -> Vec<RawMatch> {
    let mut matches = Vec::new();
    let mut cursor = 0;

    while let Some(found) = text[cursor..].find(OPEN) {
        let open = cursor + found;
        let inner_start = open + OPEN.len();
        let Some(len) = text[inner_start..].find(CLOSE) else {
            break;
        };
        let inner_end = inner_start + len;
        let close_end = inner_end + CLOSE.len();
        matches.push(RawMatch {
            inner: text[inner_start..inner_end].to_string(),
            span: open..close_end,
        });
        cursor = close_end;
    }

    matches
}

/// Classify the inner content of one block.
pub fn classify(inner: &str) -> Classified {
    let trimmed = inner.trim();
    let Some(path) = trimmed.strip_prefix(STEPS_PREFIX) else {
        return Classified::Ignored;
    };

    match split_path(path) {
        Some((alias, field)) => Classified::Reference(VariableReference {
            raw_text: inner.to_string(),
            node_alias: alias.to_string(),
            field_name: field.map(str::to_string),
        }),
        None => Classified::SyntaxError,
    }
}

fn split_path(path: &str) -> Option<(&str, Option<&str>)> {
    let segments: Vec<&str> = path.split('.').collect();
    match segments.as_slice() {
        [alias] if is_identifier(alias) => Some((*alias, None)),
        [alias, body, field]
            if *body == BODY_SEGMENT && is_identifier(alias) && is_identifier(field) =>
        {
            Some((*alias, Some(*field)))
        }
        _ => None,
    }
}

/// Whether `s` can appear as one segment of a `steps.` path.
pub fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
