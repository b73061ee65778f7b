//! Placeholder scanning and substitution

use logos::Logos;

use super::variables::TemplateVariables;

/// Pieces of template text
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Piece {
    #[regex(r"\$\{[a-zA-Z_$][a-zA-Z0-9_$]*\}")]
    Placeholder,

    #[regex(r"[^$]+")]
    Text,

    // `$` or the start of a placeholder that is never closed
    #[regex(r"\$(\{([a-zA-Z_$][a-zA-Z0-9_$]*)?)?")]
    Partial,
}

/// Split a template into (is_placeholder, text) pieces
fn pieces(template: &str) -> impl Iterator<Item = (bool, &str)> + '_ {
    Piece::lexer(template)
        .spanned()
        .map(move |(piece, span)| (piece == Ok(Piece::Placeholder), &template[span]))
}

/// Name inside `${...}`
fn key(placeholder: &str) -> &str {
    &placeholder[2..placeholder.len() - 1]
}

/// Substitute every `${key}` that has a value in `variables`
///
/// Replacement text is never scanned again, so a value that itself looks
/// like a placeholder is emitted as-is.
pub fn render(template: &str, variables: &TemplateVariables) -> String {
    let mut out = String::with_capacity(template.len());
    for (is_placeholder, text) in pieces(template) {
        let value = if is_placeholder {
            variables.get(key(text))
        } else {
            None
        };
        out.push_str(value.unwrap_or(text));
    }
    out
}

/// Names of all placeholders in the template, in order of appearance
pub fn placeholders(template: &str) -> Vec<&str> {
    pieces(template)
        .filter(|(is_placeholder, _)| *is_placeholder)
        .map(|(_, text)| key(text))
        .collect()
}

/// Placeholders the variables have no value for, without duplicates
pub fn unknown_placeholders<'t>(template: &'t str, variables: &TemplateVariables) -> Vec<&'t str> {
    let mut unknown: Vec<&str> = Vec::new();
    for name in placeholders(template) {
        if variables.get(name).is_none() && !unknown.contains(&name) {
            unknown.push(name);
        }
    }
    unknown
}
