//! Export resolution
//!
//! Determines the name under which a source file's primary component is
//! exported. The syntax tree is walked once, pre-order, and every construct
//! matching an export pattern is recorded as an [`ExportCandidate`]. The
//! candidate observed last in document order wins; there is no ranking
//! between patterns. When nothing (or only an anonymous export) wins, the
//! file's base name stands in.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ParseError;
use crate::parser::{self, ExportClause, Item, Module, Span, Spanned};

/// Which export patterns are recognised
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSet {
    /// Default-exported identifiers, default-exported function/class
    /// declarations and named export clauses
    #[default]
    Strict,
    /// Everything in `Strict`, plus function/class declarations that are
    /// exported without `default`
    Permissive,
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSet::Strict => write!(f, "strict"),
            RuleSet::Permissive => write!(f, "permissive"),
        }
    }
}

/// The pattern an export candidate was recognised by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    /// `export default function Foo() {}` / `export default class Foo {}`
    DefaultFunctionOrClass,
    /// `export default Foo` / `export = Foo`
    DefaultIdentifierAssignment,
    /// `export { Foo }`, or `export function Foo() {}` under `Permissive`
    NamedExport,
}

/// One export construct observed during the walk
#[derive(Debug, Clone, PartialEq)]
pub struct ExportCandidate {
    pub kind: CandidateKind,
    /// `None` for anonymous declarations and empty clauses
    pub name: Option<String>,
    pub span: Span,
}

/// Where a resolved name came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameOrigin {
    Export(CandidateKind),
    FileName,
}

/// Result of export resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    pub name: String,
    pub origin: NameOrigin,
}

impl ResolvedName {
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ResolvedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Resolve the exported component name with the default rule set
pub fn resolve(source: &str, path: &Path) -> Result<ResolvedName, ParseError> {
    resolve_with_rules(source, path, RuleSet::default())
}

/// Resolve the exported component name of `source`, read from `path`
///
/// # Example
///
/// ```rust
/// use std::path::Path;
/// use test_file_generator::export::{resolve_with_rules, RuleSet};
///
/// let source = "export function Card() {}";
/// let path = Path::new("src/Tile.tsx");
///
/// let strict = resolve_with_rules(source, path, RuleSet::Strict).unwrap();
/// assert_eq!(strict.as_str(), "Tile");
///
/// let permissive = resolve_with_rules(source, path, RuleSet::Permissive).unwrap();
/// assert_eq!(permissive.as_str(), "Card");
/// ```
pub fn resolve_with_rules(
    source: &str,
    path: &Path,
    rules: RuleSet,
) -> Result<ResolvedName, ParseError> {
    let module = parser::parse(source).map_err(first_error)?;
    let candidates = collect_candidates(&module, rules);

    for candidate in &candidates {
        debug!(
            kind = ?candidate.kind,
            name = ?candidate.name,
            span = ?candidate.span,
            "export candidate"
        );
    }

    Ok(reduce(&candidates, path))
}

/// Walk the tree and record every export construct, in document order
pub fn collect_candidates(module: &Module, rules: RuleSet) -> Vec<ExportCandidate> {
    let mut candidates = Vec::new();
    module.walk(&mut |item| {
        if let Some(candidate) = observe(item, rules) {
            candidates.push(candidate);
        }
    });
    candidates
}

/// The candidate observed last, if any
pub fn last_match(candidates: &[ExportCandidate]) -> Option<&ExportCandidate> {
    candidates.last()
}

/// Pick the winning name, falling back to the file's base name
pub fn reduce(candidates: &[ExportCandidate], path: &Path) -> ResolvedName {
    match last_match(candidates) {
        Some(ExportCandidate {
            kind,
            name: Some(name),
            ..
        }) => ResolvedName {
            name: name.clone(),
            origin: NameOrigin::Export(*kind),
        },
        winner => {
            let name = file_stem_name(path);
            match winner {
                Some(anonymous) => debug!(
                    kind = ?anonymous.kind,
                    fallback = %name,
                    "last export is anonymous, using file name"
                ),
                None => debug!(fallback = %name, "no export found, using file name"),
            }
            ResolvedName {
                name,
                origin: NameOrigin::FileName,
            }
        }
    }
}

/// File name with its last extension removed (`Button.test.tsx` -> `Button.test`)
pub fn file_stem_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn observe(item: &Spanned<Item>, rules: RuleSet) -> Option<ExportCandidate> {
    let (kind, name) = match &item.node {
        Item::ExportAssignment(assignment) => (
            CandidateKind::DefaultIdentifierAssignment,
            Some(assignment.bare_identifier()?.to_string()),
        ),
        Item::Declaration(decl) if decl.is_exported() => {
            let kind = if decl.is_default() {
                CandidateKind::DefaultFunctionOrClass
            } else if rules == RuleSet::Permissive {
                CandidateKind::NamedExport
            } else {
                return None;
            };
            (kind, decl.name.as_ref().map(|n| n.node.0.clone()))
        }
        Item::ExportDeclaration(decl) => match &decl.clause {
            ExportClause::Named(specifiers) => (
                CandidateKind::NamedExport,
                specifiers
                    .first()
                    .map(|s| s.node.exported_name().0.clone()),
            ),
            ExportClause::Namespace(_) => return None,
        },
        _ => return None,
    };

    Some(ExportCandidate {
        kind,
        name: name.filter(|n| !n.is_empty()),
        span: item.span.clone(),
    })
}

fn first_error(errors: Vec<ParseError>) -> ParseError {
    errors
        .into_iter()
        .next()
        .unwrap_or_else(|| ParseError::Syntax {
            span: 0..0,
            message: "Source could not be parsed".to_string(),
            expected: Vec::new(),
        })
}
