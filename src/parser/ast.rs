//! Syntax tree types for JavaScript/TypeScript modules
//!
//! The tree is deliberately loose: only export forms and function/class
//! declarations are modelled. Every other statement is kept as a token tree
//! whose brace blocks are parsed again as nested items, so constructs inside
//! `declare module` blocks or namespaces are still reachable by a walk.

use crate::parser::lexer::Token;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// A name as written in the source (identifier, `default`, or string name)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(pub String);

impl Identifier {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Root node - one parsed source file
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub items: Vec<Spanned<Item>>,
}

/// A statement-level construct
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// `export default <expr>` or `export = <expr>`
    ExportAssignment(ExportAssignment),
    /// `export { a, b as c } from "./m"` or `export * from "./m"`
    ExportDeclaration(ExportDeclaration),
    /// Function or class declaration, with any `export`/`default` markers
    Declaration(Declaration),
    /// `export const ...`, `export interface ...` and other exported statements
    ExportedStatement(Vec<Spanned<Atom>>),
    /// Anything else, as a token tree
    Statement(Vec<Spanned<Atom>>),
    /// A lone `;`
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportAssignment {
    /// `export =` rather than `export default`
    pub is_export_equals: bool,
    pub expression: Vec<Spanned<Atom>>,
}

impl ExportAssignment {
    /// The exported identifier when the expression is nothing but a name
    pub fn bare_identifier(&self) -> Option<&str> {
        match self.expression.as_slice() {
            [only] => match &only.node {
                Atom::Token(Token::Ident(name)) => Some(name.as_str()),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportDeclaration {
    /// `export type { ... }`
    pub type_only: bool,
    pub clause: ExportClause,
    /// Module specifier after `from`
    pub source: Option<Spanned<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportClause {
    /// `{ a, b as c }`
    Named(Vec<Spanned<ExportSpecifier>>),
    /// `*` or `* as ns`
    Namespace(Option<Spanned<Identifier>>),
}

/// One binding of a named export clause
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpecifier {
    pub local: Spanned<Identifier>,
    /// The name after `as`, when renamed
    pub exported: Option<Spanned<Identifier>>,
    pub type_only: bool,
}

impl ExportSpecifier {
    /// Name the binding is visible under to importers
    pub fn exported_name(&self) -> &Identifier {
        match &self.exported {
            Some(alias) => &alias.node,
            None => &self.local.node,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Function,
    Class,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Export,
    Default,
    Declare,
    Async,
    Abstract,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub kind: Spanned<DeclarationKind>,
    pub modifiers: Vec<Spanned<Modifier>>,
    /// Absent for `export default function () {}`
    pub name: Option<Spanned<Identifier>>,
    /// Type parameters, parameters, heritage and return type
    pub signature: Vec<Spanned<Atom>>,
    /// Absent for overload signatures and ambient declarations
    pub body: Option<Vec<Spanned<Item>>>,
}

impl Declaration {
    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.iter().any(|m| m.node == modifier)
    }

    pub fn is_exported(&self) -> bool {
        self.has_modifier(Modifier::Export)
    }

    pub fn is_default(&self) -> bool {
        self.has_modifier(Modifier::Default)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Paren,
    Bracket,
}

/// Token tree element
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Token(Token),
    /// `{ ... }`, parsed as nested items
    Block(Vec<Spanned<Item>>),
    /// `( ... )` or `[ ... ]`
    Group(Delimiter, Vec<Spanned<Atom>>),
}

impl Module {
    /// Visit every item in document order, parents before children
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Spanned<Item>)) {
        walk_items(&self.items, visit);
    }
}

fn walk_items<'a>(items: &'a [Spanned<Item>], visit: &mut impl FnMut(&'a Spanned<Item>)) {
    for item in items {
        visit(item);
        match &item.node {
            Item::ExportAssignment(assignment) => walk_atoms(&assignment.expression, visit),
            Item::Declaration(decl) => {
                walk_atoms(&decl.signature, visit);
                if let Some(body) = &decl.body {
                    walk_items(body, visit);
                }
            }
            Item::ExportedStatement(atoms) | Item::Statement(atoms) => walk_atoms(atoms, visit),
            Item::ExportDeclaration(_) | Item::Empty => {}
        }
    }
}

fn walk_atoms<'a>(atoms: &'a [Spanned<Atom>], visit: &mut impl FnMut(&'a Spanned<Item>)) {
    for atom in atoms {
        match &atom.node {
            Atom::Block(items) => walk_items(items, visit),
            Atom::Group(_, inner) => walk_atoms(inner, visit),
            Atom::Token(_) => {}
        }
    }
}
