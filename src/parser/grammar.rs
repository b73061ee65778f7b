//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::parser::ast::*;
use crate::parser::lexer::Token;

/// Parse module source code into a syntax tree
pub fn parse(input: &str) -> Result<Module, Vec<crate::ParseError>> {
    let len = input.len();

    let tokens = crate::parser::lexer::lex(input).map_err(|e| vec![e])?;
    let token_iter = tokens.into_iter().map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    module_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

/// A contextual keyword (`as`, `from`, `type`) lexed as an identifier
fn contextual<'a, I>(word: &'static str) -> impl Parser<'a, I, (), extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    any()
        .filter(move |t: &Token| matches!(t, Token::Ident(s) if s == word))
        .ignored()
}

fn modifier<'a, I>(
    token: Token,
    kind: Modifier,
) -> impl Parser<'a, I, Spanned<Modifier>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    just(token).map_with(move |_, e| Spanned::new(kind, span_range(&e.span())))
}

fn module_parser<'a, I>() -> impl Parser<'a, I, Module, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let identifier = select! {
        Token::Ident(s) => Identifier::new(s),
    }
    .map_with(|id, e| Spanned::new(id, span_range(&e.span())));

    let string_literal = select! {
        Token::Str(s) => s,
    }
    .map_with(|s, e| Spanned::new(s, span_range(&e.span())));

    // Names usable in export clauses: `default` and string names are allowed
    let export_name = choice((
        identifier.clone(),
        just(Token::Default)
            .map_with(|_, e| Spanned::new(Identifier::new("default"), span_range(&e.span()))),
        string_literal
            .clone()
            .map(|s| Spanned::new(Identifier::new(s.node), s.span)),
    ));

    let alias = contextual("as").ignore_then(export_name.clone()).or_not();

    let specifier = choice((
        contextual("type")
            .ignore_then(export_name.clone())
            .then(alias.clone())
            .map(|(local, exported)| ExportSpecifier {
                local,
                exported,
                type_only: true,
            }),
        export_name
            .clone()
            .then(alias)
            .map(|(local, exported)| ExportSpecifier {
                local,
                exported,
                type_only: false,
            }),
    ))
    .map_with(|s, e| Spanned::new(s, span_range(&e.span())));

    let from_clause = contextual("from").ignore_then(string_literal);
    let semicolon = just(Token::Semicolon).ignored();

    // `{ a, b as c } from "./m"`, optionally `type`-only
    let named_exports = contextual("type")
        .or_not()
        .then(
            specifier
                .separated_by(just(Token::Comma))
                .allow_trailing()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::BraceOpen), just(Token::BraceClose)),
        )
        .then(from_clause.clone().or_not())
        .then_ignore(semicolon.clone().or_not())
        .map(|((type_only, specifiers), source)| ExportDeclaration {
            type_only: type_only.is_some(),
            clause: ExportClause::Named(specifiers),
            source,
        });

    // `* from "./m"` or `* as ns from "./m"`
    let star_exports = just(Token::Star)
        .ignore_then(contextual("as").ignore_then(export_name).or_not())
        .then(from_clause)
        .then_ignore(semicolon.clone().or_not())
        .map(|(namespace, source)| ExportDeclaration {
            type_only: false,
            clause: ExportClause::Namespace(namespace),
            source: Some(source),
        });

    // `class extends Base {}` has no name
    let binding_name = identifier
        .clone()
        .filter(|id: &Spanned<Identifier>| !matches!(id.node.as_str(), "extends" | "implements"));

    // Recursive item parser: brace blocks hold nested items
    let item = recursive(|item| {
        let block = item
            .repeated()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::BraceOpen), just(Token::BraceClose));

        let atom = recursive(|atom| {
            let paren = atom
                .clone()
                .repeated()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::ParenOpen), just(Token::ParenClose))
                .map(|atoms| Atom::Group(Delimiter::Paren, atoms));

            let bracket = atom
                .repeated()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::BracketOpen), just(Token::BracketClose))
                .map(|atoms| Atom::Group(Delimiter::Bracket, atoms));

            let plain = any()
                .filter(|t: &Token| !t.is_delimiter())
                .map(Atom::Token);

            choice((block.clone().map(Atom::Block), paren, bracket, plain))
                .map_with(|a, e| Spanned::new(a, span_range(&e.span())))
                .boxed()
        });

        // Statements end at `;` and never swallow a following `export`
        let statement_atom = atom.clone().filter(|a: &Spanned<Atom>| {
            !matches!(
                a.node,
                Atom::Token(Token::Semicolon) | Atom::Token(Token::Export)
            )
        });

        let signature_atom = statement_atom
            .clone()
            .filter(|a: &Spanned<Atom>| !matches!(a.node, Atom::Block(_)));

        // function/class declaration, optionally async/abstract/declare
        let declaration = choice((
            modifier(Token::Declare, Modifier::Declare),
            modifier(Token::Async, Modifier::Async),
            modifier(Token::Abstract, Modifier::Abstract),
        ))
        .repeated()
        .collect::<Vec<_>>()
        .then(
            choice((
                just(Token::Function)
                    .then(just(Token::Star).or_not())
                    .to(DeclarationKind::Function),
                just(Token::Class).to(DeclarationKind::Class),
            ))
            .map_with(|k, e| Spanned::new(k, span_range(&e.span()))),
        )
        .then(binding_name.clone().or_not())
        .then(signature_atom.repeated().collect::<Vec<_>>())
        .then(block.clone().or_not())
        .then_ignore(semicolon.clone().or_not())
        .map(
            |((((modifiers, kind), name), signature), body)| Declaration {
                kind,
                modifiers,
                name,
                signature,
                body,
            },
        );

        let expression = statement_atom
            .clone()
            .repeated()
            .at_least(1)
            .collect::<Vec<_>>()
            .then_ignore(semicolon.clone().or_not());

        // Everything that may follow the `export` keyword.
        // Order matters: declarations before the catch-all exported statement.
        let export_body = choice((
            modifier(Token::Default, Modifier::Default)
                .then(declaration.clone())
                .map(|(default, mut decl)| {
                    decl.modifiers.insert(0, default);
                    Item::Declaration(decl)
                }),
            just(Token::Default)
                .ignore_then(expression.clone())
                .map(|expression| {
                    Item::ExportAssignment(ExportAssignment {
                        is_export_equals: false,
                        expression,
                    })
                }),
            just(Token::Assign)
                .ignore_then(expression.clone())
                .map(|expression| {
                    Item::ExportAssignment(ExportAssignment {
                        is_export_equals: true,
                        expression,
                    })
                }),
            named_exports.clone().map(Item::ExportDeclaration),
            star_exports.clone().map(Item::ExportDeclaration),
            declaration.clone().map(Item::Declaration),
            statement_atom
                .clone()
                .repeated()
                .collect::<Vec<_>>()
                .then_ignore(semicolon.clone().or_not())
                .map(Item::ExportedStatement),
        ));

        let export_item = modifier(Token::Export, Modifier::Export)
            .then(export_body)
            .map(|(export, item)| match item {
                Item::Declaration(mut decl) => {
                    decl.modifiers.insert(0, export);
                    Item::Declaration(decl)
                }
                other => other,
            });

        let statement = statement_atom
            .repeated()
            .at_least(1)
            .collect::<Vec<_>>()
            .then_ignore(semicolon.clone().or_not())
            .map(Item::Statement);

        choice((
            semicolon.clone().to(Item::Empty),
            export_item,
            declaration.map(Item::Declaration),
            statement,
        ))
        .map_with(|i, e| Spanned::new(i, span_range(&e.span())))
        .boxed()
    });

    // A module is a list of items
    item.repeated()
        .collect()
        .then_ignore(end())
        .map(|items| Module { items })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_declaration(input: &str) -> Declaration {
        let module = parse(input).expect("Should parse");
        assert_eq!(module.items.len(), 1, "items: {:?}", module.items);
        match &module.items[0].node {
            Item::Declaration(decl) => decl.clone(),
            other => panic!("Expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_empty_module() {
        let module = parse("").expect("Should parse");
        assert!(module.items.is_empty());
    }

    #[test]
    fn test_parse_default_function() {
        let decl = single_declaration("export default function Button() {}");
        assert_eq!(decl.kind.node, DeclarationKind::Function);
        assert_eq!(decl.name.unwrap().node.as_str(), "Button");
        assert_eq!(
            decl.modifiers.iter().map(|m| m.node).collect::<Vec<_>>(),
            vec![Modifier::Export, Modifier::Default]
        );
    }

    #[test]
    fn test_parse_anonymous_default_class() {
        let decl = single_declaration("export default class extends Base {}");
        assert_eq!(decl.kind.node, DeclarationKind::Class);
        assert!(decl.name.is_none());
        assert!(decl.is_default());
    }

    #[test]
    fn test_parse_async_generator_and_abstract() {
        let decl = single_declaration("export async function* stream() {}");
        assert!(decl.has_modifier(Modifier::Async));
        assert_eq!(decl.name.unwrap().node.as_str(), "stream");

        let decl = single_declaration("export default abstract class Shape<T> implements Drawable {}");
        assert!(decl.has_modifier(Modifier::Abstract));
        assert!(decl.is_default());
        assert_eq!(decl.name.unwrap().node.as_str(), "Shape");
    }

    #[test]
    fn test_parse_overload_signatures() {
        let module = parse(
            "export function pick(a: string): string;\n\
             export function pick(a: number): number;\n\
             export function pick(a: any) { return a }",
        )
        .expect("Should parse");
        assert_eq!(module.items.len(), 3);
        match &module.items[0].node {
            Item::Declaration(decl) => assert!(decl.body.is_none()),
            other => panic!("Expected declaration, got {:?}", other),
        }
        match &module.items[2].node {
            Item::Declaration(decl) => assert!(decl.body.is_some()),
            other => panic!("Expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_export_default_identifier() {
        let module = parse("export default Foo;").expect("Should parse");
        match &module.items[0].node {
            Item::ExportAssignment(a) => {
                assert!(!a.is_export_equals);
                assert_eq!(a.bare_identifier(), Some("Foo"));
            }
            other => panic!("Expected export assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_export_equals() {
        let module = parse("export = Widget").expect("Should parse");
        match &module.items[0].node {
            Item::ExportAssignment(a) => {
                assert!(a.is_export_equals);
                assert_eq!(a.bare_identifier(), Some("Widget"));
            }
            other => panic!("Expected export assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_export_default_call_is_not_bare() {
        let module = parse("export default connect(mapState)(Panel);").expect("Should parse");
        match &module.items[0].node {
            Item::ExportAssignment(a) => assert_eq!(a.bare_identifier(), None),
            other => panic!("Expected export assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_export_default_without_semicolon() {
        let module = parse("export default Foo\nFoo.displayName = 'Foo'").expect("Should parse");
        assert_eq!(module.items.len(), 2);
        match &module.items[0].node {
            Item::ExportAssignment(a) => assert_eq!(a.bare_identifier(), Some("Foo")),
            other => panic!("Expected export assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_named_exports() {
        let module = parse("export { Bar, Baz as Qux, default as Main } from './things';")
            .expect("Should parse");
        match &module.items[0].node {
            Item::ExportDeclaration(d) => {
                assert_eq!(d.source.as_ref().unwrap().node, "./things");
                match &d.clause {
                    ExportClause::Named(specs) => {
                        let names: Vec<_> = specs
                            .iter()
                            .map(|s| s.node.exported_name().as_str().to_string())
                            .collect();
                        assert_eq!(names, vec!["Bar", "Qux", "Main"]);
                    }
                    other => panic!("Expected named clause, got {:?}", other),
                }
            }
            other => panic!("Expected export declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_type_only_exports() {
        let module = parse("export type { Props, type State };").expect("Should parse");
        match &module.items[0].node {
            Item::ExportDeclaration(d) => {
                assert!(d.type_only);
                match &d.clause {
                    ExportClause::Named(specs) => {
                        assert!(!specs[0].node.type_only);
                        assert!(specs[1].node.type_only);
                    }
                    other => panic!("Expected named clause, got {:?}", other),
                }
            }
            other => panic!("Expected export declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_star_exports() {
        let module = parse("export * from './a'\nexport * as b from './b'").expect("Should parse");
        assert_eq!(module.items.len(), 2);
        match &module.items[1].node {
            Item::ExportDeclaration(d) => match &d.clause {
                ExportClause::Namespace(Some(ns)) => assert_eq!(ns.node.as_str(), "b"),
                other => panic!("Expected namespace clause, got {:?}", other),
            },
            other => panic!("Expected export declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_exported_statement() {
        let module = parse("export const Button = () => <button>{label}</button>;")
            .expect("Should parse");
        assert!(matches!(module.items[0].node, Item::ExportedStatement(_)));
    }

    #[test]
    fn test_parse_decorated_class() {
        let module = parse("@Component({ selector: 'app' })\nexport default class App {}")
            .expect("Should parse");
        assert_eq!(module.items.len(), 2);
        assert!(matches!(module.items[0].node, Item::Statement(_)));
        match &module.items[1].node {
            Item::Declaration(decl) => assert_eq!(decl.name.as_ref().unwrap().node.as_str(), "App"),
            other => panic!("Expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_nested_blocks_are_items() {
        let module = parse("declare module 'x' { export default function Inner(): void; }")
            .expect("Should parse");
        let mut names = Vec::new();
        module.walk(&mut |item| {
            if let Item::Declaration(decl) = &item.node {
                names.push(decl.name.as_ref().unwrap().node.as_str().to_string());
            }
        });
        assert_eq!(names, vec!["Inner"]);
    }

    #[test]
    fn test_parse_jsx_component() {
        let input = r#"
            import React from 'react';

            type Props = { label: string };

            export default function Button({ label }: Props) {
                const onClick = () => console.log(`clicked ${label}`);
                return (
                    <button className="btn" onClick={onClick}>
                        Don't {label}
                    </button>
                );
            }
        "#;
        let module = parse(input).expect("Should parse");
        assert_eq!(module.items.len(), 3);
        assert!(matches!(module.items[2].node, Item::Declaration(_)));
    }

    #[test]
    fn test_parse_unbalanced_braces_is_error() {
        let errs = parse("export default function Broken() {").unwrap_err();
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs[0], crate::ParseError::Syntax { .. }));
    }

    #[test]
    fn test_parse_mismatched_delimiter_is_error() {
        assert!(parse("foo(bar];").is_err());
        assert!(parse("}").is_err());
    }

    #[test]
    fn test_parse_lexical_error_is_reported() {
        let errs = parse("/* open").unwrap_err();
        assert!(matches!(errs[0], crate::ParseError::Lexical { .. }));
    }
}
