//! Integration tests for export resolution on realistic component files

use std::path::Path;

use pretty_assertions::assert_eq;
use test_file_generator::export::{collect_candidates, CandidateKind, NameOrigin};
use test_file_generator::{parse, resolve, resolve_with_rules, RuleSet};

fn name(source: &str, path: &str) -> String {
    resolve(source, Path::new(path))
        .expect("Should resolve")
        .name
}

#[test]
fn test_react_function_component() {
    let source = r#"
import React, { useState } from 'react';
import styles from './Counter.module.css';

interface CounterProps {
    initial?: number;
    onChange?: (value: number) => void;
}

export default function Counter({ initial = 0, onChange }: CounterProps) {
    const [count, setCount] = useState(initial);

    function increment() {
        setCount(count + 1);
        onChange?.(count + 1);
    }

    return (
        <div className={styles.counter}>
            <span>{count}</span>
            <button onClick={increment}>+</button>
        </div>
    );
}
"#;
    let resolved = resolve(source, Path::new("src/Counter.tsx")).unwrap();
    assert_eq!(resolved.name, "Counter");
    assert_eq!(
        resolved.origin,
        NameOrigin::Export(CandidateKind::DefaultFunctionOrClass)
    );
}

#[test]
fn test_arrow_component_with_default_identifier() {
    let source = r#"
import React from 'react'

const Avatar = ({ src, alt }) => {
  return <img src={src} alt={alt} />
}

Avatar.defaultProps = {
  alt: ''
}

export default Avatar
"#;
    assert_eq!(name(source, "src/components/avatar.jsx"), "Avatar");
}

#[test]
fn test_class_component() {
    let source = r#"
import { Component } from 'react';

export default class Modal extends Component<ModalProps, ModalState> {
    state = { open: false };

    toggle = () => this.setState({ open: !this.state.open });

    render() {
        return this.state.open ? <div className="modal">{this.props.children}</div> : null;
    }
}
"#;
    assert_eq!(name(source, "Modal.tsx"), "Modal");
}

#[test]
fn test_barrel_file_uses_first_named_binding() {
    let source = r#"
export { Tabs, TabList } from './Tabs';
export type { TabsProps } from './Tabs';
"#;
    // The type-only clause comes last and wins
    assert_eq!(name(source, "src/tabs/index.ts"), "TabsProps");
}

#[test]
fn test_named_clause_after_default_wins() {
    let source = r#"
export default function Primary() {}
function helper() {}
export { helper };
"#;
    assert_eq!(name(source, "Primary.tsx"), "helper");
}

#[test]
fn test_hoc_wrapped_default_falls_back() {
    let source = r#"
const Profile = (props) => <section>{props.name}</section>;
export default connect(mapStateToProps)(Profile);
"#;
    let resolved = resolve(source, Path::new("/app/views/UserProfile.jsx")).unwrap();
    assert_eq!(resolved.name, "UserProfile");
    assert_eq!(resolved.origin, NameOrigin::FileName);
}

#[test]
fn test_commonjs_style_export_equals() {
    let source = "class Legacy {}\nexport = Legacy;\n";
    assert_eq!(name(source, "legacy.ts"), "Legacy");
}

#[test]
fn test_only_named_declarations() {
    let source = r#"
export function useToggle(initial: boolean) {
    return useState(initial);
}

export const TOGGLE_DELAY = 200;
"#;
    assert_eq!(name(source, "hooks/useToggle.ts"), "useToggle");

    let permissive =
        resolve_with_rules(source, Path::new("hooks/useToggle.ts"), RuleSet::Permissive).unwrap();
    assert_eq!(
        permissive.origin,
        NameOrigin::Export(CandidateKind::NamedExport)
    );
}

#[test]
fn test_permissive_last_declaration_wins() {
    let source = r#"
export function Header() {}
export class Footer {}
"#;
    let path = Path::new("layout.tsx");
    assert_eq!(resolve(source, path).unwrap().name, "layout");
    assert_eq!(
        resolve_with_rules(source, path, RuleSet::Permissive)
            .unwrap()
            .name,
        "Footer"
    );
}

#[test]
fn test_candidate_order_across_nesting() {
    let source = r#"
declare module 'widgets' {
    export default function Inner(): void;
}
export default Outer;
"#;
    let module = parse(source).unwrap();
    let names: Vec<_> = collect_candidates(&module, RuleSet::Strict)
        .into_iter()
        .map(|c| (c.kind, c.name))
        .collect();
    assert_eq!(
        names,
        vec![
            (CandidateKind::DefaultFunctionOrClass, Some("Inner".to_string())),
            (
                CandidateKind::DefaultIdentifierAssignment,
                Some("Outer".to_string())
            ),
        ]
    );
}

#[test]
fn test_source_without_exports() {
    assert_eq!(name("console.log('hello');", "/scripts/setup.test.js"), "setup.test");
    assert_eq!(name("", "/a/b/Widget.tsx"), "Widget");
}

#[test]
fn test_unbalanced_source_is_error() {
    let source = "export default function Broken() {\n  return (\n";
    let err = resolve(source, Path::new("Broken.tsx")).unwrap_err();
    let report = err.format(source, "Broken.tsx");
    assert!(report.contains("Broken.tsx"));
}

#[test]
fn test_apostrophe_in_jsx_text() {
    let source =
        "export default function Status({ error }) {\n  return <div>{error && <p>Can't load</p>}</div>;\n}\n";
    assert_eq!(name(source, "/src/Comp.tsx"), "Status");
}

#[test]
fn test_url_in_jsx_text() {
    let source = r#"
export default function Link({ show }) {
  return (
    <footer>
      {show && <p>Visit https://example.com</p>}
    </footer>
  );
}
"#;
    assert_eq!(name(source, "/src/Comp.tsx"), "Link");
}

#[test]
fn test_regex_literals_with_delimiters() {
    let sources = [
        "const re = /\\{/g;\nexport default function Button() {}",
        "const re = /[(]/;\nexport default function Button() {}",
        "const clean = (s) => s.replace(/'/g, \"\");\nexport default function Button() {}",
    ];
    for source in sources {
        assert_eq!(name(source, "/src/Comp.tsx"), "Button", "source: {}", source);
    }
}

#[test]
fn test_nested_template_literal_with_brace() {
    let source = "const c = `a ${x ? `{` : ''} b`;\nexport default function Button() {}";
    assert_eq!(name(source, "/src/Comp.tsx"), "Button");
}

#[test]
fn test_generic_arrow_in_plain_typescript() {
    let source = "const first = <T>(items: T[]) => items[0];\nexport default first;\n";
    assert_eq!(name(source, "src/first.ts"), "first");
}
