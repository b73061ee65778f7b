//! Test File Generator - scaffold unit tests for JavaScript/TypeScript components
//!
//! This library reads a component source file, works out the name its
//! primary component is exported under, and renders a test file template
//! for it.
//!
//! # Example
//!
//! ```rust
//! use std::path::Path;
//! use test_file_generator::{render_for, Settings};
//!
//! let generated = render_for(
//!     "export default function Button() {}",
//!     Path::new("/src/components/Button.tsx"),
//!     &Settings::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(generated.component_name.as_str(), "Button");
//! assert!(generated.content.contains("import Button from '../Button';"));
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod generate;
pub mod panel;
pub mod parser;
pub mod template;

pub use config::{ConfigError, ConfigStore, MemoryConfigStore, Settings, TomlConfigStore};
pub use error::ParseError;
pub use export::{resolve, resolve_with_rules, ResolvedName, RuleSet};
pub use generate::{generate, plan, render_for, GenerateError, Generated, TestFilePlan};
pub use panel::{HostMessage, PanelHost, PanelMessage};
pub use parser::{parse, Module};
pub use template::{render, TemplateVariables, DEFAULT_TEMPLATE};
