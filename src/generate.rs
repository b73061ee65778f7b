//! Test file generation
//!
//! Ties the pieces together: read a component source file, resolve its
//! exported name, render the configured template and write the result next
//! to the source in the configured test directory.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, ConfigStore, Settings};
use crate::error::ParseError;
use crate::export::{resolve_with_rules, ResolvedName};
use crate::template::{render, unknown_placeholders, TemplateVariables};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Source path has no file name: {}", .0.display())]
    InvalidSourcePath(PathBuf),
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {}: {error}", path.display())]
    Parse {
        path: PathBuf,
        text: String,
        error: ParseError,
    },
    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GenerateError {
    /// Diagnostic for the user; parse errors get a source excerpt
    pub fn report(&self) -> String {
        match self {
            GenerateError::Parse { path, text, error } => {
                error.format(text, &path.display().to_string())
            }
            other => other.to_string(),
        }
    }
}

/// Where a test file goes and how it refers back to its source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFilePlan {
    pub source_path: PathBuf,
    /// Source base name without extension
    pub file_name: String,
    pub test_dir: PathBuf,
    pub test_file: PathBuf,
    /// Import specifier from `test_dir` to the source, e.g. `../Button`
    pub component_path: String,
}

/// A rendered (and possibly written) test file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub plan: TestFilePlan,
    pub component_name: ResolvedName,
    pub content: String,
}

/// Work out the test file location for `source_path`
pub fn plan(source_path: &Path, settings: &Settings) -> Result<TestFilePlan, GenerateError> {
    let file_name = source_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| GenerateError::InvalidSourcePath(source_path.to_path_buf()))?;

    let source_dir = source_path.parent().unwrap_or(Path::new(""));
    // Always below the source directory, even when configured as `/tests`
    let test_path: PathBuf = Path::new(&settings.test_file_path)
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect();
    let test_dir = source_dir.join(test_path);
    let test_file = test_dir.join(format!("{}.{}", file_name, settings.test_file_extension));
    let component_path = import_path(&test_dir, &source_path.with_extension(""));

    Ok(TestFilePlan {
        source_path: source_path.to_path_buf(),
        file_name,
        test_dir,
        test_file,
        component_path,
    })
}

/// Resolve and render without touching the file system
pub fn render_for(
    source_text: &str,
    source_path: &Path,
    settings: &Settings,
) -> Result<Generated, GenerateError> {
    let plan = plan(source_path, settings)?;
    let component_name = resolve_with_rules(source_text, source_path, settings.resolution)
        .map_err(|error| GenerateError::Parse {
            path: source_path.to_path_buf(),
            text: source_text.to_string(),
            error,
        })?;
    debug!(name = %component_name, origin = ?component_name.origin, "component resolved");

    let variables = TemplateVariables::for_component(component_name.as_str(), &plan.component_path)
        .with_file_name(&plan.file_name);
    for name in unknown_placeholders(&settings.test_template, &variables) {
        warn!("template placeholder ${{{}}} has no value and is left as is", name);
    }

    let content = render(&settings.test_template, &variables);
    Ok(Generated {
        plan,
        component_name,
        content,
    })
}

/// Generate the test file for `source_path`, overwriting any existing one
pub fn generate(source_path: &Path, settings: &Settings) -> Result<Generated, GenerateError> {
    if source_path.file_name().is_none() {
        return Err(GenerateError::InvalidSourcePath(source_path.to_path_buf()));
    }

    let text = std::fs::read_to_string(source_path).map_err(|source| GenerateError::Read {
        path: source_path.to_path_buf(),
        source,
    })?;
    let generated = render_for(&text, source_path, settings)?;
    let plan = &generated.plan;

    if !plan.test_dir.as_os_str().is_empty() && !plan.test_dir.exists() {
        debug!(dir = %plan.test_dir.display(), "creating test directory");
        std::fs::create_dir_all(&plan.test_dir).map_err(|source| GenerateError::CreateDir {
            path: plan.test_dir.clone(),
            source,
        })?;
    }

    std::fs::write(&plan.test_file, &generated.content).map_err(|source| {
        GenerateError::Write {
            path: plan.test_file.clone(),
            source,
        }
    })?;
    info!(file = %plan.test_file.display(), component = %generated.component_name, "test file written");

    Ok(generated)
}

/// Generate with settings loaded from `store`
pub fn generate_with_store(
    source_path: &Path,
    store: &impl ConfigStore,
) -> Result<Generated, GenerateError> {
    let settings = store.load()?;
    generate(source_path, &settings)
}

/// Slash-separated import specifier from directory `from` to file `to`
///
/// Relative paths are taken against the working directory first.
fn import_path(from: &Path, to: &Path) -> String {
    let from = normalize(&absolute(from));
    let to = normalize(&absolute(to));

    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to.components().collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut segments: Vec<String> = vec!["..".to_string(); from.len() - common];
    segments.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );

    let joined = segments.join("/");
    if joined.starts_with('.') {
        joined
    } else {
        format!("./{}", joined)
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Resolve `.` and `..` without consulting the file system
fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.iter().collect()
}
