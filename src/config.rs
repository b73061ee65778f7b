//! Generator settings and where they are stored
//!
//! Settings use the same camelCase keys on disk (TOML) as on the settings
//! panel protocol (JSON). Missing values, an empty extension or directory,
//! and a template that is not a string fall back to the defaults, so a
//! partially filled file or form is always usable.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::export::RuleSet;
use crate::template::DEFAULT_TEMPLATE;

/// File looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "testgen.toml";

pub const DEFAULT_TEST_FILE_EXTENSION: &str = "test.tsx";
pub const DEFAULT_TEST_FILE_PATH: &str = "__tests__";

/// Errors that can occur when loading or saving settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write config file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Effective settings, every field filled in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Appended to the source base name, e.g. `test.tsx`
    pub test_file_extension: String,
    /// Directory for test files, relative to the source file's directory
    pub test_file_path: String,
    pub test_template: String,
    pub resolution: RuleSet,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            test_file_extension: DEFAULT_TEST_FILE_EXTENSION.to_string(),
            test_file_path: DEFAULT_TEST_FILE_PATH.to_string(),
            test_template: DEFAULT_TEMPLATE.to_string(),
            resolution: RuleSet::default(),
        }
    }
}

/// Settings as written by a user, before defaults are applied
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSettings {
    pub test_file_extension: Option<String>,
    pub test_file_path: Option<String>,
    pub test_template: Option<TemplateValue>,
    pub resolution: Option<RuleSet>,
}

/// A configured template; anything but a string is ignored
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TemplateValue {
    Text(String),
    Other(serde_json::Value),
}

impl Settings {
    /// Fill in defaults for missing or ill-typed values and for an empty
    /// extension or directory. An empty template is kept.
    pub fn from_raw(raw: RawSettings) -> Self {
        let defaults = Settings::default();
        let non_empty = |value: Option<String>, default: String| match value {
            Some(v) if !v.is_empty() => v,
            _ => default,
        };

        let test_template = match raw.test_template {
            Some(TemplateValue::Text(text)) => text,
            Some(TemplateValue::Other(value)) => {
                debug!(?value, "ignoring non-string testTemplate");
                defaults.test_template
            }
            None => defaults.test_template,
        };

        Settings {
            test_file_extension: non_empty(raw.test_file_extension, defaults.test_file_extension),
            test_file_path: non_empty(raw.test_file_path, defaults.test_file_path),
            test_template,
            resolution: raw.resolution.unwrap_or(defaults.resolution),
        }
    }

    /// Load settings from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawSettings = toml::from_str(content)?;
        Ok(Self::from_raw(raw))
    }

    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Per-invocation replacements for stored settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub test_file_extension: Option<String>,
    pub test_file_path: Option<String>,
    pub test_template: Option<String>,
    pub resolution: Option<RuleSet>,
}

impl Overrides {
    pub fn apply(self, mut settings: Settings) -> Settings {
        if let Some(ext) = self.test_file_extension {
            settings.test_file_extension = ext;
        }
        if let Some(path) = self.test_file_path {
            settings.test_file_path = path;
        }
        if let Some(template) = self.test_template {
            settings.test_template = template;
        }
        if let Some(rules) = self.resolution {
            settings.resolution = rules;
        }
        settings
    }
}

/// Where settings are read from and written to
pub trait ConfigStore {
    fn load(&self) -> Result<Settings, ConfigError>;
    fn save(&mut self, settings: &Settings) -> Result<(), ConfigError>;
}

/// Settings kept in a TOML file
#[derive(Debug, Clone)]
pub struct TomlConfigStore {
    path: PathBuf,
}

impl TomlConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for TomlConfigStore {
    fn load(&self) -> Result<Settings, ConfigError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "config file not found, using defaults");
            return Ok(Settings::default());
        }
        Settings::from_file(&self.path)
    }

    fn save(&mut self, settings: &Settings) -> Result<(), ConfigError> {
        let content = settings.to_toml()?;
        let write_err = |source: std::io::Error| ConfigError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(&self.path, content).map_err(write_err)?;
        debug!(path = %self.path.display(), "config saved");
        Ok(())
    }
}

/// Settings held in memory for the life of the process
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    settings: Settings,
}

impl MemoryConfigStore {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Result<Settings, ConfigError> {
        Ok(self.settings.clone())
    }

    fn save(&mut self, settings: &Settings) -> Result<(), ConfigError> {
        self.settings = settings.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.test_file_extension, "test.tsx");
        assert_eq!(settings.test_file_path, "__tests__");
        assert_eq!(settings.test_template, DEFAULT_TEMPLATE);
        assert_eq!(settings.resolution, RuleSet::Strict);
    }

    #[test]
    fn test_parse_camel_case_keys() {
        let toml = r#"
testFileExtension = "spec.ts"
testFilePath = "tests"
testTemplate = "describe('${componentName}')"
resolution = "permissive"
"#;
        let settings = Settings::from_str(toml).unwrap();
        assert_eq!(settings.test_file_extension, "spec.ts");
        assert_eq!(settings.test_file_path, "tests");
        assert_eq!(settings.test_template, "describe('${componentName}')");
        assert_eq!(settings.resolution, RuleSet::Permissive);
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(Settings::from_str("").unwrap(), Settings::default());
    }

    #[test]
    fn test_empty_extension_and_path_fall_back() {
        let settings =
            Settings::from_str("testFileExtension = \"\"\ntestFilePath = \"\"").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_empty_template_is_kept() {
        let settings = Settings::from_str("testTemplate = \"\"").unwrap();
        assert_eq!(settings.test_template, "");
        assert_eq!(settings.test_file_extension, DEFAULT_TEST_FILE_EXTENSION);

        let reloaded = Settings::from_str(&settings.to_toml().unwrap()).unwrap();
        assert_eq!(reloaded, settings);
    }

    #[test]
    fn test_non_string_template_falls_back() {
        let settings = Settings::from_str("testTemplate = 42").unwrap();
        assert_eq!(settings.test_template, DEFAULT_TEMPLATE);

        let settings = Settings::from_str("[testTemplate]\nbody = \"x\"").unwrap();
        assert_eq!(settings.test_template, DEFAULT_TEMPLATE);
    }

    #[test]
    fn test_unknown_resolution_is_error() {
        let err = Settings::from_str("resolution = \"loose\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_toml_roundtrip() {
        let settings = Settings {
            test_file_extension: "spec.jsx".to_string(),
            ..Settings::default()
        };
        let text = settings.to_toml().unwrap();
        assert!(text.contains("testFileExtension = \"spec.jsx\""));
        assert_eq!(Settings::from_str(&text).unwrap(), settings);
    }

    #[test]
    fn test_overrides() {
        let overrides = Overrides {
            test_file_path: Some("spec".to_string()),
            resolution: Some(RuleSet::Permissive),
            ..Overrides::default()
        };
        let settings = overrides.apply(Settings::default());
        assert_eq!(settings.test_file_path, "spec");
        assert_eq!(settings.test_file_extension, "test.tsx");
        assert_eq!(settings.resolution, RuleSet::Permissive);
    }

    #[test]
    fn test_toml_store_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlConfigStore::new(dir.path().join("missing.toml"));
        assert_eq!(store.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_toml_store_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TomlConfigStore::new(dir.path().join("nested/testgen.toml"));
        let settings = Settings {
            test_file_path: "spec".to_string(),
            ..Settings::default()
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn test_toml_store_read_error_has_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlConfigStore::new(dir.path());
        let err = store.load().unwrap_err();
        assert!(matches!(err, ConfigError::Read { ref path, .. } if path == dir.path()));
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryConfigStore::default();
        let settings = Settings {
            resolution: RuleSet::Permissive,
            ..Settings::default()
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);
    }
}
