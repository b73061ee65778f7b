//! Values available to test file templates

use std::collections::BTreeMap;

/// Name of the component the test is for
pub const COMPONENT_NAME: &str = "componentName";
/// Import path from the test file to the component, without extension
pub const COMPONENT_PATH: &str = "componentPath";
/// File name of the component, without extension
pub const FILE_NAME: &str = "fileName";

/// Mapping from placeholder keys to replacement text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVariables {
    values: BTreeMap<String, String>,
}

impl TemplateVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Variables for a component's name and import path
    pub fn for_component(name: impl Into<String>, path: impl Into<String>) -> Self {
        let mut vars = Self::new();
        vars.insert(COMPONENT_NAME, name);
        vars.insert(COMPONENT_PATH, path);
        vars
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.insert(FILE_NAME, file_name);
        self
    }

    /// Set a value, returning the one it replaced
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TemplateVariables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut vars = Self::new();
        for (key, value) in iter {
            vars.insert(key, value);
        }
        vars
    }
}
