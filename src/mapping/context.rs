use serde::Serialize;

use crate::error::ScaffoldError;
use crate::mapping::identity::PluginIdentity;
use crate::mapping::query::MappedQuery;

/// Keys every base context provides, whatever the definition.
pub const BASE_KEYS: [&str; 7] = [
    "plugin_name",
    "class_name",
    "file_name",
    "data_type",
    "sample_data_file",
    "query_names",
    "attributes",
];

/// A context value: plain text, or lines rendered joined by `\n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ContextValue {
    /// Substituted verbatim.
    Text(String),
    /// Substituted one entry per line.
    List(Vec<String>),
}

impl ContextValue {
    /// Text substituted for a placeholder.
    pub fn render(&self) -> String {
        match self {
            ContextValue::Text(text) => text.clone(),
            ContextValue::List(lines) => lines.join("\n"),
        }
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Text(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Text(value.to_string())
    }
}

impl From<Vec<String>> for ContextValue {
    fn from(value: Vec<String>) -> Self {
        ContextValue::List(value)
    }
}

/// Flat, insertion-ordered mapping handed to the template renderer.
///
/// Re-inserting a key replaces its value in place, so iteration order only
/// depends on the order keys were first inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateContext {
    entries: Vec<(String, ContextValue)>,
}

impl TemplateContext {
    /// Empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    /// True when `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContextValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no keys are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check that every key in `keys` is present before rendering `template`.
    pub fn require(&self, template: &str, keys: &[&str]) -> Result<(), ScaffoldError> {
        let missing: Vec<&str> = keys
            .iter()
            .copied()
            .filter(|key| !self.contains_key(key))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ScaffoldError::rendering(
                template,
                format!("missing context keys: {}", missing.join(", ")),
            ))
        }
    }
}

impl<K: Into<String>, V: Into<ContextValue>> Extend<(K, V)> for TemplateContext {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

/// Build the definition-independent part of the context.
///
/// `attributes` lists `query.identifier: type` lines in query order, then
/// declaration order.
pub fn base_context(
    identity: &PluginIdentity,
    sample_data_file: &str,
    queries: &[MappedQuery],
) -> TemplateContext {
    let mut context = TemplateContext::new();
    context.insert("plugin_name", identity.raw_name.as_str());
    context.insert("class_name", identity.class_name_stem.as_str());
    context.insert("file_name", identity.file_name_stem.as_str());
    context.insert("data_type", identity.data_type_tag.as_str());
    context.insert("sample_data_file", sample_data_file);
    context.insert(
        "query_names",
        queries.iter().map(|q| q.name.clone()).collect::<Vec<_>>(),
    );
    context.insert(
        "attributes",
        queries
            .iter()
            .flat_map(|q| {
                q.model
                    .iter()
                    .map(move |a| format!("{}.{}: {}", q.identifier, a.identifier, a.target_type))
            })
            .collect::<Vec<_>>(),
    );
    context
}
