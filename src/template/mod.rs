//! Template rendering port.
//!
//! The engine only builds [`TemplateContext`] values; storage and syntax of
//! templates live behind [`TemplateStore`] and [`TemplateRenderer`].

use std::collections::BTreeMap;

use crate::error::ScaffoldError;
use crate::mapping::context::TemplateContext;

/// `{{ key }}` placeholder engine.
pub mod placeholder;

pub use placeholder::PlaceholderRenderer;

/// Keyed lookup of template text.
pub trait TemplateStore: Send + Sync {
    /// Template text stored under `key`.
    fn template(&self, key: &str) -> Option<&str>;

    /// Every available key, sorted.
    fn keys(&self) -> Vec<&str>;
}

/// Renders a named template against a context.
pub trait TemplateRenderer {
    /// Render `template_key`; failures are reported as
    /// [`ScaffoldError::TemplateRenderingFailed`].
    fn render(&self, template_key: &str, context: &TemplateContext) -> Result<String, ScaffoldError>;
}

/// In-memory [`TemplateStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateSet {
    templates: BTreeMap<String, String>,
}

impl TemplateSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`TemplateSet::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(key, text);
        self
    }

    /// Add or replace a template.
    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.templates.insert(key.into(), text.into());
    }
}

impl TemplateStore for TemplateSet {
    fn template(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(String::as_str)
    }

    fn keys(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }
}
