//! Target-project definitions and the registry they are published in.
//!
//! A definition bundles a directory convention, a template set and the
//! generation hooks that turn a template context into artifact text.

use std::collections::BTreeMap;

use crate::error::ScaffoldError;
use crate::generator::path_planner::{ArtifactKind, PathConvention, PathSet};
use crate::mapping::context::{TemplateContext, BASE_KEYS};
use crate::mapping::identity::PluginIdentity;
use crate::mapping::query::MappedQuery;
use crate::template::{TemplateRenderer, TemplateStore};

/// Built-in definition generating plaso SQLite parser plugins and formatters.
pub mod plaso;
/// Python source literal helpers shared by Python-targeting definitions.
pub mod python;
/// Process-wide table of registered definitions.
pub mod registry;

pub use plaso::PlasoDefinition;
pub use registry::DefinitionRegistry;

/// Everything a definition may read while extending the template context.
#[derive(Debug, Clone, Copy)]
pub struct GenerationInput<'a> {
    /// Names derived from the plugin name.
    pub identity: &'a PluginIdentity,
    /// Planned output locations.
    pub paths: &'a PathSet,
    /// Successfully executed queries, in the order they were supplied.
    pub queries: &'a [MappedQuery],
    /// Live `CREATE` statements keyed by table name.
    pub table_schemas: &'a BTreeMap<String, String>,
}

/// Artifact producers every definition must provide.
pub trait GenerationHooks {
    /// Data-access plugin source.
    fn plugin_source(
        &self,
        context: &TemplateContext,
        renderer: &dyn TemplateRenderer,
    ) -> Result<String, ScaffoldError>;

    /// Tests of the plugin.
    fn plugin_test(
        &self,
        context: &TemplateContext,
        renderer: &dyn TemplateRenderer,
    ) -> Result<String, ScaffoldError>;

    /// Presentation/formatter source.
    fn presentation_source(
        &self,
        context: &TemplateContext,
        renderer: &dyn TemplateRenderer,
    ) -> Result<String, ScaffoldError>;

    /// Tests of the formatter.
    fn presentation_test(
        &self,
        context: &TemplateContext,
        renderer: &dyn TemplateRenderer,
    ) -> Result<String, ScaffoldError>;

    /// Line appended to the plugin package init.
    fn plugin_init_entry(&self, identity: &PluginIdentity) -> String;

    /// Line appended to the presentation package init.
    fn presentation_init_entry(&self, identity: &PluginIdentity) -> String;
}

/// A target-project convention the engine can generate artifacts for.
pub trait Definition: GenerationHooks + Send + Sync {
    /// Unique registry key.
    fn name(&self) -> &str;

    /// Directory layout of the target project.
    fn path_convention(&self) -> &PathConvention;

    /// Templates the hooks render.
    fn template_set(&self) -> &dyn TemplateStore;

    /// Namespace used to qualify generated data type tags.
    fn data_type_namespace(&self) -> &str {
        ""
    }

    /// Add definition-specific values to the base context.
    fn extend_context(&self, context: &mut TemplateContext, input: &GenerationInput<'_>);

    /// Keys that must be present before `kind` is rendered.
    fn required_keys(&self, _kind: ArtifactKind) -> Vec<&'static str> {
        BASE_KEYS.to_vec()
    }
}

/// Validate the context for `kind` and call the matching hook.
///
/// Only the four rendered kinds ([`ArtifactKind::RENDERED`]) can be produced
/// this way; the others are copies or appends built by the pipeline.
pub fn render_artifact(
    definition: &dyn Definition,
    kind: ArtifactKind,
    context: &TemplateContext,
    renderer: &dyn TemplateRenderer,
) -> Result<String, ScaffoldError> {
    context.require(kind.as_str(), &definition.required_keys(kind))?;
    match kind {
        ArtifactKind::PluginSource => definition.plugin_source(context, renderer),
        ArtifactKind::PluginTest => definition.plugin_test(context, renderer),
        ArtifactKind::PresentationSource => definition.presentation_source(context, renderer),
        ArtifactKind::PresentationTest => definition.presentation_test(context, renderer),
        ArtifactKind::SampleData | ArtifactKind::PluginInit | ArtifactKind::PresentationInit => Err(
            ScaffoldError::rendering(kind.as_str(), "artifact kind is not rendered from a template"),
        ),
    }
}
