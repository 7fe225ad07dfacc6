use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::definition::{render_artifact, Definition, GenerationInput};
use crate::error::ScaffoldError;
use crate::executor::result::QueryResult;
use crate::executor::QueryExecutor;
use crate::generator::path_planner::{ArtifactKind, PathSet};
use crate::mapping::context::base_context;
use crate::mapping::identity::PluginIdentity;
use crate::mapping::query::{MappedQuery, NamedQuery};
use crate::parser::read_only::check_read_only;
use crate::template::PlaceholderRenderer;

/// Sample database suffix used when the database path has no extension.
pub const DEFAULT_DATABASE_SUFFIX: &str = "db";

/// Inputs of one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    /// Plugin name as entered by the user.
    pub plugin_name: String,
    /// Sample database the queries run against.
    pub database_path: PathBuf,
    /// Named queries, in the order their artifacts should list them.
    pub queries: Vec<NamedQuery>,
    /// Root of the target project.
    pub project_root: PathBuf,
    /// Skip the read-only check before executing queries.
    pub allow_mutating_queries: bool,
}

impl GenerationRequest {
    /// Request without queries.
    pub fn new(
        plugin_name: impl Into<String>,
        database_path: impl Into<PathBuf>,
        project_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            database_path: database_path.into(),
            queries: Vec::new(),
            project_root: project_root.into(),
            allow_mutating_queries: false,
        }
    }

    /// Append a named query.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, sql: impl Into<String>) -> Self {
        self.queries.push(NamedQuery::new(name, sql));
        self
    }

    /// Extension of the database file, or [`DEFAULT_DATABASE_SUFFIX`].
    pub fn database_suffix(&self) -> String {
        self.database_path
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .unwrap_or(DEFAULT_DATABASE_SUFFIX)
            .to_string()
    }
}

/// What to do at an artifact's path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum ArtifactContent {
    /// Write this text, replacing any existing file.
    Create(String),
    /// Copy this file.
    Copy(PathBuf),
    /// Append this entry unless the file already contains it.
    Append(String),
}

/// One produced output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Which output this is.
    pub kind: ArtifactKind,
    /// Planned location.
    pub path: PathBuf,
    /// Content or action.
    pub content: ArtifactContent,
}

/// Result of producing one artifact; failures never affect siblings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactOutcome {
    /// Which output was attempted.
    pub kind: ArtifactKind,
    /// Planned location.
    pub path: PathBuf,
    /// The artifact, or why it could not be produced.
    pub result: Result<Artifact, ScaffoldError>,
}

/// Execution result of one named query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    /// Name as supplied.
    pub name: String,
    /// Columns and samples, or the contained error.
    pub result: QueryResult,
}

/// Everything one generation run produced.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    /// Name of the definition used.
    pub definition: String,
    /// Names derived from the plugin name.
    pub identity: PluginIdentity,
    /// Planned output locations.
    pub paths: PathSet,
    /// Every query, successful or not, in input order.
    pub queries: Vec<QueryOutcome>,
    /// Queries that executed and produced at least one column.
    pub mapped: Vec<MappedQuery>,
    /// One outcome per artifact; empty when no query could be mapped.
    pub artifacts: Vec<ArtifactOutcome>,
}

impl GenerationReport {
    /// Successfully produced artifacts, in generation order.
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().ok())
    }

    /// Artifacts that could not be produced.
    pub fn failed_artifacts(&self) -> impl Iterator<Item = &ArtifactOutcome> {
        self.artifacts.iter().filter(|outcome| outcome.result.is_err())
    }

    /// Queries whose execution failed.
    pub fn failed_queries(&self) -> impl Iterator<Item = &QueryOutcome> {
        self.queries.iter().filter(|outcome| !outcome.result.succeeded)
    }

    /// True when every query and every artifact succeeded.
    pub fn is_complete(&self) -> bool {
        !self.artifacts.is_empty()
            && self.failed_artifacts().next().is_none()
            && self.failed_queries().next().is_none()
    }
}

/// Run one generation: connect, execute and map every query, plan the paths
/// and produce every artifact.
///
/// Only a connection failure aborts the run. Query failures are recorded in
/// [`GenerationReport::queries`] and rendering failures in the outcome of the
/// artifact concerned. When no query can be mapped, no artifact is produced.
pub fn run(
    executor: &mut dyn QueryExecutor,
    definition: &dyn Definition,
    request: &GenerationRequest,
) -> Result<GenerationReport, ScaffoldError> {
    info!(
        plugin = %request.plugin_name,
        definition = definition.name(),
        database = %request.database_path.display(),
        queries = request.queries.len(),
        "starting generation"
    );

    if !executor.try_connect(&request.database_path) {
        return Err(executor
            .connection_error()
            .cloned()
            .unwrap_or_else(|| ScaffoldError::ConnectionFailed {
                path: request.database_path.display().to_string(),
                reason: "unable to open database".to_string(),
            }));
    }

    let queries: Vec<QueryOutcome> = request
        .queries
        .iter()
        .map(|query| QueryOutcome {
            name: query.name.clone(),
            result: execute(&*executor, query, request.allow_mutating_queries),
        })
        .collect();

    let mut mapped: Vec<MappedQuery> = queries
        .iter()
        .filter(|outcome| outcome.result.succeeded)
        .filter_map(|outcome| {
            if outcome.result.columns.is_empty() {
                warn!(query = %outcome.name, "query returned no columns, skipping");
                return None;
            }
            Some(MappedQuery::new(&outcome.name, outcome.result.clone()))
        })
        .collect();
    disambiguate(&mut mapped);

    let identity = PluginIdentity::derive(&request.plugin_name, definition.data_type_namespace());
    let paths = definition.path_convention().plan(
        &request.project_root,
        &identity,
        &request.database_suffix(),
    );

    let mut report = GenerationReport {
        definition: definition.name().to_string(),
        identity,
        paths,
        queries,
        mapped,
        artifacts: Vec::new(),
    };

    if report.mapped.is_empty() {
        warn!(plugin = %request.plugin_name, "no query could be mapped, nothing to generate");
        return Ok(report);
    }

    let table_schemas = executor.table_schemas().unwrap_or_else(|err| {
        warn!(error = %err, "unable to read table schemas");
        BTreeMap::new()
    });
    report.artifacts = produce_artifacts(definition, request, &report, &table_schemas);

    info!(
        plugin = %report.identity.raw_name,
        produced = report.artifacts().count(),
        failed = report.failed_artifacts().count(),
        "generation finished"
    );
    Ok(report)
}

/// Suffix later queries whose name stems collide with an earlier query, so
/// every query gets its own generated types and callbacks.
fn disambiguate(queries: &mut [MappedQuery]) {
    let mut identifiers = HashSet::new();
    let mut class_names = HashSet::new();
    for query in queries.iter_mut() {
        let mut identifier = query.identifier.clone();
        let mut class_name = query.class_name_stem.clone();
        let mut suffix = 2usize;
        while identifiers.contains(&identifier)
            || class_names.contains(&class_name.to_ascii_lowercase())
        {
            identifier = format!("{}_{suffix}", query.identifier);
            class_name = format!("{}{suffix}", query.class_name_stem);
            suffix += 1;
        }
        if identifier != query.identifier {
            warn!(
                query = %query.name,
                identifier = %identifier,
                "query name collides with an earlier query, renamed"
            );
        }
        identifiers.insert(identifier.clone());
        class_names.insert(class_name.to_ascii_lowercase());
        query.identifier = identifier;
        query.class_name_stem = class_name;
    }
}

fn execute(executor: &dyn QueryExecutor, query: &NamedQuery, allow_mutating: bool) -> QueryResult {
    if !allow_mutating {
        if let Err(err) = check_read_only(&query.sql) {
            warn!(query = %query.name, error = %err, "rejected query");
            return QueryResult::failure(query.sql.as_str(), err);
        }
    }
    let result = executor.execute_detailed(&query.sql);
    if result.succeeded {
        debug!(
            query = %query.name,
            columns = result.columns.len(),
            rows = result.rows.len(),
            "query mapped"
        );
    } else {
        warn!(
            query = %query.name,
            error = %result.error_message().unwrap_or_default(),
            "query failed"
        );
    }
    result
}

fn produce_artifacts(
    definition: &dyn Definition,
    request: &GenerationRequest,
    report: &GenerationReport,
    table_schemas: &BTreeMap<String, String>,
) -> Vec<ArtifactOutcome> {
    let identity = &report.identity;
    let paths = &report.paths;

    let mut context = base_context(
        identity,
        &file_name(paths.path(ArtifactKind::SampleData)),
        &report.mapped,
    );
    definition.extend_context(
        &mut context,
        &GenerationInput {
            identity,
            paths,
            queries: &report.mapped,
            table_schemas,
        },
    );
    let renderer = PlaceholderRenderer::new(definition.template_set());

    ArtifactKind::ALL
        .into_iter()
        .map(|kind| {
            let content = match kind {
                ArtifactKind::SampleData => Ok(ArtifactContent::Copy(request.database_path.clone())),
                ArtifactKind::PluginInit => {
                    Ok(ArtifactContent::Append(definition.plugin_init_entry(identity)))
                }
                ArtifactKind::PresentationInit => Ok(ArtifactContent::Append(
                    definition.presentation_init_entry(identity),
                )),
                _ => render_artifact(definition, kind, &context, &renderer).map(ArtifactContent::Create),
            };
            if let Err(err) = &content {
                warn!(artifact = %kind, error = %err, "artifact failed");
            }
            let path = paths.path(kind).to_path_buf();
            ArtifactOutcome {
                kind,
                path: path.clone(),
                result: content.map(|content| Artifact { kind, path, content }),
            }
        })
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
