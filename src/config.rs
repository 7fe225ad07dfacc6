//! Batch configuration of a generation run, read from TOML.
//!
//! ```toml
//! database = "History.db"
//! plugin_name = "Browser History"
//! output_dir = "../plaso"
//!
//! [[queries]]
//! name = "Visits"
//! sql = "SELECT url, visit_time FROM visits"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ScaffoldError;
use crate::executor::DEFAULT_ROW_CAP;
use crate::generator::pipeline::GenerationRequest;
use crate::mapping::query::NamedQuery;
use crate::parser::names::to_file_name_stem;

/// Name of the definition used when none is configured.
pub const DEFAULT_DEFINITION: &str = "plaso";

/// Everything a non-interactive run needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScaffoldConfig {
    /// Sample database file.
    pub database: PathBuf,
    /// Plugin name as a user would type it.
    pub plugin_name: String,
    /// Registered definition to generate for.
    pub definition: String,
    /// Root of the target project.
    pub output_dir: PathBuf,
    /// Rows sampled per query.
    pub row_cap: usize,
    /// Execute statements that fail the read-only check.
    pub allow_mutating_queries: bool,
    /// Named queries, in artifact order.
    pub queries: Vec<NamedQuery>,
}

impl Default for ScaffoldConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::new(),
            plugin_name: String::new(),
            definition: DEFAULT_DEFINITION.to_string(),
            output_dir: PathBuf::from("."),
            row_cap: DEFAULT_ROW_CAP,
            allow_mutating_queries: false,
            queries: Vec::new(),
        }
    }
}

impl ScaffoldConfig {
    /// Parse a TOML document.
    pub fn from_toml(s: &str) -> Result<Self, ScaffoldError> {
        toml::from_str(s).map_err(|e| ScaffoldError::Config(e.to_string()))
    }

    /// Serialise back to TOML.
    pub fn to_toml(&self) -> Result<String, ScaffoldError> {
        toml::to_string_pretty(self).map_err(|e| ScaffoldError::Config(e.to_string()))
    }

    /// Read and parse a TOML file; relative paths inside it stay relative to
    /// the working directory.
    pub fn load(path: &Path) -> Result<Self, ScaffoldError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ScaffoldError::Config(format!("unable to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&text)
    }

    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<(), ScaffoldError> {
        if self.database.as_os_str().is_empty() {
            return Err(ScaffoldError::Config("no database configured".to_string()));
        }
        if self.plugin_name.trim().is_empty() {
            return Err(ScaffoldError::Config(
                "plugin name must not be empty".to_string(),
            ));
        }
        if self.definition.trim().is_empty() {
            return Err(ScaffoldError::Config(
                "definition name must not be empty".to_string(),
            ));
        }
        if self.row_cap == 0 {
            return Err(ScaffoldError::Config(
                "row_cap must be at least 1".to_string(),
            ));
        }
        if self.queries.is_empty() {
            return Err(ScaffoldError::Config("no queries configured".to_string()));
        }

        let mut seen: HashMap<String, &str> = HashMap::new();
        for query in &self.queries {
            if query.sql.trim().is_empty() {
                return Err(ScaffoldError::Config(format!(
                    "query '{}' has no SQL",
                    query.name
                )));
            }
            let identifier = to_file_name_stem(&query.name);
            if let Some(previous) = seen.insert(identifier.clone(), &query.name) {
                return Err(ScaffoldError::Config(format!(
                    "queries '{previous}' and '{}' both map to '{identifier}'",
                    query.name
                )));
            }
        }
        Ok(())
    }

    /// Pipeline input described by this configuration.
    pub fn to_request(&self) -> GenerationRequest {
        GenerationRequest {
            plugin_name: self.plugin_name.clone(),
            database_path: self.database.clone(),
            queries: self.queries.clone(),
            project_root: self.output_dir.clone(),
            allow_mutating_queries: self.allow_mutating_queries,
        }
    }
}

/// Parse a `NAME=SQL` command-line query.
pub fn parse_query_arg(arg: &str) -> Result<NamedQuery, ScaffoldError> {
    let (name, sql) = arg.split_once('=').ok_or_else(|| {
        ScaffoldError::Config(format!("expected NAME=SQL, got '{arg}'"))
    })?;
    if name.trim().is_empty() {
        return Err(ScaffoldError::Config(format!(
            "query name must not be empty in '{arg}'"
        )));
    }
    Ok(NamedQuery::new(name.trim(), sql.trim()))
}
