//! Scaffold SQLite parser plugins from a sample database and a set of named queries.
//!
//! A run connects to the sample database, executes each query, maps the result
//! columns to typed attributes and renders the artifacts of a registered
//! [`definition::Definition`] at paths derived from the plugin name.
#![warn(missing_docs)]

/// Batch configuration read from TOML.
pub mod config;
/// Target-project definitions, generation hooks and the definition registry.
pub mod definition;
/// Error taxonomy shared by every stage.
pub mod error;
/// Connectivity check and query execution against the sample database.
pub mod executor;
/// Path planning and the generation pipeline.
pub mod generator;
/// Plugin identity, attribute models and template contexts.
pub mod mapping;
/// Writing artifacts to disk and the markdown run report.
pub mod output;
/// SQL inspection: read-only check, projection analysis and name mapping.
pub mod parser;
/// Template storage and rendering.
pub mod template;

pub use error::{ErrorKind, Result, ScaffoldError};
