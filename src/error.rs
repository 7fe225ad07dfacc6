use thiserror::Error;

/// Every failure the scaffolding engine can report.
///
/// Query and rendering failures are carried inside result objects
/// ([`crate::executor::result::QueryResult`],
/// [`crate::generator::pipeline::ArtifactOutcome`]) rather than aborting a run;
/// registry and configuration errors are returned to the caller directly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScaffoldError {
    /// The database file could not be opened or is not a SQLite database.
    #[error("unable to open database '{path}': {reason}")]
    ConnectionFailed {
        /// Path that could not be opened.
        path: String,
        /// Engine or I/O message.
        reason: String,
    },
    /// The engine rejected or failed to execute the statement.
    #[error("query failed: {0}")]
    SyntaxOrExecutionError(String),
    /// The statement does not look like a data-retrieval statement.
    #[error("statement is not read-only: it starts with '{keyword}'")]
    NotReadOnly {
        /// Offending leading (or top-level) keyword, upper-cased.
        keyword: String,
    },
    /// A single artifact could not be rendered.
    #[error("unable to render template '{template}': {reason}")]
    TemplateRenderingFailed {
        /// Template key that was being rendered.
        template: String,
        /// What went wrong (missing template, unresolved placeholder, ...).
        reason: String,
    },
    /// A definition with the same name is already registered.
    #[error("definition '{0}' is already registered")]
    DuplicateDefinition(String),
    /// No definition with that name is registered.
    #[error("definition '{0}' is not registered")]
    UnknownDefinition(String),
    /// A path convention contains a segment that would escape the project root.
    #[error("invalid path convention segment '{segment}': {reason}")]
    InvalidConvention {
        /// The rejected segment.
        segment: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The batch configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Writing an artifact to disk failed.
    #[error("failed to write {path}: {reason}")]
    Io {
        /// Target path.
        path: String,
        /// Underlying I/O message.
        reason: String,
    },
}

/// Fieldless view of [`ScaffoldError`] used for matching on the taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`ScaffoldError::ConnectionFailed`].
    ConnectionFailed,
    /// See [`ScaffoldError::SyntaxOrExecutionError`].
    SyntaxOrExecutionError,
    /// See [`ScaffoldError::NotReadOnly`].
    NotReadOnly,
    /// See [`ScaffoldError::TemplateRenderingFailed`].
    TemplateRenderingFailed,
    /// See [`ScaffoldError::DuplicateDefinition`].
    DuplicateDefinition,
    /// See [`ScaffoldError::UnknownDefinition`].
    UnknownDefinition,
    /// See [`ScaffoldError::InvalidConvention`].
    InvalidConvention,
    /// See [`ScaffoldError::Config`].
    Config,
    /// See [`ScaffoldError::Io`].
    Io,
}

impl ScaffoldError {
    /// The taxonomy entry of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScaffoldError::ConnectionFailed { .. } => ErrorKind::ConnectionFailed,
            ScaffoldError::SyntaxOrExecutionError(_) => ErrorKind::SyntaxOrExecutionError,
            ScaffoldError::NotReadOnly { .. } => ErrorKind::NotReadOnly,
            ScaffoldError::TemplateRenderingFailed { .. } => ErrorKind::TemplateRenderingFailed,
            ScaffoldError::DuplicateDefinition(_) => ErrorKind::DuplicateDefinition,
            ScaffoldError::UnknownDefinition(_) => ErrorKind::UnknownDefinition,
            ScaffoldError::InvalidConvention { .. } => ErrorKind::InvalidConvention,
            ScaffoldError::Config(_) => ErrorKind::Config,
            ScaffoldError::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn rendering(template: &str, reason: impl Into<String>) -> Self {
        ScaffoldError::TemplateRenderingFailed {
            template: template.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: &std::path::Path, err: &std::io::Error) -> Self {
        ScaffoldError::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<rusqlite::Error> for ScaffoldError {
    fn from(e: rusqlite::Error) -> Self {
        ScaffoldError::SyntaxOrExecutionError(e.to_string())
    }
}

/// Crate-wide result alias.
pub type Result<T, E = ScaffoldError> = std::result::Result<T, E>;
