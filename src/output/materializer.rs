use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::ScaffoldError;
use crate::generator::pipeline::{Artifact, ArtifactContent};

/// What happened at an artifact's path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    /// File created or replaced with rendered text.
    Written,
    /// Sample data copied.
    Copied,
    /// Entry appended to an existing or new file.
    Appended,
    /// Nothing to do: the entry or copy was already there.
    Unchanged,
}

/// Write every artifact, stopping at the first I/O failure.
pub fn write_artifacts<'a>(
    artifacts: impl IntoIterator<Item = &'a Artifact>,
) -> Result<Vec<(PathBuf, WriteAction)>, ScaffoldError> {
    artifacts
        .into_iter()
        .map(|artifact| write_artifact(artifact).map(|action| (artifact.path.clone(), action)))
        .collect()
}

/// Write one artifact, creating parent directories as needed.
///
/// `Append` entries are only added when no existing line equals them, so
/// running the same generation twice leaves init files unchanged.
pub fn write_artifact(artifact: &Artifact) -> Result<WriteAction, ScaffoldError> {
    let path = artifact.path.as_path();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ScaffoldError::io(parent, &e))?;
    }

    let action = match &artifact.content {
        ArtifactContent::Create(text) => {
            std::fs::write(path, text).map_err(|e| ScaffoldError::io(path, &e))?;
            WriteAction::Written
        }
        ArtifactContent::Copy(source) => copy(source, path)?,
        ArtifactContent::Append(entry) => append(path, entry)?,
    };

    match action {
        WriteAction::Unchanged => debug!(path = %path.display(), kind = %artifact.kind, "already up to date"),
        _ => info!(path = %path.display(), kind = %artifact.kind, ?action, "materialized artifact"),
    }
    Ok(action)
}

fn copy(source: &Path, target: &Path) -> Result<WriteAction, ScaffoldError> {
    if target.exists() {
        let same = match (source.canonicalize(), target.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        };
        if same {
            return Ok(WriteAction::Unchanged);
        }
    }
    std::fs::copy(source, target).map_err(|e| ScaffoldError::io(target, &e))?;
    Ok(WriteAction::Copied)
}

fn append(path: &Path, entry: &str) -> Result<WriteAction, ScaffoldError> {
    let mut text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == IoErrorKind::NotFound => String::new(),
        Err(e) => return Err(ScaffoldError::io(path, &e)),
    };

    let wanted: Vec<&str> = entry.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if !wanted.is_empty() && wanted.iter().all(|w| text.lines().any(|l| l.trim() == *w)) {
        return Ok(WriteAction::Unchanged);
    }

    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(entry);
    if !text.ends_with('\n') {
        text.push('\n');
    }
    std::fs::write(path, text).map_err(|e| ScaffoldError::io(path, &e))?;
    Ok(WriteAction::Appended)
}
