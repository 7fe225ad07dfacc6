//! Pure derivation of every output location for one plugin.
//!
//! Nothing here touches the filesystem: the same inputs always produce the
//! same [`PathSet`], which is what makes re-generation idempotent.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::error::ScaffoldError;
use crate::mapping::identity::PluginIdentity;

/// Kinds of output a generation run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Data-access plugin source.
    PluginSource,
    /// Plugin tests.
    PluginTest,
    /// Presentation/formatter source.
    PresentationSource,
    /// Formatter tests.
    PresentationTest,
    /// Copy of the sample database used by the tests.
    SampleData,
    /// Package init of the plugin directory.
    PluginInit,
    /// Package init of the presentation directory.
    PresentationInit,
}

impl ArtifactKind {
    /// Every kind, in generation order.
    pub const ALL: [ArtifactKind; 7] = [
        ArtifactKind::PluginSource,
        ArtifactKind::PluginTest,
        ArtifactKind::PresentationSource,
        ArtifactKind::PresentationTest,
        ArtifactKind::SampleData,
        ArtifactKind::PluginInit,
        ArtifactKind::PresentationInit,
    ];

    /// Kinds rendered from templates.
    pub const RENDERED: [ArtifactKind; 4] = [
        ArtifactKind::PluginSource,
        ArtifactKind::PluginTest,
        ArtifactKind::PresentationSource,
        ArtifactKind::PresentationTest,
    ];

    /// Stable snake-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::PluginSource => "plugin_source",
            ArtifactKind::PluginTest => "plugin_test",
            ArtifactKind::PresentationSource => "presentation_source",
            ArtifactKind::PresentationTest => "presentation_test",
            ArtifactKind::SampleData => "sample_data",
            ArtifactKind::PluginInit => "plugin_init",
            ArtifactKind::PresentationInit => "presentation_init",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directory layout of a target project, relative to its root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathConvention {
    /// Directory holding plugin sources (and the plugin package init).
    pub plugin_source_dir: Vec<String>,
    /// Directory holding plugin tests.
    pub plugin_test_dir: Vec<String>,
    /// Directory holding formatter sources (and the formatter package init).
    pub presentation_source_dir: Vec<String>,
    /// Directory holding formatter tests.
    pub presentation_test_dir: Vec<String>,
    /// Directory holding sample databases.
    pub sample_data_dir: Vec<String>,
    /// Extension of generated source files, without the dot.
    pub source_extension: String,
    /// File name of a package init file.
    pub init_file_name: String,
}

impl PathConvention {
    /// Reject segments that are empty, contain separators, or would leave
    /// the project root.
    pub fn validate(&self) -> Result<(), ScaffoldError> {
        let segments = self
            .plugin_source_dir
            .iter()
            .chain(&self.plugin_test_dir)
            .chain(&self.presentation_source_dir)
            .chain(&self.presentation_test_dir)
            .chain(&self.sample_data_dir)
            .chain(std::iter::once(&self.init_file_name));

        for segment in segments {
            validate_segment(segment)?;
        }
        if self.source_extension.contains(['/', '\\']) {
            return Err(ScaffoldError::InvalidConvention {
                segment: self.source_extension.clone(),
                reason: "path separators are not allowed".to_string(),
            });
        }
        Ok(())
    }

    /// Compute every artifact path; see [`plan`].
    pub fn plan(
        &self,
        project_root: &Path,
        identity: &PluginIdentity,
        database_suffix: &str,
    ) -> PathSet {
        plan(self, project_root, identity, database_suffix)
    }
}

fn validate_segment(segment: &str) -> Result<(), ScaffoldError> {
    let invalid = |reason: &str| ScaffoldError::InvalidConvention {
        segment: segment.to_string(),
        reason: reason.to_string(),
    };

    if segment.trim().is_empty() {
        return Err(invalid("segments must not be empty"));
    }
    if segment.contains(['/', '\\']) {
        return Err(invalid("path separators are not allowed"));
    }
    let candidate = Path::new(segment);
    if candidate.is_absolute()
        || candidate.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::CurDir | Component::RootDir | Component::Prefix(_)
            )
        })
    {
        return Err(invalid("traversal segments are not allowed"));
    }
    Ok(())
}

/// Output location of every artifact for one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PathSet {
    /// Plugin source file.
    pub plugin_source_path: PathBuf,
    /// Plugin test file.
    pub plugin_test_path: PathBuf,
    /// Formatter source file.
    pub presentation_source_path: PathBuf,
    /// Formatter test file.
    pub presentation_test_path: PathBuf,
    /// Sample database copy.
    pub sample_data_path: PathBuf,
    /// Package init next to the plugin source.
    pub plugin_init_path: PathBuf,
    /// Package init next to the formatter source.
    pub presentation_init_path: PathBuf,
}

impl PathSet {
    /// Path of one artifact kind.
    pub fn path(&self, kind: ArtifactKind) -> &Path {
        match kind {
            ArtifactKind::PluginSource => &self.plugin_source_path,
            ArtifactKind::PluginTest => &self.plugin_test_path,
            ArtifactKind::PresentationSource => &self.presentation_source_path,
            ArtifactKind::PresentationTest => &self.presentation_test_path,
            ArtifactKind::SampleData => &self.sample_data_path,
            ArtifactKind::PluginInit => &self.plugin_init_path,
            ArtifactKind::PresentationInit => &self.presentation_init_path,
        }
    }

    /// `(kind, path)` pairs in [`ArtifactKind::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (ArtifactKind, &Path)> {
        ArtifactKind::ALL
            .into_iter()
            .map(move |kind| (kind, self.path(kind)))
    }
}

/// Compute every artifact path of `identity` under `project_root`.
///
/// Source and test files are named `<file stem>.<source extension>`; the
/// sample database is named `<file stem>.<database suffix>` (a leading dot on
/// the suffix is ignored, an empty suffix leaves the stem bare).
pub fn plan(
    convention: &PathConvention,
    project_root: &Path,
    identity: &PluginIdentity,
    database_suffix: &str,
) -> PathSet {
    let stem = identity.file_name_stem.as_str();
    let source_file = file_name(stem, &convention.source_extension);
    let sample_file = file_name(stem, database_suffix);

    PathSet {
        plugin_source_path: join(project_root, &convention.plugin_source_dir, &source_file),
        plugin_test_path: join(project_root, &convention.plugin_test_dir, &source_file),
        presentation_source_path: join(
            project_root,
            &convention.presentation_source_dir,
            &source_file,
        ),
        presentation_test_path: join(project_root, &convention.presentation_test_dir, &source_file),
        sample_data_path: join(project_root, &convention.sample_data_dir, &sample_file),
        plugin_init_path: join(
            project_root,
            &convention.plugin_source_dir,
            &convention.init_file_name,
        ),
        presentation_init_path: join(
            project_root,
            &convention.presentation_source_dir,
            &convention.init_file_name,
        ),
    }
}

fn file_name(stem: &str, extension: &str) -> String {
    let extension = extension.trim().trim_start_matches('.');
    if extension.is_empty() {
        stem.to_string()
    } else {
        format!("{stem}.{extension}")
    }
}

fn join(root: &Path, segments: &[String], file: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    path.extend(segments);
    path.push(file);
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convention() -> PathConvention {
        let dir = |parts: &[&str]| parts.iter().map(ToString::to_string).collect::<Vec<_>>();
        PathConvention {
            plugin_source_dir: dir(&["pkg", "plugins"]),
            plugin_test_dir: dir(&["tests", "plugins"]),
            presentation_source_dir: dir(&["pkg", "formatters"]),
            presentation_test_dir: dir(&["tests", "formatters"]),
            sample_data_dir: dir(&["test_data"]),
            source_extension: "py".to_string(),
            init_file_name: "__init__.py".to_string(),
        }
    }

    #[test]
    fn suffix_dot_is_optional() {
        let identity = PluginIdentity::derive("Test Users", "");
        let a = plan(&convention(), Path::new("/out"), &identity, ".db");
        let b = plan(&convention(), Path::new("/out"), &identity, "db");
        assert_eq!(a, b);
        assert_eq!(a.sample_data_path, PathBuf::from("/out/test_data/test_users.db"));

        let bare = plan(&convention(), Path::new("/out"), &identity, "");
        assert_eq!(bare.sample_data_path, PathBuf::from("/out/test_data/test_users"));
    }

    #[test]
    fn init_files_sit_next_to_sources() {
        let identity = PluginIdentity::derive("x", "");
        let paths = plan(&convention(), Path::new("root"), &identity, "db");
        assert_eq!(paths.plugin_init_path, PathBuf::from("root/pkg/plugins/__init__.py"));
        assert_eq!(
            paths.presentation_init_path,
            PathBuf::from("root/pkg/formatters/__init__.py")
        );
        assert_eq!(paths.iter().count(), ArtifactKind::ALL.len());
    }

    #[test]
    fn traversal_segments_are_rejected() {
        let mut bad = convention();
        bad.plugin_test_dir = vec!["..".to_string()];
        assert!(matches!(
            bad.validate(),
            Err(ScaffoldError::InvalidConvention { .. })
        ));

        let mut bad = convention();
        bad.sample_data_dir = vec!["a/b".to_string()];
        assert!(bad.validate().is_err());

        assert!(convention().validate().is_ok());
    }
}
