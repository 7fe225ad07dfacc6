#![allow(dead_code)]

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use sql2scaffold::definition::{Definition, GenerationHooks, GenerationInput};
use sql2scaffold::executor::{QueryExecutor, SqliteExecutor};
use sql2scaffold::generator::path_planner::PathConvention;
use sql2scaffold::mapping::context::TemplateContext;
use sql2scaffold::mapping::identity::PluginIdentity;
use sql2scaffold::template::{TemplateRenderer, TemplateSet, TemplateStore};
use sql2scaffold::ScaffoldError;
use tempfile::TempDir;

/// Schema and rows shared by most integration tests.
pub(crate) const USERS_FIXTURE: &str = "
    CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, score REAL, avatar BLOB);
    CREATE TABLE visits (id INTEGER PRIMARY KEY, user_id INTEGER, url TEXT, visit_time INTEGER);
    INSERT INTO users VALUES (1, 'alice', 1.5, x'00ff'), (2, 'bob', NULL, NULL);
    INSERT INTO visits VALUES (10, 1, 'https://example.com', 1600000000), (11, 2, NULL, 1600000100);
";

/// A fixture database inside its own temporary directory.
pub(crate) struct Fixture {
    pub(crate) dir: TempDir,
    pub(crate) database: PathBuf,
}

impl Fixture {
    /// Directory used as the generated project root.
    pub(crate) fn project_root(&self) -> PathBuf {
        self.dir.path().join("project")
    }
}

/// Create `file_name` in a fresh temp directory and run `sql` against it.
pub(crate) fn fixture_database(file_name: &str, sql: &str) -> Fixture {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let database = dir.path().join(file_name);
    let conn = Connection::open(&database).expect("should create fixture database");
    conn.execute_batch(sql).expect("fixture SQL should run");
    drop(conn);
    Fixture { dir, database }
}

/// The users/visits fixture stored as `users.db`.
pub(crate) fn users_fixture() -> Fixture {
    fixture_database("users.db", USERS_FIXTURE)
}

/// Executor connected to `path`.
pub(crate) fn connected_executor(path: &Path) -> SqliteExecutor {
    let mut executor = SqliteExecutor::new();
    assert!(
        executor.try_connect(path),
        "should connect to {}: {:?}",
        path.display(),
        executor.connection_error()
    );
    executor
}

/// Small definition whose templates list the base context, for tests that
/// should not depend on the bundled plaso templates.
pub(crate) struct TextDefinition {
    pub(crate) name: String,
    pub(crate) convention: PathConvention,
    pub(crate) templates: TemplateSet,
}

impl TextDefinition {
    pub(crate) fn new(name: &str) -> Self {
        let dir = |parts: &[&str]| parts.iter().map(ToString::to_string).collect::<Vec<_>>();
        Self {
            name: name.to_string(),
            convention: PathConvention {
                plugin_source_dir: dir(&["src", "plugins"]),
                plugin_test_dir: dir(&["tests", "plugins"]),
                presentation_source_dir: dir(&["src", "formatters"]),
                presentation_test_dir: dir(&["tests", "formatters"]),
                sample_data_dir: dir(&["data"]),
                source_extension: "txt".to_string(),
                init_file_name: "index.txt".to_string(),
            },
            templates: TemplateSet::new()
                .with("plugin", "plugin {{ class_name }}\n{{ attributes }}\n")
                .with("plugin_test", "test {{ file_name }} with {{ sample_data_file }}\n")
                .with("formatter", "formatter {{ data_type }}\n{{ query_names }}\n")
                .with("formatter_test", "formatter test {{ plugin_name }}\n"),
        }
    }

    pub(crate) fn with_template(mut self, key: &str, text: &str) -> Self {
        self.templates.insert(key, text);
        self
    }
}

impl GenerationHooks for TextDefinition {
    fn plugin_source(
        &self,
        context: &TemplateContext,
        renderer: &dyn TemplateRenderer,
    ) -> Result<String, ScaffoldError> {
        renderer.render("plugin", context)
    }

    fn plugin_test(
        &self,
        context: &TemplateContext,
        renderer: &dyn TemplateRenderer,
    ) -> Result<String, ScaffoldError> {
        renderer.render("plugin_test", context)
    }

    fn presentation_source(
        &self,
        context: &TemplateContext,
        renderer: &dyn TemplateRenderer,
    ) -> Result<String, ScaffoldError> {
        renderer.render("formatter", context)
    }

    fn presentation_test(
        &self,
        context: &TemplateContext,
        renderer: &dyn TemplateRenderer,
    ) -> Result<String, ScaffoldError> {
        renderer.render("formatter_test", context)
    }

    fn plugin_init_entry(&self, identity: &PluginIdentity) -> String {
        format!("plugin {}\n", identity.file_name_stem)
    }

    fn presentation_init_entry(&self, identity: &PluginIdentity) -> String {
        format!("formatter {}\n", identity.file_name_stem)
    }
}

impl Definition for TextDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn path_convention(&self) -> &PathConvention {
        &self.convention
    }

    fn template_set(&self) -> &dyn TemplateStore {
        &self.templates
    }

    fn data_type_namespace(&self) -> &str {
        "text"
    }

    fn extend_context(&self, _context: &mut TemplateContext, _input: &GenerationInput<'_>) {}
}
