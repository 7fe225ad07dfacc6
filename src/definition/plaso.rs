//! Scaffolding for plaso SQLite parser plugins.
//!
//! One run produces a `SQLitePlugin` subclass with one event data class and
//! one row callback per query, the matching event formatters, and tests for
//! both, laid out the way the plaso source tree expects them.

use std::collections::{BTreeMap, HashSet};

use crate::definition::python::{
    docstring_text, label, single_line, string_literal, type_name, value_literal,
};
use crate::definition::{Definition, GenerationHooks, GenerationInput};
use crate::error::ScaffoldError;
use crate::generator::path_planner::{ArtifactKind, PathConvention};
use crate::mapping::attributes::Attribute;
use crate::mapping::context::{TemplateContext, BASE_KEYS};
use crate::mapping::identity::PluginIdentity;
use crate::mapping::query::MappedQuery;
use crate::template::{TemplateRenderer, TemplateSet, TemplateStore};

/// Registry key of the built-in definition.
pub const NAME: &str = "plaso";

const PLUGIN_TEMPLATE: &str = include_str!("../../templates/plaso/plugin.py.tmpl");
const PLUGIN_TEST_TEMPLATE: &str = include_str!("../../templates/plaso/plugin_test.py.tmpl");
const FORMATTER_TEMPLATE: &str = include_str!("../../templates/plaso/formatter.py.tmpl");
const FORMATTER_TEST_TEMPLATE: &str = include_str!("../../templates/plaso/formatter_test.py.tmpl");

const PLUGIN_KEYS: [&str; 7] = [
    "plugin_title",
    "data_format",
    "event_data_classes",
    "required_structure",
    "query_list",
    "schemas",
    "parse_methods",
];
const PLUGIN_TEST_KEYS: [&str; 2] = ["plugin_title", "event_data_checks"];
const FORMATTER_KEYS: [&str; 3] = ["plugin_title", "formatter_classes", "formatter_names"];
const FORMATTER_TEST_KEYS: [&str; 2] = ["plugin_title", "formatter_test_classes"];

/// Attributes `events.EventData` sets itself.
const EVENT_DATA_ATTRIBUTES: [&str; 2] = ["data_type", "parser"];

const PYTHON_KEYWORDS: [&str; 35] = [
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// Built-in definition targeting the plaso source tree.
#[derive(Debug, Clone)]
pub struct PlasoDefinition {
    convention: PathConvention,
    templates: TemplateSet,
}

impl PlasoDefinition {
    /// Definition with the bundled templates and the plaso directory layout.
    pub fn new() -> Self {
        let dir = |parts: &[&str]| parts.iter().map(ToString::to_string).collect::<Vec<_>>();
        Self {
            convention: PathConvention {
                plugin_source_dir: dir(&["plaso", "parsers", "sqlite_plugins"]),
                plugin_test_dir: dir(&["tests", "parsers", "sqlite_plugins"]),
                presentation_source_dir: dir(&["plaso", "formatters"]),
                presentation_test_dir: dir(&["tests", "formatters"]),
                sample_data_dir: dir(&["test_data"]),
                source_extension: "py".to_string(),
                init_file_name: "__init__.py".to_string(),
            },
            templates: TemplateSet::new()
                .with("plugin", PLUGIN_TEMPLATE)
                .with("plugin_test", PLUGIN_TEST_TEMPLATE)
                .with("formatter", FORMATTER_TEMPLATE)
                .with("formatter_test", FORMATTER_TEST_TEMPLATE),
        }
    }

    /// Replace the bundled templates, e.g. to target a fork of the project.
    #[must_use]
    pub fn with_templates(mut self, templates: TemplateSet) -> Self {
        self.templates = templates;
        self
    }
}

impl Default for PlasoDefinition {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationHooks for PlasoDefinition {
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
        format!(
            "from plaso.parsers.sqlite_plugins import {}\n",
            identity.file_name_stem
        )
    }

    fn presentation_init_entry(&self, identity: &PluginIdentity) -> String {
        format!("from plaso.formatters import {}\n", identity.file_name_stem)
    }
}

impl Definition for PlasoDefinition {
    fn name(&self) -> &str {
        NAME
    }

    fn path_convention(&self) -> &PathConvention {
        &self.convention
    }

    fn template_set(&self) -> &dyn TemplateStore {
        &self.templates
    }

    fn data_type_namespace(&self) -> &str {
        "sqlite"
    }

    fn extend_context(&self, context: &mut TemplateContext, input: &GenerationInput<'_>) {
        let identity = input.identity;
        let queries = input.queries;
        let title = plugin_title(identity);

        context.insert("plugin_title", title.as_str());
        context.insert(
            "data_format",
            string_literal(&format!("{title} SQLite database file")),
        );
        context.insert(
            "event_data_classes",
            queries
                .iter()
                .map(|query| event_data_class(identity, &title, query))
                .collect::<Vec<_>>()
                .join("\n\n\n"),
        );
        context.insert("required_structure", required_structure(queries));
        context.insert(
            "query_list",
            queries
                .iter()
                .map(|query| {
                    format!(
                        "({}, {}),",
                        string_literal(&single_line(&query.statement)),
                        string_literal(&parse_method_name(query))
                    )
                })
                .collect::<Vec<_>>(),
        );
        context.insert(
            "schemas",
            input
                .table_schemas
                .iter()
                .map(|(table, sql)| {
                    format!(
                        "{}: ({}),",
                        string_literal(table),
                        string_literal(&single_line(sql))
                    )
                })
                .collect::<Vec<_>>(),
        );
        context.insert(
            "parse_methods",
            queries
                .iter()
                .map(|query| parse_method(identity, query))
                .collect::<Vec<_>>()
                .join("\n\n"),
        );
        context.insert("event_data_checks", event_data_checks(identity, queries));
        context.insert(
            "formatter_classes",
            queries
                .iter()
                .map(|query| formatter_class(identity, &title, query))
                .collect::<Vec<_>>()
                .join("\n\n\n"),
        );
        context.insert(
            "formatter_names",
            queries
                .iter()
                .map(|query| format!("{},", formatter_class_name(identity, query)))
                .collect::<Vec<_>>(),
        );
        context.insert(
            "formatter_test_classes",
            queries
                .iter()
                .map(|query| formatter_test_class(identity, &title, query))
                .collect::<Vec<_>>()
                .join("\n\n\n"),
        );
    }

    fn required_keys(&self, kind: ArtifactKind) -> Vec<&'static str> {
        let extra: &[&'static str] = match kind {
            ArtifactKind::PluginSource => &PLUGIN_KEYS,
            ArtifactKind::PluginTest => &PLUGIN_TEST_KEYS,
            ArtifactKind::PresentationSource => &FORMATTER_KEYS,
            ArtifactKind::PresentationTest => &FORMATTER_TEST_KEYS,
            ArtifactKind::SampleData | ArtifactKind::PluginInit | ArtifactKind::PresentationInit => &[],
        };
        BASE_KEYS.iter().chain(extra).copied().collect()
    }
}

fn plugin_title(identity: &PluginIdentity) -> String {
    let title = docstring_text(identity.raw_name.trim());
    if title.trim().is_empty() {
        identity.class_name_stem.clone()
    } else {
        title
    }
}

fn query_data_type(identity: &PluginIdentity, query: &MappedQuery) -> String {
    format!("{}:{}", identity.data_type_tag, query.identifier)
}

fn event_data_class_name(identity: &PluginIdentity, query: &MappedQuery) -> String {
    format!("{}{}EventData", identity.class_name_stem, query.class_name_stem)
}

fn formatter_class_name(identity: &PluginIdentity, query: &MappedQuery) -> String {
    format!("{}{}Formatter", identity.class_name_stem, query.class_name_stem)
}

fn parse_method_name(query: &MappedQuery) -> String {
    format!("Parse{}Row", query.class_name_stem)
}

/// Python attribute names of a query's model, in model order.
///
/// Keywords and names `EventData` reserves get a trailing `_`; a name that
/// then collides with another attribute gets a numeric suffix.
fn python_identifiers(query: &MappedQuery) -> Vec<String> {
    let mut used: HashSet<String> = query.model.iter().map(|a| a.identifier.clone()).collect();
    query
        .model
        .iter()
        .map(|attribute| {
            let identifier = attribute.identifier.as_str();
            if !PYTHON_KEYWORDS.contains(&identifier)
                && !EVENT_DATA_ATTRIBUTES.contains(&identifier)
            {
                return identifier.to_string();
            }
            let mut escaped = format!("{identifier}_");
            let mut suffix = 2usize;
            while !used.insert(escaped.clone()) {
                escaped = format!("{identifier}_{suffix}");
                suffix += 1;
            }
            escaped
        })
        .collect()
}

fn event_data_class(identity: &PluginIdentity, title: &str, query: &MappedQuery) -> String {
    let class_name = event_data_class_name(identity, query);
    let mut lines = vec![
        format!("class {class_name}(events.EventData):"),
        format!(
            "  \"\"\"{title} {} event data.",
            docstring_text(&query.name)
        ),
        String::new(),
        "  Attributes:".to_string(),
    ];
    let identifiers = python_identifiers(query);
    lines.extend(query.model.iter().zip(&identifiers).map(|(attribute, identifier)| {
        format!(
            "    {} ({}): {}",
            identifier,
            type_name(attribute.target_type),
            docstring_text(&attribute.doc_placeholder)
        )
    }));
    lines.extend([
        "  \"\"\"".to_string(),
        String::new(),
        format!(
            "  DATA_TYPE = {}",
            string_literal(&query_data_type(identity, query))
        ),
        String::new(),
        "  def __init__(self):".to_string(),
        "    \"\"\"Initializes event data.\"\"\"".to_string(),
        format!("    super({class_name}, self).__init__(data_type=self.DATA_TYPE)"),
    ]);
    lines.extend(
        identifiers
            .iter()
            .map(|identifier| format!("    self.{identifier} = None")),
    );
    lines.join("\n")
}

/// Union of the provenance of every query, one dict entry per table.
fn required_structure(queries: &[MappedQuery]) -> Vec<String> {
    let mut structure: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for query in queries {
        for (table, columns) in query.model.required_structure() {
            let known = structure.entry(table).or_default();
            for column in columns {
                if !known.contains(&column) {
                    known.push(column);
                }
            }
        }
    }

    structure
        .iter()
        .map(|(table, columns)| {
            let columns: Vec<String> = columns.iter().map(|c| string_literal(c)).collect();
            format!(
                "{}: frozenset([{}]),",
                string_literal(table),
                columns.join(", ")
            )
        })
        .collect()
}

/// Row access expression; positional when the column name cannot key the row.
fn row_value(query: &MappedQuery, index: usize, attribute: &Attribute) -> String {
    let name = attribute.column_name.as_str();
    let ambiguous = name.trim().is_empty()
        || query
            .model
            .iter()
            .filter(|other| other.column_name.eq_ignore_ascii_case(name))
            .count()
            > 1;
    if ambiguous {
        format!("row[{index}]")
    } else {
        format!("self._GetRowValue(query_hash, row, {})", string_literal(name))
    }
}

fn parse_method(identity: &PluginIdentity, query: &MappedQuery) -> String {
    let mut lines = vec![
        format!(
            "def {}(self, parser_mediator, query, row, **unused_kwargs):",
            parse_method_name(query)
        ),
        format!("  \"\"\"Parses a {} row.", docstring_text(&query.name)),
        String::new(),
        "  Args:".to_string(),
        "    parser_mediator (ParserMediator): mediates interactions between parsers".to_string(),
        "        and other components, such as storage and dfVFS.".to_string(),
        "    query (str): query that created the row.".to_string(),
        "    row (sqlite3.Row): row.".to_string(),
        "  \"\"\"".to_string(),
        "  query_hash = hash(query)".to_string(),
        String::new(),
        format!("  event_data = {}()", event_data_class_name(identity, query)),
    ];
    let identifiers = python_identifiers(query);
    lines.extend(
        query
            .model
            .iter()
            .zip(&identifiers)
            .enumerate()
            .map(|(index, (attribute, identifier))| {
                format!(
                    "  event_data.{identifier} = {}",
                    row_value(query, index, attribute)
                )
            }),
    );
    lines.extend([
        String::new(),
        "  parser_mediator.ProduceEventData(event_data)".to_string(),
    ]);
    lines.join("\n")
}

/// Assertions on the number of event data and on the first row of each query.
fn event_data_checks(identity: &PluginIdentity, queries: &[MappedQuery]) -> Vec<String> {
    let total: usize = queries.iter().map(|q| q.result.rows.len()).sum();
    let any_truncated = queries.iter().any(|q| q.result.truncated);

    let mut lines = vec![
        "number_of_event_data = storage_writer.GetNumberOfAttributeContainers(".to_string(),
        "    'event_data')".to_string(),
    ];
    if any_truncated {
        lines.push(format!(
            "# TODO: sampling stopped after {total} rows, set the full row count."
        ));
    }
    lines.extend([
        format!("self.assertEqual(number_of_event_data, {total})"),
        String::new(),
        "number_of_warnings = storage_writer.GetNumberOfAttributeContainers(".to_string(),
        "    'extraction_warning')".to_string(),
        "self.assertEqual(number_of_warnings, 0)".to_string(),
    ]);

    let mut offset = 0usize;
    let mut offset_known = true;
    for query in queries {
        if let Some(row) = query.result.rows.first() {
            let mut entries = vec![format!(
                "'data_type': {}",
                string_literal(&query_data_type(identity, query))
            )];
            let identifiers = python_identifiers(query);
            entries.extend(identifiers.iter().zip(row).map(|(identifier, value)| {
                format!("{}: {}", string_literal(identifier), value_literal(value))
            }));

            lines.push(String::new());
            lines.push("expected_event_values = {".to_string());
            lines.push(format!("    {}}}", entries.join(",\n    ")));
            lines.push(String::new());
            if !offset_known {
                lines.push("# TODO: verify the index, earlier queries were sampled partially.".to_string());
            }
            lines.push(format!(
                "event_data = storage_writer.GetAttributeContainerByIndex('event_data', {offset})"
            ));
            lines.push("self.CheckEventData(event_data, expected_event_values)".to_string());
        }
        offset += query.result.rows.len();
        offset_known &= !query.result.truncated;
    }
    lines
}

fn formatter_class(identity: &PluginIdentity, title: &str, query: &MappedQuery) -> String {
    let pieces: Vec<String> = python_identifiers(query)
        .iter()
        .map(|identifier| string_literal(&format!("{}: {{{identifier}}}", label(identifier))))
        .collect();
    let query_label = docstring_text(&query.name);

    [
        format!(
            "class {}(interface.ConditionalEventFormatter):",
            formatter_class_name(identity, query)
        ),
        format!("  \"\"\"{title} {query_label} event formatter.\"\"\""),
        String::new(),
        format!(
            "  DATA_TYPE = {}",
            string_literal(&query_data_type(identity, query))
        ),
        String::new(),
        "  FORMAT_STRING_PIECES = [".to_string(),
        format!("      {}]", pieces.join(",\n      ")),
        String::new(),
        format!(
            "  SOURCE_LONG = {}",
            string_literal(&format!("{title} {query_label}"))
        ),
        format!("  SOURCE_SHORT = {}", string_literal(title)),
    ]
    .join("\n")
}

fn formatter_test_class(identity: &PluginIdentity, title: &str, query: &MappedQuery) -> String {
    let formatter = format!(
        "{}.{}",
        identity.file_name_stem,
        formatter_class_name(identity, query)
    );
    let names: Vec<String> = python_identifiers(query)
        .iter()
        .map(|identifier| string_literal(identifier))
        .collect();

    [
        format!(
            "class {}Test(test_lib.EventFormatterTestCase):",
            formatter_class_name(identity, query)
        ),
        format!(
            "  \"\"\"Tests for the {title} {} event formatter.\"\"\"",
            docstring_text(&query.name)
        ),
        String::new(),
        "  def testInitialization(self):".to_string(),
        "    \"\"\"Tests the initialization.\"\"\"".to_string(),
        format!("    event_formatter = {formatter}()"),
        "    self.assertIsNotNone(event_formatter)".to_string(),
        String::new(),
        "  def testGetFormatStringAttributeNames(self):".to_string(),
        "    \"\"\"Tests the GetFormatStringAttributeNames function.\"\"\"".to_string(),
        format!("    event_formatter = {formatter}()"),
        String::new(),
        "    expected_attribute_names = [".to_string(),
        format!("        {}]", names.join(",\n        ")),
        String::new(),
        "    self._TestGetFormatStringAttributeNames(".to_string(),
        "        event_formatter, expected_attribute_names)".to_string(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::result::{ColumnInfo, ColumnSource, ColumnType, QueryResult, SampleValue};
    use crate::generator::path_planner::plan;
    use crate::mapping::context::base_context;
    use crate::template::PlaceholderRenderer;
    use std::path::Path;

    fn users_query() -> MappedQuery {
        let column = |name: &str, column_type, value| {
            let mut info = ColumnInfo::named(name);
            info.inferred_type = column_type;
            info.sample_value = Some(value);
            info.source = Some(ColumnSource {
                table: "users".to_string(),
                column: name.to_string(),
                declared_type: String::new(),
            });
            info
        };
        let columns = vec![
            column("id", ColumnType::Integer, SampleValue::Integer(1)),
            column("name", ColumnType::Text, SampleValue::Text("alice".to_string())),
        ];
        let rows = vec![
            vec![SampleValue::Integer(1), SampleValue::Text("alice".to_string())],
            vec![SampleValue::Integer(2), SampleValue::Text("bob".to_string())],
        ];
        let result = QueryResult::success("SELECT id, name\nFROM users", columns, rows, false);
        MappedQuery::new("Users", result)
    }

    fn context_for(definition: &PlasoDefinition, queries: &[MappedQuery]) -> TemplateContext {
        let identity = PluginIdentity::derive("Test Users", definition.data_type_namespace());
        let paths = plan(definition.path_convention(), Path::new("/out"), &identity, "db");
        let schemas = BTreeMap::from([(
            "users".to_string(),
            "CREATE TABLE users (id INTEGER, name TEXT)".to_string(),
        )]);
        let mut context = base_context(&identity, "test_users.db", queries);
        definition.extend_context(
            &mut context,
            &GenerationInput {
                identity: &identity,
                paths: &paths,
                queries,
                table_schemas: &schemas,
            },
        );
        context
    }

    #[test]
    fn extended_context_satisfies_every_rendered_kind() {
        let definition = PlasoDefinition::new();
        let context = context_for(&definition, &[users_query()]);
        for kind in ArtifactKind::RENDERED {
            assert!(
                context.require(kind.as_str(), &definition.required_keys(kind)).is_ok(),
                "{kind} is missing keys"
            );
        }
    }

    #[test]
    fn plugin_source_declares_queries_and_structure() {
        let definition = PlasoDefinition::new();
        let context = context_for(&definition, &[users_query()]);
        let renderer = PlaceholderRenderer::new(definition.template_set());
        let source = definition
            .plugin_source(&context, &renderer)
            .expect("plugin should render");

        assert!(source.contains("class TestUsersPlugin(interface.SQLitePlugin):"));
        assert!(source.contains("class TestUsersUsersEventData(events.EventData):"));
        assert!(source.contains("  DATA_TYPE = 'sqlite:test_users:users'"));
        assert!(source.contains("      'users': frozenset(['id', 'name']),"));
        assert!(source.contains("      ('SELECT id, name FROM users', 'ParseUsersRow'),"));
        assert!(source.contains("    event_data.name = self._GetRowValue(query_hash, row, 'name')"));
        assert!(source.contains("sqlite.SQLiteParser.RegisterPlugin(TestUsersPlugin)"));
        assert!(!source.contains("{{"));
    }

    #[test]
    fn plugin_test_expects_sampled_values() {
        let definition = PlasoDefinition::new();
        let context = context_for(&definition, &[users_query()]);
        let renderer = PlaceholderRenderer::new(definition.template_set());
        let test = definition
            .plugin_test(&context, &renderer)
            .expect("plugin test should render");

        assert!(test.contains("    self.assertEqual(number_of_event_data, 2)"));
        assert!(test.contains("        'name': 'alice'}"));
        assert!(test.contains("['test_users.db'], plugin)"));
    }

    #[test]
    fn formatter_pieces_follow_attribute_order() {
        let definition = PlasoDefinition::new();
        let context = context_for(&definition, &[users_query()]);
        let renderer = PlaceholderRenderer::new(definition.template_set());
        let formatter = definition
            .presentation_source(&context, &renderer)
            .expect("formatter should render");

        let id = formatter.find("'Id: {id}'").expect("id piece");
        let name = formatter.find("'Name: {name}'").expect("name piece");
        assert!(id < name);
        assert!(formatter.contains("    TestUsersUsersFormatter,"));
    }

    #[test]
    fn keywords_and_ambiguous_columns_stay_valid_python() {
        let columns = vec![ColumnInfo::named("from"), ColumnInfo::named("x"), ColumnInfo::named("X")];
        let query = MappedQuery::new("Odd", QueryResult::success("SELECT 1", columns, Vec::new(), false));
        let identity = PluginIdentity::derive("p", "sqlite");
        let method = parse_method(&identity, &query);

        assert!(method.contains("  event_data.from_ = self._GetRowValue(query_hash, row, 'from')"));
        assert!(method.contains("  event_data.x = row[1]"));
        assert!(method.contains("  event_data.x_2 = row[2]"));
    }

    #[test]
    fn event_data_reserved_names_are_escaped() {
        let columns = vec![
            ColumnInfo::named("data_type"),
            ColumnInfo::named("parser"),
            ColumnInfo::named("data_type_"),
        ];
        let rows = vec![vec![
            SampleValue::Text("visit".to_string()),
            SampleValue::Integer(7),
            SampleValue::Null,
        ]];
        let result =
            QueryResult::success("SELECT data_type, parser, data_type_ FROM t", columns, rows, false);
        let query = MappedQuery::new("Typed", result);
        let identity = PluginIdentity::derive("p", "sqlite");

        assert_eq!(query.model.identifiers(), vec!["data_type", "parser", "data_type_2"]);
        assert_eq!(
            python_identifiers(&query),
            vec!["data_type_", "parser_", "data_type_2"]
        );

        let class = event_data_class(&identity, "p", &query);
        assert!(class.contains("    super(PTypedEventData, self).__init__(data_type=self.DATA_TYPE)"));
        assert!(class.contains("    self.data_type_ = None"));
        assert!(!class.contains("    self.data_type = None"));

        let method = parse_method(&identity, &query);
        assert!(method.contains(
            "  event_data.data_type_ = self._GetRowValue(query_hash, row, 'data_type')"
        ));
        assert!(method.contains("  event_data.parser_ = self._GetRowValue(query_hash, row, 'parser')"));

        let checks = event_data_checks(&identity, &[query]).join("\n");
        assert_eq!(checks.matches("'data_type': ").count(), 1);
        assert!(checks.contains("'data_type_': 'visit'"));
    }

    #[test]
    fn init_entries_import_the_generated_modules() {
        let definition = PlasoDefinition::new();
        let identity = PluginIdentity::derive("Test Users", "sqlite");
        assert_eq!(
            definition.plugin_init_entry(&identity),
            "from plaso.parsers.sqlite_plugins import test_users\n"
        );
        assert_eq!(
            definition.presentation_init_entry(&identity),
            "from plaso.formatters import test_users\n"
        );
    }
}
