use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info, warn};

use crate::error::ScaffoldError;
use crate::executor::result::{ColumnInfo, ColumnSource, ColumnType, QueryResult, SampleValue};
use crate::executor::QueryExecutor;
use crate::parser::names::normalize_identifier;
use crate::parser::sql_parser::{analyze_select, ProjectionItem, SelectShape};

/// Rows sampled per statement unless configured otherwise.
pub const DEFAULT_ROW_CAP: usize = 100;

/// [`QueryExecutor`] backed by a `rusqlite` connection to a database file.
///
/// One executor owns at most one connection; a failed query never closes it,
/// so the executor stays usable for the next statement.
#[derive(Debug)]
pub struct SqliteExecutor {
    connection: Option<Connection>,
    path: Option<PathBuf>,
    connect_error: Option<ScaffoldError>,
    row_cap: usize,
}

impl SqliteExecutor {
    /// Create an executor with no open connection.
    pub fn new() -> Self {
        Self {
            connection: None,
            path: None,
            connect_error: None,
            row_cap: DEFAULT_ROW_CAP,
        }
    }

    /// Set the maximum number of rows sampled per statement (at least one).
    pub fn with_row_cap(mut self, row_cap: usize) -> Self {
        self.row_cap = row_cap.max(1);
        self
    }

    /// Maximum number of rows sampled per statement.
    pub fn row_cap(&self) -> usize {
        self.row_cap
    }

    /// Path of the currently open database.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Open `path` and fail with [`ScaffoldError::ConnectionFailed`] instead of returning `false`.
    pub fn open(path: &Path) -> Result<Self, ScaffoldError> {
        let mut executor = Self::new();
        if executor.try_connect(path) {
            Ok(executor)
        } else {
            Err(executor
                .connect_error
                .unwrap_or_else(|| connection_failed(path, "unknown error")))
        }
    }

    fn connection(&self) -> Result<&Connection, ScaffoldError> {
        self.connection
            .as_ref()
            .ok_or_else(|| ScaffoldError::ConnectionFailed {
                path: self
                    .path
                    .as_ref()
                    .map_or_else(|| "<none>".to_string(), |p| p.display().to_string()),
                reason: "no open database connection".to_string(),
            })
    }

    fn run(&self, query: &str, detailed: bool) -> Result<QueryResult, ScaffoldError> {
        let conn = self.connection()?;
        debug!(statement = query, detailed, "executing statement");

        let mut stmt = conn.prepare(query)?;
        let names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut sampled = Vec::new();
        let mut truncated = false;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            if sampled.len() == self.row_cap {
                truncated = true;
                break;
            }
            let values = (0..names.len())
                .map(|idx| row.get_ref(idx).map(SampleValue::from))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            sampled.push(values);
        }
        drop(rows);

        let columns: Vec<ColumnInfo> = if detailed {
            let sources = trace_sources(conn, query, &names);
            names
                .into_iter()
                .zip(sources)
                .enumerate()
                .map(|(idx, (name, source))| {
                    let sample_value = sampled.first().and_then(|row| row.get(idx)).cloned();
                    let inferred_type = infer_type(sample_value.as_ref(), source.as_ref());
                    ColumnInfo {
                        name,
                        inferred_type,
                        sample_value,
                        source,
                    }
                })
                .collect()
        } else {
            names.into_iter().map(ColumnInfo::named).collect()
        };

        debug!(
            columns = columns.len(),
            rows = sampled.len(),
            truncated,
            "statement executed"
        );
        Ok(QueryResult::success(query, columns, sampled, truncated))
    }

    fn contained(&self, query: &str, detailed: bool) -> QueryResult {
        match self.run(query, detailed) {
            Ok(result) => result,
            Err(err) => {
                warn!(statement = query, error = %err, "statement failed");
                QueryResult::failure(query, err)
            }
        }
    }
}

impl Default for SqliteExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryExecutor for SqliteExecutor {
    fn try_connect(&mut self, path: &Path) -> bool {
        self.connection = None;
        self.path = Some(path.to_path_buf());
        match open_validated(path) {
            Ok(conn) => {
                info!(path = %path.display(), "connected to database");
                self.connection = Some(conn);
                self.connect_error = None;
                true
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unable to connect to database");
                self.connect_error = Some(err);
                false
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    fn connection_error(&self) -> Option<&ScaffoldError> {
        self.connect_error.as_ref()
    }

    fn execute(&self, query: &str) -> QueryResult {
        self.contained(query, false)
    }

    fn execute_detailed(&self, query: &str) -> QueryResult {
        self.contained(query, true)
    }

    fn table_schemas(&self) -> Result<BTreeMap<String, String>, ScaffoldError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT name, sql FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND sql IS NOT NULL \
             ORDER BY name",
        )?;
        let schemas = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
        Ok(schemas)
    }
}

fn connection_failed(path: &Path, reason: impl Into<String>) -> ScaffoldError {
    ScaffoldError::ConnectionFailed {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

/// Open without creating and prove the file is a database by reading its catalog.
fn open_validated(path: &Path) -> Result<Connection, ScaffoldError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn =
        Connection::open_with_flags(path, flags).map_err(|e| connection_failed(path, e.to_string()))?;
    conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
        row.get::<_, i64>(0)
    })
    .map_err(|e| connection_failed(path, e.to_string()))?;
    Ok(conn)
}

fn infer_type(sample: Option<&SampleValue>, source: Option<&ColumnSource>) -> ColumnType {
    let Some(sample) = sample else {
        return ColumnType::Unknown;
    };
    sample
        .column_type()
        .or_else(|| source.map(|s| ColumnType::from_declared_type(&s.declared_type)))
        .unwrap_or(ColumnType::Unknown)
}

/// Declared columns of one table referenced by the statement.
#[derive(Debug)]
struct TableColumns {
    /// Lowercased name as referenced in the statement.
    reference: String,
    /// Name as stored in `sqlite_master`.
    table: String,
    /// `(column, declared type)` in declaration order.
    columns: Vec<(String, String)>,
}

impl TableColumns {
    fn source(&self, column: &str) -> Option<ColumnSource> {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(name, declared_type)| ColumnSource {
                table: self.table.clone(),
                column: name.clone(),
                declared_type: declared_type.clone(),
            })
    }
}

fn table_columns(conn: &Connection, reference: &str) -> rusqlite::Result<Option<TableColumns>> {
    let table: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type IN ('table', 'view') AND lower(name) = ?1",
            [reference],
            |row| row.get(0),
        )
        .optional()?;
    let Some(table) = table else {
        return Ok(None);
    };

    let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map([&table], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Some(TableColumns {
        reference: reference.to_string(),
        table,
        columns,
    }))
}

/// Trace each result column to the table column it was read from.
///
/// Uses the parsed projection positionally when it lines up one-to-one with
/// the engine's columns, and falls back to matching result names against the
/// referenced tables in FROM / JOIN order otherwise.
fn trace_sources(conn: &Connection, query: &str, names: &[String]) -> Vec<Option<ColumnSource>> {
    let shape = analyze_select(query);
    let catalog: Vec<TableColumns> = shape
        .as_ref()
        .map(SelectShape::table_names)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|reference| match table_columns(conn, reference) {
            Ok(found) => found,
            Err(err) => {
                debug!(table = reference, error = %err, "unable to read table columns");
                None
            }
        })
        .collect();

    match shape {
        Some(shape) if !shape.has_wildcard() && shape.projection.len() == names.len() => shape
            .projection
            .iter()
            .map(|item| match item {
                ProjectionItem::Column {
                    qualifier: Some(qualifier),
                    column,
                } => shape
                    .resolve_qualifier(qualifier)
                    .and_then(|table| catalog.iter().find(|tc| tc.reference == table.name))
                    .and_then(|tc| tc.source(column)),
                ProjectionItem::Column {
                    qualifier: None,
                    column,
                } => catalog.iter().find_map(|tc| tc.source(column)),
                ProjectionItem::Wildcard | ProjectionItem::Expression => None,
            })
            .collect(),
        _ => names
            .iter()
            .map(|name| {
                let wanted = normalize_identifier(name);
                if wanted.is_empty() {
                    return None;
                }
                catalog.iter().find_map(|tc| tc.source(&wanted))
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_memory() -> SqliteExecutor {
        let conn = Connection::open_in_memory().expect("in-memory database");
        conn.execute_batch(
            "CREATE TABLE Users (id INTEGER PRIMARY KEY, name TEXT, score REAL);
             CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER, note VARCHAR(20));
             INSERT INTO Users VALUES (1, 'alice', 1.5), (2, 'bob', NULL);
             INSERT INTO orders VALUES (10, 1, NULL);",
        )
        .expect("fixture schema");
        SqliteExecutor {
            connection: Some(conn),
            path: None,
            connect_error: None,
            row_cap: DEFAULT_ROW_CAP,
        }
    }

    #[test]
    fn join_columns_trace_back_through_aliases() {
        let executor = in_memory();
        let result = executor
            .execute_detailed("SELECT u.id, o.id, o.note FROM users u JOIN orders o ON o.user_id = u.id");
        assert!(result.succeeded, "{:?}", result.error_message());

        let sources: Vec<_> = result
            .columns
            .iter()
            .map(|c| c.source.as_ref().map(|s| (s.table.as_str(), s.column.as_str())))
            .collect();
        assert_eq!(
            sources,
            vec![Some(("Users", "id")), Some(("orders", "id")), Some(("orders", "note"))]
        );
    }

    #[test]
    fn null_sample_falls_back_to_declared_type() {
        let executor = in_memory();
        let result = executor.execute_detailed("SELECT note FROM orders");
        assert_eq!(result.columns[0].sample_value, Some(SampleValue::Null));
        assert_eq!(result.columns[0].inferred_type, ColumnType::Text);
    }

    #[test]
    fn wildcard_projection_matches_by_name() {
        let executor = in_memory();
        let result = executor.execute_detailed("SELECT * FROM users");
        let tables: Vec<_> = result
            .columns
            .iter()
            .map(|c| c.source.as_ref().map(|s| s.table.clone()))
            .collect();
        assert_eq!(tables, vec![Some("Users".to_string()); 3]);
    }

    #[test]
    fn plain_execution_reports_names_only() {
        let executor = in_memory();
        let result = executor.execute("SELECT id, name FROM users");
        assert_eq!(result.column_names(), vec!["id", "name"]);
        assert!(result
            .columns
            .iter()
            .all(|c| c.inferred_type == ColumnType::Unknown && c.sample_value.is_none()));
        assert_eq!(result.rows.len(), 2);
    }

    #[test]
    fn table_schemas_are_ordered_by_name() {
        let executor = in_memory();
        let schemas = executor.table_schemas().expect("schemas should load");
        assert_eq!(schemas.keys().collect::<Vec<_>>(), vec!["Users", "orders"]);
        assert!(schemas["orders"].starts_with("CREATE TABLE orders"));
    }
}
