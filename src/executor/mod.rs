use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ScaffoldError;
use crate::parser::read_only::check_read_only;

/// Query results, column metadata and sampled values.
pub mod result;
/// `rusqlite`-backed executor.
pub mod sqlite;

pub use result::{ColumnInfo, ColumnSource, ColumnType, QueryResult, ResultRow, SampleValue};
pub use sqlite::{SqliteExecutor, DEFAULT_ROW_CAP};

/// Connectivity check and statement execution against a sample database.
///
/// Every execution method reports failures inside the returned
/// [`QueryResult`]; none of them panic or invalidate the connection.
pub trait QueryExecutor {
    /// Open the database at `path`, replacing any previous connection.
    ///
    /// Returns `false` on any I/O or format failure.
    fn try_connect(&mut self, path: &Path) -> bool;

    /// True when a connection is open.
    fn is_connected(&self) -> bool;

    /// Why the last [`QueryExecutor::try_connect`] call failed, if it did.
    fn connection_error(&self) -> Option<&ScaffoldError> {
        None
    }

    /// Run `query` verbatim, capturing column names and sampled rows.
    fn execute(&self, query: &str) -> QueryResult;

    /// Like [`QueryExecutor::execute`], after rejecting statements that start
    /// like a mutation with [`ScaffoldError::NotReadOnly`].
    fn execute_read_only(&self, query: &str) -> QueryResult {
        match check_read_only(query) {
            Ok(()) => self.execute(query),
            Err(err) => {
                tracing::warn!(statement = query, error = %err, "rejected statement");
                QueryResult::failure(query, err)
            }
        }
    }

    /// Like [`QueryExecutor::execute`], also populating inferred types,
    /// first-row samples and column provenance.
    fn execute_detailed(&self, query: &str) -> QueryResult;

    /// `CREATE` statements of the user tables, keyed by table name.
    fn table_schemas(&self) -> Result<BTreeMap<String, String>, ScaffoldError>;
}
