use std::fmt;

use serde::Serialize;

use crate::error::ScaffoldError;

/// Storage class of a column, inferred from a sampled value.
///
/// SQLite is dynamically typed, so this is advisory: it describes the first
/// sampled row, not a schema guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// 64-bit signed integer.
    Integer,
    /// 64-bit float.
    Real,
    /// UTF-8 text.
    Text,
    /// Raw bytes.
    Blob,
    /// Nothing to infer from (no rows, or `NULL` without a declared type).
    Unknown,
}

impl ColumnType {
    /// Map a declared column type to its SQLite affinity.
    ///
    /// Follows the SQLite affinity rules in order; `NUMERIC` affinity has no
    /// single storage class and maps to [`ColumnType::Unknown`].
    pub fn from_declared_type(declared: &str) -> Self {
        let upper = declared.to_ascii_uppercase();
        if upper.contains("INT") {
            ColumnType::Integer
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            ColumnType::Text
        } else if upper.contains("BLOB") {
            ColumnType::Blob
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            ColumnType::Real
        } else {
            ColumnType::Unknown
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "INTEGER"),
            ColumnType::Real => write!(f, "REAL"),
            ColumnType::Text => write!(f, "TEXT"),
            ColumnType::Blob => write!(f, "BLOB"),
            ColumnType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// A single value read from a result row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum SampleValue {
    /// SQL `NULL`.
    Null,
    /// Integer storage class.
    Integer(i64),
    /// Real storage class.
    Real(f64),
    /// Text storage class (lossily decoded as UTF-8).
    Text(String),
    /// Blob storage class.
    Blob(Vec<u8>),
}

impl SampleValue {
    /// Storage class of this value; `NULL` carries none.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            SampleValue::Null => None,
            SampleValue::Integer(_) => Some(ColumnType::Integer),
            SampleValue::Real(_) => Some(ColumnType::Real),
            SampleValue::Text(_) => Some(ColumnType::Text),
            SampleValue::Blob(_) => Some(ColumnType::Blob),
        }
    }

    /// True for SQL `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, SampleValue::Null)
    }
}

impl From<rusqlite::types::ValueRef<'_>> for SampleValue {
    fn from(value: rusqlite::types::ValueRef<'_>) -> Self {
        use rusqlite::types::ValueRef;
        match value {
            ValueRef::Null => SampleValue::Null,
            ValueRef::Integer(v) => SampleValue::Integer(v),
            ValueRef::Real(v) => SampleValue::Real(v),
            ValueRef::Text(bytes) => SampleValue::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => SampleValue::Blob(bytes.to_vec()),
        }
    }
}

impl fmt::Display for SampleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleValue::Null => write!(f, "NULL"),
            SampleValue::Integer(v) => write!(f, "{v}"),
            SampleValue::Real(v) => write!(f, "{v}"),
            SampleValue::Text(v) => write!(f, "{v}"),
            SampleValue::Blob(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

/// Table and column a result column was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSource {
    /// Table name as reported by the live schema.
    pub table: String,
    /// Column name as declared in that table.
    pub column: String,
    /// Declared column type, empty when none was declared.
    pub declared_type: String,
}

/// One result column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    /// Name reported by the engine; may be empty or duplicated.
    pub name: String,
    /// Storage class inferred from the first sampled row.
    pub inferred_type: ColumnType,
    /// First sampled value, if any row was returned.
    pub sample_value: Option<SampleValue>,
    /// Where the column comes from, when it could be traced.
    pub source: Option<ColumnSource>,
}

impl ColumnInfo {
    /// Column with a name only, as reported by a plain execution.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inferred_type: ColumnType::Unknown,
            sample_value: None,
            source: None,
        }
    }
}

/// A sampled row; values are aligned with [`QueryResult::columns`].
pub type ResultRow = Vec<SampleValue>;

/// Outcome of executing one statement.
///
/// When `succeeded` is false, `columns` and `rows` are empty and `error`
/// describes the failure.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Statement as submitted.
    pub statement: String,
    /// Result columns in engine order.
    pub columns: Vec<ColumnInfo>,
    /// Sampled rows, at most the executor's row cap.
    pub rows: Vec<ResultRow>,
    /// Whether more rows were available than were sampled.
    pub truncated: bool,
    /// Whether the statement executed.
    pub succeeded: bool,
    /// Failure description when `succeeded` is false.
    pub error: Option<ScaffoldError>,
}

impl QueryResult {
    /// Successful result.
    pub fn success(
        statement: impl Into<String>,
        columns: Vec<ColumnInfo>,
        rows: Vec<ResultRow>,
        truncated: bool,
    ) -> Self {
        Self {
            statement: statement.into(),
            columns,
            rows,
            truncated,
            succeeded: true,
            error: None,
        }
    }

    /// Failed result; columns and rows are always empty.
    pub fn failure(statement: impl Into<String>, error: ScaffoldError) -> Self {
        Self {
            statement: statement.into(),
            columns: Vec::new(),
            rows: Vec::new(),
            truncated: false,
            succeeded: false,
            error: Some(error),
        }
    }

    /// Human-readable failure message.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Column names in engine order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Value of the first column named `name` in `row`.
    pub fn value<'a>(&self, row: &'a ResultRow, name: &str) -> Option<&'a SampleValue> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        row.get(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_types_follow_sqlite_affinity_rules() {
        assert_eq!(ColumnType::from_declared_type("BIGINT"), ColumnType::Integer);
        assert_eq!(ColumnType::from_declared_type("varchar(20)"), ColumnType::Text);
        assert_eq!(ColumnType::from_declared_type("BLOB"), ColumnType::Blob);
        assert_eq!(ColumnType::from_declared_type("DOUBLE PRECISION"), ColumnType::Real);
        assert_eq!(ColumnType::from_declared_type("NUMERIC"), ColumnType::Unknown);
        assert_eq!(ColumnType::from_declared_type(""), ColumnType::Unknown);
    }

    #[test]
    fn failure_results_carry_no_columns() {
        let result = QueryResult::failure(
            "SELEC 1",
            ScaffoldError::SyntaxOrExecutionError("near \"SELEC\": syntax error".to_string()),
        );
        assert!(!result.succeeded);
        assert!(result.columns.is_empty());
        assert!(result.rows.is_empty());
        assert!(result
            .error_message()
            .is_some_and(|m| m.contains("syntax error")));
    }

    #[test]
    fn value_lookup_uses_first_matching_column() {
        let result = QueryResult::success(
            "SELECT 1 AS a, 2 AS a",
            vec![ColumnInfo::named("a"), ColumnInfo::named("a")],
            vec![vec![SampleValue::Integer(1), SampleValue::Integer(2)]],
            false,
        );
        assert_eq!(
            result.value(&result.rows[0], "a"),
            Some(&SampleValue::Integer(1))
        );
        assert_eq!(result.value(&result.rows[0], "b"), None);
    }
}
