use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::executor::result::{ColumnSource, ColumnType, QueryResult, SampleValue};
use crate::parser::names::to_attribute_identifier;

/// Longest text sample quoted in a documentation placeholder.
const MAX_SAMPLE_CHARS: usize = 40;

/// Declaration type of a generated attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TargetType {
    /// Whole numbers.
    #[serde(rename = "integer")]
    Integer,
    /// Floating-point numbers.
    #[serde(rename = "floating-point")]
    FloatingPoint,
    /// Text; also the default for columns of unknown type.
    #[serde(rename = "string")]
    String,
    /// Raw bytes.
    #[serde(rename = "byte sequence")]
    ByteSequence,
}

impl TargetType {
    /// Fixed mapping from inferred storage class to declaration type.
    pub fn from_column_type(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Integer => TargetType::Integer,
            ColumnType::Real => TargetType::FloatingPoint,
            ColumnType::Text | ColumnType::Unknown => TargetType::String,
            ColumnType::Blob => TargetType::ByteSequence,
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            TargetType::Integer => "integer",
            TargetType::FloatingPoint => "floating-point",
            TargetType::String => "string",
            TargetType::ByteSequence => "byte sequence",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generated attribute, derived from one result column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    /// Unique, valid identifier.
    pub identifier: String,
    /// Declaration type.
    pub target_type: TargetType,
    /// Placeholder text for the attribute's documentation.
    pub doc_placeholder: String,
    /// Column name as reported by the engine.
    pub column_name: String,
    /// First sampled value of the column.
    pub sample_value: Option<SampleValue>,
    /// Table column the attribute was read from, when known.
    pub source: Option<ColumnSource>,
}

/// Ordered attributes of one query; order is the engine's column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttributeModel {
    /// Attributes in declaration order.
    pub attributes: Vec<Attribute>,
}

impl AttributeModel {
    /// Build the model from an executed query.
    ///
    /// Blank (or wordless) column names become `col1`, `col2`, ... counted
    /// among blank columns only. Later duplicates (case-insensitive) get
    /// `_2`, `_3`, ... while the first occurrence keeps the plain name.
    pub fn build(result: &QueryResult) -> Self {
        let mut used = HashSet::new();
        let mut blank_count = 0usize;

        let attributes = result
            .columns
            .iter()
            .map(|column| {
                let mut candidate = to_attribute_identifier(&column.name);
                if candidate.is_empty() {
                    blank_count += 1;
                    candidate = format!("col{blank_count}");
                }
                Attribute {
                    identifier: unique_identifier(&candidate, &mut used),
                    target_type: TargetType::from_column_type(column.inferred_type),
                    doc_placeholder: doc_placeholder(column.sample_value.as_ref()),
                    column_name: column.name.clone(),
                    sample_value: column.sample_value.clone(),
                    source: column.source.clone(),
                }
            })
            .collect();

        Self { attributes }
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// True when the query returned no columns.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Iterate attributes in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.attributes.iter()
    }

    /// Identifiers in declaration order.
    pub fn identifiers(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .map(|a| a.identifier.as_str())
            .collect()
    }

    /// Target types in declaration order.
    pub fn target_types(&self) -> Vec<TargetType> {
        self.attributes.iter().map(|a| a.target_type).collect()
    }

    /// Source tables and the columns read from each, in first-seen order.
    pub fn required_structure(&self) -> BTreeMap<String, Vec<String>> {
        let mut structure: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for source in self.attributes.iter().filter_map(|a| a.source.as_ref()) {
            let columns = structure.entry(source.table.clone()).or_default();
            if !columns.contains(&source.column) {
                columns.push(source.column.clone());
            }
        }
        structure
    }
}

impl<'a> IntoIterator for &'a AttributeModel {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.attributes.iter()
    }
}

fn unique_identifier(candidate: &str, used: &mut HashSet<String>) -> String {
    if used.insert(candidate.to_ascii_lowercase()) {
        return candidate.to_string();
    }
    let mut suffix = 2usize;
    loop {
        let name = format!("{candidate}_{suffix}");
        if used.insert(name.to_ascii_lowercase()) {
            return name;
        }
        suffix += 1;
    }
}

fn doc_placeholder(sample: Option<&SampleValue>) -> String {
    match sample {
        None | Some(SampleValue::Null) => "TODO".to_string(),
        Some(SampleValue::Text(text)) => {
            let mut shown: String = text
                .chars()
                .take(MAX_SAMPLE_CHARS)
                .map(|c| if c.is_control() { ' ' } else { c })
                .collect();
            if text.chars().count() > MAX_SAMPLE_CHARS {
                shown.push_str("...");
            }
            format!("TODO, sample value: {shown}")
        }
        Some(value) => format!("TODO, sample value: {value}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::result::ColumnInfo;

    fn result_with(columns: Vec<ColumnInfo>) -> QueryResult {
        QueryResult::success("SELECT ...", columns, Vec::new(), false)
    }

    #[test]
    fn blank_names_get_positional_identifiers() {
        let model = AttributeModel::build(&result_with(vec![
            ColumnInfo::named("id"),
            ColumnInfo::named(""),
            ColumnInfo::named(""),
        ]));
        assert_eq!(model.identifiers(), vec!["id", "col1", "col2"]);
    }

    #[test]
    fn duplicates_are_suffixed_in_first_seen_order() {
        let model = AttributeModel::build(&result_with(vec![
            ColumnInfo::named("id"),
            ColumnInfo::named("ID"),
            ColumnInfo::named("name"),
            ColumnInfo::named("id"),
            ColumnInfo::named("id_2"),
        ]));
        assert_eq!(
            model.identifiers(),
            vec!["id", "id_2", "name", "id_3", "id_2_2"]
        );
    }

    #[test]
    fn unknown_types_default_to_string() {
        let model = AttributeModel::build(&result_with(vec![ColumnInfo::named("x")]));
        assert_eq!(model.target_types(), vec![TargetType::String]);
        assert_eq!(model.attributes[0].doc_placeholder, "TODO");
    }

    #[test]
    fn long_text_samples_are_truncated_in_placeholders() {
        let mut column = ColumnInfo::named("body");
        column.inferred_type = ColumnType::Text;
        column.sample_value = Some(SampleValue::Text(format!("line\n{}", "x".repeat(60))));
        let model = AttributeModel::build(&result_with(vec![column]));

        let placeholder = &model.attributes[0].doc_placeholder;
        assert!(placeholder.starts_with("TODO, sample value: line x"));
        assert!(placeholder.ends_with("..."));
    }

    #[test]
    fn required_structure_groups_columns_by_table() {
        let source = |table: &str, column: &str| ColumnSource {
            table: table.to_string(),
            column: column.to_string(),
            declared_type: String::new(),
        };
        let mut a = ColumnInfo::named("id");
        a.source = Some(source("users", "id"));
        let mut b = ColumnInfo::named("id");
        b.source = Some(source("orders", "id"));
        let mut c = ColumnInfo::named("name");
        c.source = Some(source("users", "name"));

        let structure = AttributeModel::build(&result_with(vec![a, b, c])).required_structure();
        assert_eq!(structure["users"], vec!["id", "name"]);
        assert_eq!(structure["orders"], vec!["id"]);
    }
}
